//! Capture-avoiding substitution
//!
//! Replaces parameter references by expressions in one simultaneous pass. A
//! lambda whose parameter name occurs free in a replacement gets that parameter
//! renamed to a fresh symbol before the replacement moves under it.

use crate::analysis::free_variables;
use crate::ast::{Symbol, SymbolGenerator};
use crate::semantic::{Expression, ExpressionKind, Parameter};
use crate::TributaryResult;
use std::collections::{BTreeSet, HashMap};
use tracing::trace;

pub type Substitution = HashMap<Symbol, Expression>;

pub fn substitute(expression: &Expression, mapping: &Substitution) -> TributaryResult<Expression> {
    if mapping.is_empty() {
        return Ok(expression.clone());
    }

    match &expression.kind {
        ExpressionKind::Parameter(symbol) => Ok(mapping
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| expression.clone())),
        ExpressionKind::Lambda { parameters, body } => {
            substitute_under_lambda(expression, parameters, body, mapping)
        }
        _ => expression.map_children(|child| substitute(child, mapping)),
    }
}

fn substitute_under_lambda(
    lambda: &Expression,
    parameters: &[Parameter],
    body: &Expression,
    mapping: &Substitution,
) -> TributaryResult<Expression> {
    let body_free = free_variables(body);

    // Parameters shadow the outer mapping; entries the body never mentions are dropped
    let mut inner: Substitution = mapping
        .iter()
        .filter(|(symbol, _)| {
            body_free.contains(*symbol) && !parameters.iter().any(|p| &p.symbol == *symbol)
        })
        .map(|(symbol, replacement)| (symbol.clone(), replacement.clone()))
        .collect();

    if inner.is_empty() {
        return Ok(lambda.clone());
    }

    let incoming: BTreeSet<Symbol> = inner.values().flat_map(free_variables).collect();

    let mut renamed = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        if incoming.contains(&parameter.symbol) {
            let fresh = SymbolGenerator::refresh(&parameter.symbol);
            trace!(from = %parameter.symbol, to = %fresh, "renamed bound parameter");
            inner.insert(
                parameter.symbol.clone(),
                Expression::parameter(fresh.clone(), parameter.ty.clone()),
            );
            renamed.push(Parameter::new(fresh, parameter.ty.clone()));
        } else {
            renamed.push(parameter.clone());
        }
    }

    let body = substitute(body, &inner)?;
    Ok(Expression::lambda(renamed, body))
}
