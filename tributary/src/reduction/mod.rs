//! Beta-reduction engine
//!
//! Bottom-up rewrite that inlines every application whose callee resolves to a
//! lambda: a literal lambda, a per-call binding, or a registry inline
//! definition. Anything else is left exactly as authored.

pub mod substitution;

use crate::ast::Symbol;
use crate::binding::registry::KnownResources;
use crate::capture::fold_field_read;
use crate::error::TributaryError;
use crate::parser::depth_exceeded;
use crate::resource_limits::ResourceLimits;
use crate::semantic::{Expression, ExpressionKind, Parameter};
use crate::TributaryResult;
use std::collections::HashMap;
use substitution::{substitute, Substitution};
use tracing::trace;

pub struct Reducer<'a> {
    registry: &'a KnownResources,
    limits: &'a ResourceLimits,
    bindings: HashMap<Symbol, Expression>,
    steps: usize,
}

impl<'a> Reducer<'a> {
    pub fn new(registry: &'a KnownResources, limits: &'a ResourceLimits) -> Self {
        Self {
            registry,
            limits,
            bindings: HashMap::new(),
            steps: 0,
        }
    }

    /// Treat `symbol` as denoting `lambda` in callee position for this reduction.
    ///
    /// Bindings to anything but a lambda are ignored.
    pub fn bind(mut self, symbol: Symbol, lambda: Expression) -> Self {
        if lambda.as_lambda().is_some() {
            self.bindings.insert(symbol, lambda);
        }
        self
    }

    /// Number of beta steps performed so far
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Depth is bounded by the walk itself, so trees deeper than the
    /// limit fail before the recursion gets that far.
    pub fn reduce(&mut self, expression: &Expression) -> TributaryResult<Expression> {
        self.visit(expression, 0)
    }

    fn visit(&mut self, expression: &Expression, depth: usize) -> TributaryResult<Expression> {
        if depth > self.limits.max_expression_depth {
            return Err(depth_exceeded(self.limits.max_expression_depth, depth));
        }

        match &expression.kind {
            ExpressionKind::Invoke { callee, arguments } => {
                let callee = self.visit(callee, depth + 1)?;
                let arguments = arguments
                    .iter()
                    .map(|argument| self.visit(argument, depth + 1))
                    .collect::<TributaryResult<Vec<_>>>()?;
                self.apply(callee, arguments, depth)
            }
            ExpressionKind::MemberAccess { .. } => {
                let rebuilt = expression.map_children(|child| self.visit(child, depth + 1))?;
                Ok(fold_field_read(rebuilt))
            }
            _ => expression.map_children(|child| self.visit(child, depth + 1)),
        }
    }

    fn apply(
        &mut self,
        callee: Expression,
        arguments: Vec<Expression>,
        depth: usize,
    ) -> TributaryResult<Expression> {
        let Some((parameters, body)) = self.resolve_lambda(&callee) else {
            return Ok(Expression::invoke(callee, arguments));
        };
        if parameters.len() != arguments.len() {
            return Ok(Expression::invoke(callee, arguments));
        }

        self.step()?;
        trace!(callee = %callee, arity = arguments.len(), "beta step");

        let mapping: Substitution = parameters
            .into_iter()
            .map(|parameter| parameter.symbol)
            .zip(arguments)
            .collect();
        let reduced = substitute(&body, &mapping)?;
        self.visit(&reduced, depth + 1)
    }

    fn resolve_lambda(&self, callee: &Expression) -> Option<(Vec<Parameter>, Expression)> {
        let lambda = match &callee.kind {
            ExpressionKind::Lambda { .. } => callee.clone(),
            ExpressionKind::Parameter(symbol) => match self.bindings.get(symbol) {
                Some(bound) => bound.clone(),
                None => {
                    let uri = symbol.uri()?;
                    self.registry.by_uri(uri)?.inline_definition(&callee.ty)?
                }
            },
            _ => return None,
        };
        match lambda.kind {
            ExpressionKind::Lambda { parameters, body } => Some((parameters, *body)),
            _ => None,
        }
    }

    fn step(&mut self) -> TributaryResult<()> {
        self.steps += 1;
        if self.steps > self.limits.max_reduction_steps {
            return Err(TributaryError::ResourceLimitExceeded {
                limit_name: "max_reduction_steps".to_string(),
                limit_value: self.limits.max_reduction_steps.to_string(),
                actual_value: self.steps.to_string(),
                suggestion: "The expression may not have a normal form; check for self-application"
                    .to_string(),
            });
        }
        Ok(())
    }
}
