use crate::ast::{Span, Symbol};
use crate::error::TributaryError;
use crate::resource_limits::ResourceLimits;
use crate::semantic::{Expression, Parameter};
use crate::types::Type;
use crate::TributaryResult;
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::sync::Arc;

pub mod expressions;
pub mod literals;
pub mod types;

#[derive(Parser)]
#[grammar = "src/parser/tributary.pest"]
pub struct TributaryParser;

/// Parse expression text into a tree.
///
/// References to lambda parameters take the parameter's annotated type; every
/// other unannotated node is typed `any`.
pub fn parse_expression(
    content: &str,
    source_id: Option<String>,
    limits: &ResourceLimits,
) -> TributaryResult<Expression> {
    check_source_size(content, limits)?;
    check_nesting(content, limits)?;

    let source_id = source_id.unwrap_or_else(|| "<input>".to_string());
    let source: Arc<str> = Arc::from(content);
    let mut state = ParseState::new(source_id, source, limits.max_expression_depth);

    let input = TributaryParser::parse(Rule::expression_input, content)
        .map_err(|e| state.pest_error(e))?
        .next()
        .ok_or_else(|| state.error_at_start("Empty input"))?;

    let expression = input
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::expression)
        .ok_or_else(|| state.error_at_start("Expected an expression"))?;

    expressions::parse_expression(expression, &mut state)
}

/// Parse type notation such as `Observable<int>` or `fn(int) -> bool`
pub fn parse_type(content: &str) -> TributaryResult<Type> {
    let state = ParseState::new("<type>".to_string(), Arc::from(content), usize::MAX);

    let input = TributaryParser::parse(Rule::type_input, content)
        .map_err(|e| state.pest_error(e))?
        .next()
        .ok_or_else(|| state.error_at_start("Empty type"))?;

    let ty = input
        .into_inner()
        .find(|pair| pair.as_rule() == Rule::type_expr)
        .ok_or_else(|| state.error_at_start("Expected a type"))?;

    types::parse_type_expr(ty, &state)
}

fn check_source_size(content: &str, limits: &ResourceLimits) -> TributaryResult<()> {
    if content.len() > limits.max_source_bytes {
        return Err(TributaryError::ResourceLimitExceeded {
            limit_name: "max_source_bytes".to_string(),
            limit_value: format!("{} bytes", limits.max_source_bytes),
            actual_value: format!("{} bytes", content.len()),
            suggestion: "Split the expression into smaller definitions".to_string(),
        });
    }
    Ok(())
}

/// Bracket nesting is bounded before pest recurses into it
fn check_nesting(content: &str, limits: &ResourceLimits) -> TributaryResult<()> {
    let mut depth = 0usize;
    let mut deepest = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for c in content.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '(' | '[' | '{' => {
                depth += 1;
                deepest = deepest.max(depth);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    if deepest > limits.max_expression_depth {
        return Err(depth_exceeded(limits.max_expression_depth, deepest));
    }
    Ok(())
}

pub(crate) fn depth_exceeded(limit: usize, actual: usize) -> TributaryError {
    TributaryError::ResourceLimitExceeded {
        limit_name: "max_expression_depth".to_string(),
        limit_value: limit.to_string(),
        actual_value: actual.to_string(),
        suggestion: "Simplify nested expressions to reduce depth".to_string(),
    }
}

/// Parser state threaded through the tree builders
pub(crate) struct ParseState {
    source_id: String,
    source: Arc<str>,
    scopes: Vec<(Symbol, Type)>,
    depth: usize,
    max_depth: usize,
}

impl ParseState {
    fn new(source_id: String, source: Arc<str>, max_depth: usize) -> Self {
        Self {
            source_id,
            source,
            scopes: Vec::new(),
            depth: 0,
            max_depth,
        }
    }

    pub(crate) fn error(&self, message: impl Into<String>, pair: &Pair<Rule>) -> TributaryError {
        TributaryError::parse(
            message,
            Span::from_pest_span(pair.as_span()),
            self.source_id.clone(),
            self.source.clone(),
        )
    }

    pub(crate) fn error_with_suggestion(
        &self,
        message: impl Into<String>,
        pair: &Pair<Rule>,
        suggestion: impl Into<String>,
    ) -> TributaryError {
        TributaryError::parse_with_suggestion(
            message,
            Span::from_pest_span(pair.as_span()),
            self.source_id.clone(),
            self.source.clone(),
            suggestion,
        )
    }

    fn error_at_start(&self, message: &str) -> TributaryError {
        TributaryError::parse(
            message,
            Span {
                start: 0,
                end: 0,
                line: 1,
                col: 1,
            },
            self.source_id.clone(),
            self.source.clone(),
        )
    }

    fn pest_error(&self, e: pest::error::Error<Rule>) -> TributaryError {
        let (start, end) = match e.location {
            pest::error::InputLocation::Pos(pos) => (pos, pos),
            pest::error::InputLocation::Span((start, end)) => (start, end),
        };
        let (line, col) = match e.line_col {
            pest::error::LineColLocation::Pos((line, col)) => (line, col),
            pest::error::LineColLocation::Span((line, col), _) => (line, col),
        };
        TributaryError::parse(
            format!("Unexpected input: {}", e.variant.message()),
            Span {
                start,
                end,
                line,
                col,
            },
            self.source_id.clone(),
            self.source.clone(),
        )
    }

    pub(crate) fn push_depth(&mut self) -> TributaryResult<()> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(depth_exceeded(self.max_depth, self.depth));
        }
        Ok(())
    }

    pub(crate) fn pop_depth(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn restore_depth(&mut self, mark: usize) {
        self.depth = mark;
    }

    /// Bring lambda parameters into scope, returning the mark to restore
    pub(crate) fn enter_scope(&mut self, parameters: &[Parameter]) -> usize {
        let mark = self.scopes.len();
        self.scopes.extend(
            parameters
                .iter()
                .map(|parameter| (parameter.symbol.clone(), parameter.ty.clone())),
        );
        mark
    }

    pub(crate) fn exit_scope(&mut self, mark: usize) {
        self.scopes.truncate(mark);
    }

    /// Type of a referenced symbol: the innermost binding's, `any` if unbound
    pub(crate) fn lookup(&self, symbol: &Symbol) -> Type {
        self.scopes
            .iter()
            .rev()
            .find(|(bound, _)| bound == symbol)
            .map(|(_, ty)| ty.clone())
            .unwrap_or(Type::Any)
    }
}
