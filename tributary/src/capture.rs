//! Closure and constant capture
//!
//! Values referenced from the composing scope are read when a node is built
//! and embedded as constants. Nothing in a tree ever refers back to a live
//! Rust value.

use crate::ast::Symbol;
use crate::semantic::{Expression, ExpressionKind};
use crate::types::Type;
use crate::value::{Uri, Value};
use crate::TributaryResult;
use std::collections::BTreeMap;
use std::time::Duration;

/// A Rust value that can be embedded in a tree as a constant
pub trait IntoConstant {
    /// Static type of the constant; `any` when only the value knows it
    fn static_type() -> Type
    where
        Self: Sized;

    fn into_value(self) -> Value;
}

/// Embed `value` as a constant carrying its static type
pub fn capture<T: IntoConstant>(value: T) -> Expression {
    let ty = T::static_type();
    let value = value.into_value();
    let ty = if ty.is_any() { value.ty() } else { ty };
    Expression::constant_typed(value, ty)
}

macro_rules! int_constant {
    ($($t:ty),*) => {
        $(
            impl IntoConstant for $t {
                fn static_type() -> Type {
                    Type::Int
                }

                fn into_value(self) -> Value {
                    Value::Int(i64::from(self))
                }
            }
        )*
    };
}

int_constant!(i8, i16, i32, i64, u8, u16, u32);

impl IntoConstant for bool {
    fn static_type() -> Type {
        Type::Bool
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl IntoConstant for f64 {
    fn static_type() -> Type {
        Type::Float
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl IntoConstant for &str {
    fn static_type() -> Type {
        Type::String
    }

    fn into_value(self) -> Value {
        Value::String(self.to_string())
    }
}

impl IntoConstant for String {
    fn static_type() -> Type {
        Type::String
    }

    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoConstant for Duration {
    fn static_type() -> Type {
        Type::Duration
    }

    fn into_value(self) -> Value {
        Value::Duration(self)
    }
}

impl IntoConstant for Uri {
    fn static_type() -> Type {
        Type::Uri
    }

    fn into_value(self) -> Value {
        Value::from(self)
    }
}

impl<T: IntoConstant> IntoConstant for Option<T> {
    fn static_type() -> Type {
        T::static_type()
    }

    fn into_value(self) -> Value {
        self.map_or(Value::Null, IntoConstant::into_value)
    }
}

impl<T: IntoConstant> IntoConstant for Vec<T> {
    fn static_type() -> Type {
        Type::Any
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoConstant::into_value).collect())
    }
}

impl IntoConstant for Value {
    fn static_type() -> Type {
        Type::Any
    }

    fn into_value(self) -> Value {
        self
    }
}

/// Named values closing the free locals of an authored tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures {
    values: BTreeMap<String, Value>,
}

impl Captures {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl IntoConstant) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl IntoConstant) {
        self.values.insert(name.into(), value.into_value());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Replace free references to captured names by constants.
    ///
    /// A lambda parameter with a captured name shadows the capture in its body.
    pub fn close_over(&self, expression: &Expression) -> TributaryResult<Expression> {
        if self.is_empty() {
            return Ok(expression.clone());
        }
        let mut shadowed = Vec::new();
        self.close(expression, &mut shadowed)
    }

    fn close(
        &self,
        expression: &Expression,
        shadowed: &mut Vec<String>,
    ) -> TributaryResult<Expression> {
        match &expression.kind {
            ExpressionKind::Parameter(Symbol::Local(name)) if !shadowed.contains(name) => {
                Ok(match self.values.get(name) {
                    Some(value) => {
                        let ty = if expression.ty.is_any() {
                            value.ty()
                        } else {
                            expression.ty.clone()
                        };
                        Expression::constant_typed(value.clone(), ty)
                    }
                    None => expression.clone(),
                })
            }
            ExpressionKind::Lambda { parameters, body } => {
                let mark = shadowed.len();
                shadowed.extend(parameters.iter().filter_map(|p| match &p.symbol {
                    Symbol::Local(name) => Some(name.clone()),
                    _ => None,
                }));
                let body = self.close(body, shadowed);
                shadowed.truncate(mark);
                Ok(Expression::lambda(parameters.clone(), body?))
            }
            _ => expression.map_children(|child| self.close(child, shadowed)),
        }
    }
}

/// Fold reads of fields on constant records into the field's constant.
///
/// Reads of fields the record does not have are left untouched.
pub fn fold_field_reads(expression: &Expression) -> TributaryResult<Expression> {
    let folded = expression.map_children(fold_field_reads)?;
    Ok(fold_field_read(folded))
}

/// Fold a single member access whose children are already folded
pub(crate) fn fold_field_read(expression: Expression) -> Expression {
    if let ExpressionKind::MemberAccess { target, member } = &expression.kind {
        if let Some(Value::Record(record)) = target.as_constant() {
            if let Some(value) = record.get(member) {
                let ty = if value.ty().is_any() {
                    expression.ty.clone()
                } else {
                    value.ty()
                };
                return Expression::constant_typed(value.clone(), ty);
            }
        }
    }
    expression
}
