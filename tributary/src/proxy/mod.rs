//! Resource proxy model
//!
//! Typed, immutable handles to remote resources. Each proxy carries the
//! expression tree it stands for; composing proxies builds new trees and never
//! touches an operand.

mod factory;
mod observable;
mod observer;
mod stream;
mod subscription;

pub use factory::{StreamFactoryProxy, SubscriptionFactoryProxy};
pub use observable::ObservableProxy;
pub use observer::ObserverProxy;
pub use stream::StreamProxy;
pub use subscription::SubscriptionProxy;

use crate::ast::SymbolGenerator;
use crate::error::TributaryError;
use crate::semantic::{Expression, Parameter};
use crate::types::Type;
use crate::TributaryResult;

/// A URI with its signature: explicit parameter types and the resource type.
///
/// Two references are equal iff URI and signature match. The URI is opaque.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    uri: String,
    parameters: Vec<Type>,
    ty: Type,
}

impl ResourceRef {
    pub fn new(uri: impl Into<String>, ty: Type) -> TributaryResult<Self> {
        let uri = uri.into();
        if uri.trim().is_empty() {
            return Err(TributaryError::InvalidArgument(
                "resource URI must not be empty".to_string(),
            ));
        }
        Ok(Self {
            uri,
            parameters: Vec::new(),
            ty,
        })
    }

    pub fn with_parameters(mut self, parameters: Vec<Type>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// The resource type, as a function of its parameters when it has any
    pub fn signature(&self) -> Type {
        if self.parameters.is_empty() {
            self.ty.clone()
        } else {
            Type::function(self.parameters.clone(), self.ty.clone())
        }
    }

    pub fn expression(&self) -> Expression {
        Expression::resource(self.uri.clone(), self.signature())
    }
}

/// Lambda of one parameter; `body` receives a reference to the parameter
pub fn lambda1(ty: Type, body: impl FnOnce(Expression) -> Expression) -> Expression {
    let parameter = Parameter::new(SymbolGenerator::fresh("x"), ty);
    let body = body(parameter.to_expression());
    Expression::lambda(vec![parameter], body)
}

pub fn lambda2(
    first: Type,
    second: Type,
    body: impl FnOnce(Expression, Expression) -> Expression,
) -> Expression {
    let a = Parameter::new(SymbolGenerator::fresh("x"), first);
    let b = Parameter::new(SymbolGenerator::fresh("y"), second);
    let body = body(a.to_expression(), b.to_expression());
    Expression::lambda(vec![a, b], body)
}

/// Lambda of any arity
pub fn lambda(types: Vec<Type>, body: impl FnOnce(&[Expression]) -> Expression) -> Expression {
    let parameters: Vec<Parameter> = types
        .into_iter()
        .map(|ty| Parameter::new(SymbolGenerator::fresh("arg"), ty))
        .collect();
    let references: Vec<Expression> = parameters.iter().map(Parameter::to_expression).collect();
    let body = body(&references);
    Expression::lambda(parameters, body)
}

/// Arguments of a parameterized resource must match its declared parameters
pub(crate) fn check_arity(
    what: &str,
    callee: &Expression,
    arguments: &[Expression],
) -> TributaryResult<()> {
    match callee.ty.invocation_parameters() {
        Some(parameters) if parameters.len() != arguments.len() => {
            Err(TributaryError::InvalidArgument(format!(
                "{} '{}' takes {} argument(s), got {}",
                what,
                callee,
                parameters.len(),
                arguments.len()
            )))
        }
        None if !callee.ty.is_any() && !arguments.is_empty() => {
            Err(TributaryError::InvalidArgument(format!(
                "{} '{}' of type {} takes no arguments",
                what, callee, callee.ty
            )))
        }
        _ => Ok(()),
    }
}
