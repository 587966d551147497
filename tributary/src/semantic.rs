use crate::ast::Symbol;
use crate::types::Type;
use crate::value::Value;
use crate::TributaryResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An expression node together with its static type.
///
/// Nodes are immutable values. Every constructor derives `ty` from the children,
/// so a rebuilt node always carries a type consistent with its operands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub ty: Type,
}

/// The kind of expression node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    Parameter(Symbol),
    Constant(Value),
    Invoke {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Lambda {
        parameters: Vec<Parameter>,
        body: Box<Expression>,
    },
    MemberAccess {
        target: Box<Expression>,
        member: String,
    },
    New {
        constructor: Constructor,
        arguments: Vec<Expression>,
    },
    Call {
        method: Method,
        arguments: Vec<Expression>,
    },
    Binary(Box<Expression>, BinaryOperator, Box<Expression>),
    Unary(UnaryOperator, Box<Expression>),
}

/// A formal parameter of a lambda
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Parameter {
    pub symbol: Symbol,
    pub ty: Type,
}

impl Parameter {
    pub fn new(symbol: Symbol, ty: Type) -> Self {
        Self { symbol, ty }
    }

    pub fn local(name: impl Into<String>, ty: Type) -> Self {
        Self {
            symbol: Symbol::local(name),
            ty,
        }
    }

    /// A reference to this parameter
    pub fn to_expression(&self) -> Expression {
        Expression::parameter(self.symbol.clone(), self.ty.clone())
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ty.is_any() {
            write!(f, "{}", self.symbol)
        } else {
            write!(f, "{}: {}", self.symbol, self.ty)
        }
    }
}

/// An ordinary static method outside the known-resource table
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Method {
    pub declaring_type: String,
    pub name: String,
    pub result: Type,
}

impl Method {
    pub fn new(declaring_type: impl Into<String>, name: impl Into<String>, result: Type) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            result,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// Constructor of an object creation node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Constructor {
    pub ty: Type,
}

impl Constructor {
    pub fn new(ty: Type) -> Self {
        Self { ty }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Equal => "==",
            BinaryOperator::NotEqual => "!=",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::And => "&&",
            BinaryOperator::Or => "||",
        }
    }

    /// Returns a human-readable name for the operator
    pub fn name(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "addition",
            BinaryOperator::Subtract => "subtraction",
            BinaryOperator::Multiply => "multiplication",
            BinaryOperator::Divide => "division",
            BinaryOperator::Modulo => "modulo",
            BinaryOperator::Equal => "equal",
            BinaryOperator::NotEqual => "not equal",
            BinaryOperator::LessThan => "less than",
            BinaryOperator::LessThanOrEqual => "less than or equal",
            BinaryOperator::GreaterThan => "greater than",
            BinaryOperator::GreaterThanOrEqual => "greater than or equal",
            BinaryOperator::And => "logical and",
            BinaryOperator::Or => "logical or",
        }
    }

    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            BinaryOperator::Equal | BinaryOperator::NotEqual => 3,
            BinaryOperator::LessThan
            | BinaryOperator::LessThanOrEqual
            | BinaryOperator::GreaterThan
            | BinaryOperator::GreaterThanOrEqual => 4,
            BinaryOperator::Add | BinaryOperator::Subtract => 5,
            BinaryOperator::Multiply | BinaryOperator::Divide | BinaryOperator::Modulo => 6,
        }
    }

    pub fn result_type(&self, left: &Type, right: &Type) -> Type {
        match self {
            BinaryOperator::Add
            | BinaryOperator::Subtract
            | BinaryOperator::Multiply
            | BinaryOperator::Divide
            | BinaryOperator::Modulo => match (left, right) {
                (Type::Int, Type::Int) => Type::Int,
                (l, r) if l.is_numeric() && r.is_numeric() => Type::Float,
                (Type::String, Type::String) if *self == BinaryOperator::Add => Type::String,
                _ => Type::Any,
            },
            _ => Type::Bool,
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOperator {
    Not,
    Negate,
}

impl UnaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "!",
            UnaryOperator::Negate => "-",
        }
    }

    pub fn result_type(&self, operand: &Type) -> Type {
        match self {
            UnaryOperator::Not => Type::Bool,
            UnaryOperator::Negate => operand.clone(),
        }
    }
}

const LAMBDA_PRECEDENCE: u8 = 0;
const UNARY_PRECEDENCE: u8 = 7;
const POSTFIX_PRECEDENCE: u8 = 8;
const ATOM_PRECEDENCE: u8 = 9;

impl Expression {
    pub fn new(kind: ExpressionKind, ty: Type) -> Self {
        Self { kind, ty }
    }

    pub fn parameter(symbol: Symbol, ty: Type) -> Self {
        Self::new(ExpressionKind::Parameter(symbol), ty)
    }

    /// Reference to a remote resource by URI
    pub fn resource(uri: impl Into<String>, ty: Type) -> Self {
        Self::parameter(Symbol::resource(uri), ty)
    }

    pub fn local(name: impl Into<String>, ty: Type) -> Self {
        Self::parameter(Symbol::local(name), ty)
    }

    pub fn constant(value: Value) -> Self {
        let ty = value.ty();
        Self::new(ExpressionKind::Constant(value), ty)
    }

    /// Constant with an explicit static type (e.g. a typed `null`)
    pub fn constant_typed(value: Value, ty: Type) -> Self {
        Self::new(ExpressionKind::Constant(value), ty)
    }

    pub fn invoke(callee: Expression, arguments: Vec<Expression>) -> Self {
        let ty = callee.ty.invocation_result();
        Self::new(
            ExpressionKind::Invoke {
                callee: Box::new(callee),
                arguments,
            },
            ty,
        )
    }

    pub fn lambda(parameters: Vec<Parameter>, body: Expression) -> Self {
        let ty = Type::function(
            parameters.iter().map(|p| p.ty.clone()).collect(),
            body.ty.clone(),
        );
        Self::new(
            ExpressionKind::Lambda {
                parameters,
                body: Box::new(body),
            },
            ty,
        )
    }

    /// Member access typed from the target's recognized members, `any` otherwise
    pub fn member(target: Expression, member: impl Into<String>) -> Self {
        let member = member.into();
        let ty = target.ty.member_type(&member).unwrap_or(Type::Any);
        Self::member_typed(target, member, ty)
    }

    pub fn member_typed(target: Expression, member: impl Into<String>, ty: Type) -> Self {
        Self::new(
            ExpressionKind::MemberAccess {
                target: Box::new(target),
                member: member.into(),
            },
            ty,
        )
    }

    pub fn new_object(constructor: Constructor, arguments: Vec<Expression>) -> Self {
        let ty = constructor.ty.clone();
        Self::new(
            ExpressionKind::New {
                constructor,
                arguments,
            },
            ty,
        )
    }

    pub fn call(method: Method, arguments: Vec<Expression>) -> Self {
        let ty = method.result.clone();
        Self::new(ExpressionKind::Call { method, arguments }, ty)
    }

    pub fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Self {
        let ty = op.result_type(&left.ty, &right.ty);
        Self::new(
            ExpressionKind::Binary(Box::new(left), op, Box::new(right)),
            ty,
        )
    }

    pub fn unary(op: UnaryOperator, operand: Expression) -> Self {
        let ty = op.result_type(&operand.ty);
        Self::new(ExpressionKind::Unary(op, Box::new(operand)), ty)
    }

    pub fn add(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::Add, other)
    }

    pub fn sub(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::Subtract, other)
    }

    pub fn mul(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::Multiply, other)
    }

    pub fn div(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::Divide, other)
    }

    pub fn rem(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::Modulo, other)
    }

    pub fn equals(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::Equal, other)
    }

    pub fn not_equals(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::NotEqual, other)
    }

    pub fn lt(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::LessThan, other)
    }

    pub fn le(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::LessThanOrEqual, other)
    }

    pub fn gt(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::GreaterThan, other)
    }

    pub fn ge(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::GreaterThanOrEqual, other)
    }

    pub fn and(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::And, other)
    }

    pub fn or(self, other: Expression) -> Self {
        Self::binary(self, BinaryOperator::Or, other)
    }

    pub fn not(self) -> Self {
        Self::unary(UnaryOperator::Not, self)
    }

    pub fn negate(self) -> Self {
        Self::unary(UnaryOperator::Negate, self)
    }

    /// Member access on this expression
    pub fn dot(self, member: impl Into<String>) -> Self {
        Self::member(self, member)
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match &self.kind {
            ExpressionKind::Parameter(symbol) => Some(symbol),
            _ => None,
        }
    }

    /// URI of a resource parameter
    pub fn as_resource(&self) -> Option<&str> {
        self.as_symbol().and_then(Symbol::uri)
    }

    pub fn as_constant(&self) -> Option<&Value> {
        match &self.kind {
            ExpressionKind::Constant(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_lambda(&self) -> Option<(&[Parameter], &Expression)> {
        match &self.kind {
            ExpressionKind::Lambda { parameters, body } => Some((parameters, body)),
            _ => None,
        }
    }

    pub fn as_invoke(&self) -> Option<(&Expression, &[Expression])> {
        match &self.kind {
            ExpressionKind::Invoke { callee, arguments } => Some((callee, arguments)),
            _ => None,
        }
    }

    /// Direct children in evaluation order; a lambda's only child is its body
    pub fn children(&self) -> Vec<&Expression> {
        match &self.kind {
            ExpressionKind::Parameter(_) | ExpressionKind::Constant(_) => Vec::new(),
            ExpressionKind::Invoke { callee, arguments } => {
                let mut children = vec![callee.as_ref()];
                children.extend(arguments.iter());
                children
            }
            ExpressionKind::Lambda { body, .. } => vec![body.as_ref()],
            ExpressionKind::MemberAccess { target, .. } => vec![target.as_ref()],
            ExpressionKind::New { arguments, .. } | ExpressionKind::Call { arguments, .. } => {
                arguments.iter().collect()
            }
            ExpressionKind::Binary(left, _, right) => vec![left.as_ref(), right.as_ref()],
            ExpressionKind::Unary(_, operand) => vec![operand.as_ref()],
        }
    }

    /// Rebuild this node with every child passed through `f`.
    ///
    /// Lambda parameters are kept as they are; binding-aware passes handle
    /// lambdas themselves before delegating here.
    pub fn map_children<F>(&self, mut f: F) -> TributaryResult<Expression>
    where
        F: FnMut(&Expression) -> TributaryResult<Expression>,
    {
        Ok(match &self.kind {
            ExpressionKind::Parameter(_) | ExpressionKind::Constant(_) => self.clone(),
            ExpressionKind::Invoke { callee, arguments } => {
                let callee = f(callee)?;
                let arguments = arguments
                    .iter()
                    .map(&mut f)
                    .collect::<TributaryResult<Vec<_>>>()?;
                Expression::invoke(callee, arguments)
            }
            ExpressionKind::Lambda { parameters, body } => {
                Expression::lambda(parameters.clone(), f(body)?)
            }
            ExpressionKind::MemberAccess { target, member } => {
                let target = f(target)?;
                if self.ty.is_any() {
                    Expression::member(target, member.clone())
                } else {
                    Expression::member_typed(target, member.clone(), self.ty.clone())
                }
            }
            ExpressionKind::New {
                constructor,
                arguments,
            } => {
                let arguments = arguments
                    .iter()
                    .map(&mut f)
                    .collect::<TributaryResult<Vec<_>>>()?;
                Expression::new_object(constructor.clone(), arguments)
            }
            ExpressionKind::Call { method, arguments } => {
                let arguments = arguments
                    .iter()
                    .map(&mut f)
                    .collect::<TributaryResult<Vec<_>>>()?;
                Expression::call(method.clone(), arguments)
            }
            ExpressionKind::Binary(left, op, right) => {
                let left = f(left)?;
                Expression::binary(left, *op, f(right)?)
            }
            ExpressionKind::Unary(op, operand) => Expression::unary(*op, f(operand)?),
        })
    }

    fn precedence(&self) -> u8 {
        match &self.kind {
            ExpressionKind::Lambda { .. } => LAMBDA_PRECEDENCE,
            ExpressionKind::Binary(_, op, _) => op.precedence(),
            ExpressionKind::Unary(..) => UNARY_PRECEDENCE,
            ExpressionKind::Constant(value) if value.is_negative_number() => UNARY_PRECEDENCE,
            ExpressionKind::Invoke { .. }
            | ExpressionKind::MemberAccess { .. }
            | ExpressionKind::New { .. }
            | ExpressionKind::Call { .. } => POSTFIX_PRECEDENCE,
            ExpressionKind::Parameter(_) | ExpressionKind::Constant(_) => ATOM_PRECEDENCE,
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, operand: &Expression, min: u8) -> fmt::Result {
    if operand.precedence() < min {
        write!(f, "({})", operand)
    } else {
        write!(f, "{}", operand)
    }
}

fn write_arguments(f: &mut fmt::Formatter<'_>, arguments: &[Expression]) -> fmt::Result {
    write!(f, "(")?;
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", argument)?;
    }
    write!(f, ")")
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExpressionKind::Parameter(symbol) => write!(f, "{}", symbol),
            ExpressionKind::Constant(value) => write!(f, "{}", value),
            ExpressionKind::Invoke { callee, arguments } => {
                write_operand(f, callee, POSTFIX_PRECEDENCE)?;
                write_arguments(f, arguments)
            }
            ExpressionKind::Lambda { parameters, body } => {
                match parameters.as_slice() {
                    [single] if single.ty.is_any() => write!(f, "{}", single)?,
                    _ => {
                        write!(f, "(")?;
                        for (i, parameter) in parameters.iter().enumerate() {
                            if i > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", parameter)?;
                        }
                        write!(f, ")")?;
                    }
                }
                write!(f, " => {}", body)
            }
            ExpressionKind::MemberAccess { target, member } => {
                write_operand(f, target, POSTFIX_PRECEDENCE)?;
                write!(f, ".{}", member)
            }
            ExpressionKind::New {
                constructor,
                arguments,
            } => {
                write!(f, "new {}", constructor.ty)?;
                write_arguments(f, arguments)
            }
            ExpressionKind::Call { method, arguments } => {
                write!(f, "{}", method)?;
                write_arguments(f, arguments)
            }
            ExpressionKind::Binary(left, op, right) => {
                let precedence = op.precedence();
                write_operand(f, left, precedence)?;
                write!(f, " {} ", op)?;
                write_operand(f, right, precedence + 1)
            }
            ExpressionKind::Unary(op, operand) => {
                write!(f, "{}", op.symbol())?;
                let numeric_literal = matches!(
                    &operand.kind,
                    ExpressionKind::Constant(Value::Int(_) | Value::Float(_))
                );
                if *op == UnaryOperator::Negate && numeric_literal {
                    write!(f, "({})", operand)
                } else {
                    write_operand(f, operand, UNARY_PRECEDENCE)
                }
            }
        }
    }
}
