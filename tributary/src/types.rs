use crate::error::TributaryError;
use crate::TributaryResult;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Nominal record types describing entries of the metadata collections
pub const DESCRIPTOR_RECORDS: [&str; 6] = [
    "ObservableDefinition",
    "ObserverDefinition",
    "StreamFactoryDefinition",
    "SubscriptionFactoryDefinition",
    "SubscriptionProcess",
    "StreamProcess",
];

/// Static type carried by every expression node.
///
/// `Any` is the type of untyped input and is compatible with everything.
/// `Generic(i)` only appears inside a [`TypeScheme`] template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Any,
    Unit,
    Bool,
    Int,
    Float,
    String,
    Uri,
    Duration,
    Generic(usize),
    Observable(Box<Type>),
    Observer(Box<Type>),
    Stream {
        input: Box<Type>,
        output: Box<Type>,
    },
    StreamFactory {
        parameters: Vec<Type>,
        input: Box<Type>,
        output: Box<Type>,
    },
    SubscriptionFactory {
        parameters: Vec<Type>,
    },
    Subscription,
    Function {
        parameters: Vec<Type>,
        result: Box<Type>,
    },
    Queryable(Box<Type>),
    KeyValue(Box<Type>, Box<Type>),
    Record(String),
}

impl Type {
    pub fn observable(element: Type) -> Self {
        Type::Observable(Box::new(element))
    }

    pub fn observer(element: Type) -> Self {
        Type::Observer(Box::new(element))
    }

    pub fn stream(input: Type, output: Type) -> Self {
        Type::Stream {
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn stream_factory(parameters: Vec<Type>, input: Type, output: Type) -> Self {
        Type::StreamFactory {
            parameters,
            input: Box::new(input),
            output: Box::new(output),
        }
    }

    pub fn subscription_factory(parameters: Vec<Type>) -> Self {
        Type::SubscriptionFactory { parameters }
    }

    pub fn function(parameters: Vec<Type>, result: Type) -> Self {
        Type::Function {
            parameters,
            result: Box::new(result),
        }
    }

    pub fn queryable(element: Type) -> Self {
        Type::Queryable(Box::new(element))
    }

    pub fn key_value(key: Type, value: Type) -> Self {
        Type::KeyValue(Box::new(key), Box::new(value))
    }

    pub fn record(name: impl Into<String>) -> Self {
        Type::Record(name.into())
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Type::Any)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Int | Type::Float)
    }

    /// Type produced by invoking a value of this type
    pub fn invocation_result(&self) -> Type {
        match self {
            Type::Function { result, .. } => (**result).clone(),
            Type::StreamFactory { input, output, .. } => Type::Stream {
                input: input.clone(),
                output: output.clone(),
            },
            Type::SubscriptionFactory { .. } => Type::Subscription,
            _ => Type::Any,
        }
    }

    /// Declared parameter types of an invocable type
    pub fn invocation_parameters(&self) -> Option<&[Type]> {
        match self {
            Type::Function { parameters, .. }
            | Type::StreamFactory { parameters, .. }
            | Type::SubscriptionFactory { parameters } => Some(parameters),
            _ => None,
        }
    }

    /// Type of `member` on a value of this type, if the member is recognized
    pub fn member_type(&self, member: &str) -> Option<Type> {
        match (self, member) {
            (Type::KeyValue(key, _), "key") => Some((**key).clone()),
            (Type::KeyValue(_, value), "value") => Some((**value).clone()),
            (Type::Record(name), _) if DESCRIPTOR_RECORDS.contains(&name.as_str()) => {
                match member {
                    "uri" => Some(Type::Uri),
                    "expression" => Some(Type::String),
                    "state" => Some(Type::Any),
                    "created" => Some(Type::Int),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    /// Structural compatibility where `Any` on either side matches anything
    pub fn is_compatible_with(&self, expected: &Type) -> bool {
        match (self, expected) {
            (Type::Any, _) | (_, Type::Any) => true,
            (Type::Observable(a), Type::Observable(b))
            | (Type::Observer(a), Type::Observer(b))
            | (Type::Queryable(a), Type::Queryable(b)) => a.is_compatible_with(b),
            (
                Type::Stream {
                    input: ai,
                    output: ao,
                },
                Type::Stream {
                    input: bi,
                    output: bo,
                },
            ) => ai.is_compatible_with(bi) && ao.is_compatible_with(bo),
            (
                Type::StreamFactory {
                    parameters: ap,
                    input: ai,
                    output: ao,
                },
                Type::StreamFactory {
                    parameters: bp,
                    input: bi,
                    output: bo,
                },
            ) => {
                all_compatible(ap, bp) && ai.is_compatible_with(bi) && ao.is_compatible_with(bo)
            }
            (
                Type::SubscriptionFactory { parameters: ap },
                Type::SubscriptionFactory { parameters: bp },
            ) => all_compatible(ap, bp),
            (
                Type::Function {
                    parameters: ap,
                    result: ar,
                },
                Type::Function {
                    parameters: bp,
                    result: br,
                },
            ) => all_compatible(ap, bp) && ar.is_compatible_with(br),
            (Type::KeyValue(ak, av), Type::KeyValue(bk, bv)) => {
                ak.is_compatible_with(bk) && av.is_compatible_with(bv)
            }
            _ => self == expected,
        }
    }

    /// Replace `Generic(i)` placeholders with `arguments[i]`
    pub fn instantiate(&self, arguments: &[Type]) -> Type {
        let map = |types: &[Type]| -> Vec<Type> {
            types.iter().map(|t| t.instantiate(arguments)).collect()
        };
        match self {
            Type::Generic(index) => arguments.get(*index).cloned().unwrap_or(Type::Any),
            Type::Observable(e) => Type::observable(e.instantiate(arguments)),
            Type::Observer(e) => Type::observer(e.instantiate(arguments)),
            Type::Queryable(e) => Type::queryable(e.instantiate(arguments)),
            Type::Stream { input, output } => {
                Type::stream(input.instantiate(arguments), output.instantiate(arguments))
            }
            Type::StreamFactory {
                parameters,
                input,
                output,
            } => Type::stream_factory(
                map(parameters),
                input.instantiate(arguments),
                output.instantiate(arguments),
            ),
            Type::SubscriptionFactory { parameters } => {
                Type::subscription_factory(map(parameters))
            }
            Type::Function { parameters, result } => {
                Type::function(map(parameters), result.instantiate(arguments))
            }
            Type::KeyValue(k, v) => {
                Type::key_value(k.instantiate(arguments), v.instantiate(arguments))
            }
            other => other.clone(),
        }
    }

    pub fn contains_generic(&self) -> bool {
        match self {
            Type::Generic(_) => true,
            Type::Observable(e) | Type::Observer(e) | Type::Queryable(e) => e.contains_generic(),
            Type::Stream { input, output } => input.contains_generic() || output.contains_generic(),
            Type::StreamFactory {
                parameters,
                input,
                output,
            } => {
                parameters.iter().any(Type::contains_generic)
                    || input.contains_generic()
                    || output.contains_generic()
            }
            Type::SubscriptionFactory { parameters } => {
                parameters.iter().any(Type::contains_generic)
            }
            Type::Function { parameters, result } => {
                parameters.iter().any(Type::contains_generic) || result.contains_generic()
            }
            Type::KeyValue(k, v) => k.contains_generic() || v.contains_generic(),
            _ => false,
        }
    }
}

fn all_compatible(actual: &[Type], expected: &[Type]) -> bool {
    actual.len() == expected.len()
        && actual
            .iter()
            .zip(expected)
            .all(|(a, e)| a.is_compatible_with(e))
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[Type]) -> fmt::Result {
    for (i, t) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", t)?;
    }
    Ok(())
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Unit => write!(f, "unit"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::String => write!(f, "string"),
            Type::Uri => write!(f, "uri"),
            Type::Duration => write!(f, "duration"),
            Type::Generic(index) => write!(f, "${}", index),
            Type::Observable(e) => write!(f, "Observable<{}>", e),
            Type::Observer(e) => write!(f, "Observer<{}>", e),
            Type::Stream { input, output } => write!(f, "Stream<{}, {}>", input, output),
            Type::StreamFactory {
                parameters,
                input,
                output,
            } => {
                write!(f, "StreamFactory<[")?;
                write_list(f, parameters)?;
                write!(f, "], {}, {}>", input, output)
            }
            Type::SubscriptionFactory { parameters } => {
                write!(f, "SubscriptionFactory<[")?;
                write_list(f, parameters)?;
                write!(f, "]>")
            }
            Type::Subscription => write!(f, "Subscription"),
            Type::Function { parameters, result } => {
                write!(f, "fn(")?;
                write_list(f, parameters)?;
                write!(f, ") -> {}", result)
            }
            Type::Queryable(e) => write!(f, "Queryable<{}>", e),
            Type::KeyValue(k, v) => write!(f, "KeyValue<{}, {}>", k, v),
            Type::Record(name) => write!(f, "{}", name),
        }
    }
}

/// A generic signature: a type template over `arity` placeholders.
///
/// Closing the scheme with concrete type arguments yields the delegate type
/// a known resource is bound with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeScheme {
    pub arity: usize,
    pub template: Type,
}

impl TypeScheme {
    pub fn new(arity: usize, template: Type) -> Self {
        Self { arity, template }
    }

    /// A scheme without placeholders
    pub fn closed(template: Type) -> Self {
        Self { arity: 0, template }
    }

    pub fn instantiate(&self, arguments: &[Type]) -> TributaryResult<Type> {
        if arguments.len() != self.arity {
            return Err(TributaryError::InvalidArgument(format!(
                "signature '{}' expects {} type argument(s), got {}",
                self.template,
                self.arity,
                arguments.len()
            )));
        }
        Ok(self.template.instantiate(arguments))
    }

    /// Instantiate with `any` for every placeholder
    pub fn erased(&self) -> Type {
        self.template.instantiate(&vec![Type::Any; self.arity])
    }
}
