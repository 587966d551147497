//! Service operation compiler
//!
//! Pure transform from a normalized terminal call to one operation record.
//! Argument checks run before the tree is looked at; the root shape check runs
//! after. The tree itself is wrapped unchanged.

use crate::binding::well_known::{metadata, query};
use crate::error::TributaryError;
use crate::operation::ServiceOperation;
use crate::semantic::{Expression, ExpressionKind};
use crate::types::Type;
use crate::value::Value;
use crate::TributaryResult;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    CreateSubscription,
    DeleteSubscription,
    CreateStream,
    DeleteStream,
    DefineObservable,
    UndefineObservable,
    DefineObserver,
    UndefineObserver,
    DefineStreamFactory,
    UndefineStreamFactory,
    DefineSubscriptionFactory,
    UndefineSubscriptionFactory,
    ObserverOnNext,
    ObserverOnError,
    ObserverOnCompleted,
    MetadataQuery,
}

impl OperationKind {
    pub const ALL: [OperationKind; 16] = [
        OperationKind::CreateSubscription,
        OperationKind::DeleteSubscription,
        OperationKind::CreateStream,
        OperationKind::DeleteStream,
        OperationKind::DefineObservable,
        OperationKind::UndefineObservable,
        OperationKind::DefineObserver,
        OperationKind::UndefineObserver,
        OperationKind::DefineStreamFactory,
        OperationKind::UndefineStreamFactory,
        OperationKind::DefineSubscriptionFactory,
        OperationKind::UndefineSubscriptionFactory,
        OperationKind::ObserverOnNext,
        OperationKind::ObserverOnError,
        OperationKind::ObserverOnCompleted,
        OperationKind::MetadataQuery,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::CreateSubscription => "CreateSubscription",
            OperationKind::DeleteSubscription => "DeleteSubscription",
            OperationKind::CreateStream => "CreateStream",
            OperationKind::DeleteStream => "DeleteStream",
            OperationKind::DefineObservable => "DefineObservable",
            OperationKind::UndefineObservable => "UndefineObservable",
            OperationKind::DefineObserver => "DefineObserver",
            OperationKind::UndefineObserver => "UndefineObserver",
            OperationKind::DefineStreamFactory => "DefineStreamFactory",
            OperationKind::UndefineStreamFactory => "UndefineStreamFactory",
            OperationKind::DefineSubscriptionFactory => "DefineSubscriptionFactory",
            OperationKind::UndefineSubscriptionFactory => "UndefineSubscriptionFactory",
            OperationKind::ObserverOnNext => "ObserverOnNext",
            OperationKind::ObserverOnError => "ObserverOnError",
            OperationKind::ObserverOnCompleted => "ObserverOnCompleted",
            OperationKind::MetadataQuery => "MetadataQuery",
        }
    }

    pub fn requires_target(&self) -> bool {
        *self != OperationKind::MetadataQuery
    }

    pub fn requires_expression(&self) -> bool {
        matches!(
            self,
            OperationKind::CreateSubscription
                | OperationKind::CreateStream
                | OperationKind::DefineObservable
                | OperationKind::DefineObserver
                | OperationKind::DefineStreamFactory
                | OperationKind::DefineSubscriptionFactory
                | OperationKind::MetadataQuery
        )
    }

    pub fn requires_value(&self) -> bool {
        matches!(
            self,
            OperationKind::ObserverOnNext | OperationKind::ObserverOnError
        )
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for OperationKind {
    type Err = TributaryError;

    /// Accepts `CreateSubscription` as well as `create-subscription`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted: String = s.chars().filter(|c| *c != '-' && *c != '_').collect();
        OperationKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| TributaryError::InvalidArgument(format!("unknown operation kind '{}'", s)))
    }
}

/// Everything a terminal call supplies to the compiler
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalCall {
    pub kind: OperationKind,
    pub target: Option<String>,
    pub expression: Option<Expression>,
    pub value: Option<Value>,
    pub state: Option<Value>,
}

impl TerminalCall {
    pub fn new(kind: OperationKind) -> Self {
        Self {
            kind,
            target: None,
            expression: None,
            value: None,
            state: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_expression(mut self, expression: Expression) -> Self {
        self.expression = Some(expression);
        self
    }

    pub fn with_value(mut self, value: Value) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_state(mut self, state: Option<Value>) -> Self {
        self.state = state;
        self
    }
}

/// Reject missing inputs before any tree walk
pub fn check_arguments(call: &TerminalCall) -> TributaryResult<()> {
    let kind = call.kind;
    match (&call.target, kind.requires_target()) {
        (None, true) => {
            return Err(TributaryError::InvalidArgument(format!(
                "{} requires a target URI",
                kind
            )))
        }
        (Some(target), true) if target.trim().is_empty() => {
            return Err(TributaryError::InvalidArgument(format!(
                "{} target URI is empty",
                kind
            )))
        }
        (Some(target), false) => {
            return Err(TributaryError::InvalidArgument(format!(
                "{} does not take a target URI (got '{}')",
                kind, target
            )))
        }
        _ => {}
    }
    if kind.requires_expression() && call.expression.is_none() {
        return Err(TributaryError::InvalidArgument(format!(
            "{} requires a source expression",
            kind
        )));
    }
    if kind.requires_value() && call.value.is_none() {
        return Err(TributaryError::InvalidArgument(format!(
            "{} requires a value",
            kind
        )));
    }
    Ok(())
}

/// Compile a call whose expression is already normalized
pub fn compile(call: TerminalCall) -> TributaryResult<ServiceOperation> {
    check_arguments(&call)?;
    if let Some(expression) = &call.expression {
        check_root(call.kind, expression)?;
    }

    let TerminalCall {
        kind,
        target,
        expression,
        value,
        state,
    } = call;
    let incomplete = || TributaryError::InvalidArgument(format!("{} is incomplete", kind));

    use OperationKind as K;
    use ServiceOperation as Op;
    Ok(match (target, expression, value) {
        (None, Some(expression), _) if kind == K::MetadataQuery => Op::MetadataQuery { expression },
        (Some(target), Some(expression), _) if kind.requires_expression() => match kind {
            K::CreateSubscription => Op::CreateSubscription {
                target,
                expression,
                state,
            },
            K::CreateStream => Op::CreateStream {
                target,
                expression,
                state,
            },
            K::DefineObservable => Op::DefineObservable {
                target,
                expression,
                state,
            },
            K::DefineObserver => Op::DefineObserver {
                target,
                expression,
                state,
            },
            K::DefineStreamFactory => Op::DefineStreamFactory {
                target,
                expression,
                state,
            },
            K::DefineSubscriptionFactory => Op::DefineSubscriptionFactory {
                target,
                expression,
                state,
            },
            _ => return Err(incomplete()),
        },
        (Some(target), _, Some(value)) if kind.requires_value() => match kind {
            K::ObserverOnNext => Op::ObserverOnNext { target, value },
            K::ObserverOnError => Op::ObserverOnError {
                target,
                error: value,
            },
            _ => return Err(incomplete()),
        },
        (Some(target), _, _) => match kind {
            K::DeleteSubscription => Op::DeleteSubscription { target },
            K::DeleteStream => Op::DeleteStream { target },
            K::UndefineObservable => Op::UndefineObservable { target },
            K::UndefineObserver => Op::UndefineObserver { target },
            K::UndefineStreamFactory => Op::UndefineStreamFactory { target },
            K::UndefineSubscriptionFactory => Op::UndefineSubscriptionFactory { target },
            K::ObserverOnCompleted => Op::ObserverOnCompleted { target },
            _ => return Err(incomplete()),
        },
        _ => return Err(incomplete()),
    })
}

fn check_root(kind: OperationKind, expression: &Expression) -> TributaryResult<()> {
    let ty = &expression.ty;
    let accepted = match kind {
        OperationKind::CreateSubscription => ty.is_compatible_with(&Type::Subscription),
        OperationKind::CreateStream => ty.is_compatible_with(&Type::stream(Type::Any, Type::Any)),
        OperationKind::DefineObservable => {
            produces(ty, |t| matches!(t, Type::Observable(_)))
        }
        OperationKind::DefineObserver => produces(ty, |t| matches!(t, Type::Observer(_))),
        OperationKind::DefineStreamFactory => {
            matches!(ty, Type::StreamFactory { .. })
                || produces(ty, |t| matches!(t, Type::Stream { .. }))
        }
        OperationKind::DefineSubscriptionFactory => {
            matches!(ty, Type::SubscriptionFactory { .. })
                || produces(ty, |t| *t == Type::Subscription)
        }
        OperationKind::MetadataQuery => {
            if is_metadata_rooted(expression) {
                return Ok(());
            }
            return Err(TributaryError::InvalidOperation(format!(
                "metadata query is not rooted at a metadata collection: {}",
                expression
            )));
        }
        _ => true,
    };

    if accepted {
        Ok(())
    } else {
        Err(TributaryError::InvalidOperation(format!(
            "{} expects a different root than '{}' of type {}",
            kind, expression, ty
        )))
    }
}

/// `ty` is `any`, satisfies `expected` itself, or is a function whose result does
fn produces(ty: &Type, expected: impl Fn(&Type) -> bool) -> bool {
    match ty {
        Type::Any => true,
        Type::Function { result, .. } => result.is_any() || expected(result),
        other => expected(other),
    }
}

/// Walk the source chain of query operators down to a metadata collection root
fn is_metadata_rooted(expression: &Expression) -> bool {
    match &expression.kind {
        ExpressionKind::Parameter(symbol) => symbol.uri().is_some_and(metadata::is_root),
        ExpressionKind::Invoke { callee, arguments } => {
            let Some(uri) = callee.as_resource() else {
                return false;
            };
            if !query::is_operator(uri) {
                return false;
            }
            let sources = if uri == query::JOIN { 2 } else { 1 };
            arguments.len() >= sources && arguments[..sources].iter().all(is_metadata_rooted)
        }
        _ => false,
    }
}
