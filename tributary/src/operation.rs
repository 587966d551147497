use crate::semantic::Expression;
use crate::value::Value;
use serde::Serialize;
use std::fmt;

/// The single command a terminal call compiles into.
///
/// Delete and undefine variants carry only the target URI. A metadata query
/// carries only its expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind")]
pub enum ServiceOperation {
    CreateSubscription {
        target: String,
        expression: Expression,
        state: Option<Value>,
    },
    DeleteSubscription {
        target: String,
    },
    CreateStream {
        target: String,
        expression: Expression,
        state: Option<Value>,
    },
    DeleteStream {
        target: String,
    },
    DefineObservable {
        target: String,
        expression: Expression,
        state: Option<Value>,
    },
    UndefineObservable {
        target: String,
    },
    DefineObserver {
        target: String,
        expression: Expression,
        state: Option<Value>,
    },
    UndefineObserver {
        target: String,
    },
    DefineStreamFactory {
        target: String,
        expression: Expression,
        state: Option<Value>,
    },
    UndefineStreamFactory {
        target: String,
    },
    DefineSubscriptionFactory {
        target: String,
        expression: Expression,
        state: Option<Value>,
    },
    UndefineSubscriptionFactory {
        target: String,
    },
    ObserverOnNext {
        target: String,
        value: Value,
    },
    ObserverOnError {
        target: String,
        error: Value,
    },
    ObserverOnCompleted {
        target: String,
    },
    MetadataQuery {
        expression: Expression,
    },
}

impl ServiceOperation {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceOperation::CreateSubscription { .. } => "CreateSubscription",
            ServiceOperation::DeleteSubscription { .. } => "DeleteSubscription",
            ServiceOperation::CreateStream { .. } => "CreateStream",
            ServiceOperation::DeleteStream { .. } => "DeleteStream",
            ServiceOperation::DefineObservable { .. } => "DefineObservable",
            ServiceOperation::UndefineObservable { .. } => "UndefineObservable",
            ServiceOperation::DefineObserver { .. } => "DefineObserver",
            ServiceOperation::UndefineObserver { .. } => "UndefineObserver",
            ServiceOperation::DefineStreamFactory { .. } => "DefineStreamFactory",
            ServiceOperation::UndefineStreamFactory { .. } => "UndefineStreamFactory",
            ServiceOperation::DefineSubscriptionFactory { .. } => "DefineSubscriptionFactory",
            ServiceOperation::UndefineSubscriptionFactory { .. } => "UndefineSubscriptionFactory",
            ServiceOperation::ObserverOnNext { .. } => "ObserverOnNext",
            ServiceOperation::ObserverOnError { .. } => "ObserverOnError",
            ServiceOperation::ObserverOnCompleted { .. } => "ObserverOnCompleted",
            ServiceOperation::MetadataQuery { .. } => "MetadataQuery",
        }
    }

    /// Target URI; metadata queries have none
    pub fn target(&self) -> Option<&str> {
        match self {
            ServiceOperation::CreateSubscription { target, .. }
            | ServiceOperation::DeleteSubscription { target }
            | ServiceOperation::CreateStream { target, .. }
            | ServiceOperation::DeleteStream { target }
            | ServiceOperation::DefineObservable { target, .. }
            | ServiceOperation::UndefineObservable { target }
            | ServiceOperation::DefineObserver { target, .. }
            | ServiceOperation::UndefineObserver { target }
            | ServiceOperation::DefineStreamFactory { target, .. }
            | ServiceOperation::UndefineStreamFactory { target }
            | ServiceOperation::DefineSubscriptionFactory { target, .. }
            | ServiceOperation::UndefineSubscriptionFactory { target }
            | ServiceOperation::ObserverOnNext { target, .. }
            | ServiceOperation::ObserverOnError { target, .. }
            | ServiceOperation::ObserverOnCompleted { target } => Some(target),
            ServiceOperation::MetadataQuery { .. } => None,
        }
    }

    pub fn expression(&self) -> Option<&Expression> {
        match self {
            ServiceOperation::CreateSubscription { expression, .. }
            | ServiceOperation::CreateStream { expression, .. }
            | ServiceOperation::DefineObservable { expression, .. }
            | ServiceOperation::DefineObserver { expression, .. }
            | ServiceOperation::DefineStreamFactory { expression, .. }
            | ServiceOperation::DefineSubscriptionFactory { expression, .. }
            | ServiceOperation::MetadataQuery { expression } => Some(expression),
            _ => None,
        }
    }

    pub fn state(&self) -> Option<&Value> {
        match self {
            ServiceOperation::CreateSubscription { state, .. }
            | ServiceOperation::CreateStream { state, .. }
            | ServiceOperation::DefineObservable { state, .. }
            | ServiceOperation::DefineObserver { state, .. }
            | ServiceOperation::DefineStreamFactory { state, .. }
            | ServiceOperation::DefineSubscriptionFactory { state, .. } => state.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        let mut first = true;
        let mut part = |f: &mut fmt::Formatter<'_>, text: &dyn fmt::Display| {
            let separator = if first { "" } else { ", " };
            first = false;
            write!(f, "{}{}", separator, text)
        };
        if let Some(target) = self.target() {
            part(f, &target)?;
        }
        if let Some(expression) = self.expression() {
            part(f, expression)?;
        }
        match self {
            ServiceOperation::ObserverOnNext { value, .. } => part(f, value)?,
            ServiceOperation::ObserverOnError { error, .. } => part(f, error)?,
            _ => {}
        }
        if self.target().is_some() && self.expression().is_some() {
            match self.state() {
                Some(state) => part(f, state)?,
                None => part(f, &"null")?,
            }
        }
        write!(f, ")")
    }
}
