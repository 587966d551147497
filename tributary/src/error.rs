use crate::ast::Span;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Detailed error information with source location
#[derive(Debug, Clone)]
pub struct ErrorDetails {
    pub message: String,
    pub span: Span,
    pub source_id: String,
    pub source_text: Arc<str>,
    pub suggestion: Option<String>,
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (suggestion: {})", suggestion)?;
        }
        write!(
            f,
            " at {}:{}:{}",
            self.source_id, self.span.line, self.span.col
        )
    }
}

/// Error types for expression compilation and dispatch
#[derive(Debug, Error)]
pub enum TributaryError {
    /// A required input is missing or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A well-formed request whose expression does not have the required shape
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Expression text could not be parsed
    #[error("Parse error: {0}")]
    Parse(Box<ErrorDetails>),

    #[error("Resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value}). {suggestion}")]
    ResourceLimitExceeded {
        limit_name: String,
        limit_value: String,
        actual_value: String,
        suggestion: String,
    },

    /// The call was cancelled before its operation was dispatched
    #[error("Operation cancelled before dispatch")]
    Cancelled,

    /// Failure reported by the service provider, passed through unchanged
    #[error("Service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl TributaryError {
    /// Create a parse error with source information
    pub fn parse(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: None,
        }))
    }

    /// Create a parse error with suggestion
    pub fn parse_with_suggestion(
        message: impl Into<String>,
        span: Span,
        source_id: impl Into<String>,
        source_text: Arc<str>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Parse(Box::new(ErrorDetails {
            message: message.into(),
            span,
            source_id: source_id.into(),
            source_text,
            suggestion: Some(suggestion.into()),
        }))
    }

    /// Wrap a backend failure
    pub fn service<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Service(Box::new(error))
    }

    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, TributaryError::InvalidArgument(_))
    }

    pub fn is_invalid_operation(&self) -> bool {
        matches!(self, TributaryError::InvalidOperation(_))
    }
}
