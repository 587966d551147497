//! # Tributary
//!
//! **Client-side compiler for URI-addressed remote reactive resources**
//!
//! Observables, observers, streams and their factories live on a remote
//! service and are named by URIs. Tributary lets a caller compose them locally
//! through typed proxies that record what was composed instead of running it,
//! and turns the composition into one canonical expression tree wrapped in a
//! discrete service operation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tributary::{
//!     lambda1, ChannelService, ClientContext, Expression, ObserverProxy, Type, TributaryResult,
//!     Value,
//! };
//!
//! # async fn run() -> TributaryResult<()> {
//! let (service, mut operations) = ChannelService::new(16);
//! let ctx = ClientContext::new(Arc::new(service));
//!
//! let xs = ctx.observable("rx://xs", Type::Int)?;
//! let ob = ctx.observer("rx://ob", Type::Int)?;
//!
//! let evens = xs.filter(lambda1(Type::Int, |x| {
//!     x.rem(Expression::constant(Value::Int(2)))
//!         .equals(Expression::constant(Value::Int(0)))
//! }))?;
//! let subscription = evens.subscribe("rx://s", &ob, None).await?;
//! subscription.dispose().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Pipeline
//!
//! 1. Proxies build expression trees whose operators are bound to canonical
//!    URIs through the known-resource registry.
//! 2. Outer-scope values are embedded as constants when a node is built.
//! 3. A terminal call normalizes the tree (constant folding and hygienic
//!    beta-reduction) and compiles it into exactly one [`ServiceOperation`].
//! 4. The operation is handed to a [`ServiceProvider`].

pub mod analysis;
pub mod ast;
pub mod binding;
pub mod capture;
pub mod compiler;
pub mod context;
pub mod engine;
pub mod error;
pub mod metadata;
pub mod operation;
pub mod parser;
pub mod proxy;
pub mod reduction;
pub mod resource_limits;
pub mod semantic;
pub mod service;
pub mod types;
pub mod value;

pub use analysis::Residue;
pub use ast::{Span, Symbol, SymbolGenerator};
pub use binding::registry::{KnownResource, KnownResources, MemberRef};
pub use binding::{Annotation, Binder, CallSite, ResourceAnnotations};
pub use capture::{capture, Captures, IntoConstant};
pub use compiler::{OperationKind, TerminalCall};
pub use context::ClientContext;
pub use engine::Engine;
pub use error::{ErrorDetails, TributaryError};
pub use metadata::{MetadataCollection, QueryProxy};
pub use operation::ServiceOperation;
pub use parser::{parse_expression, parse_type};
pub use proxy::{
    lambda, lambda1, lambda2, ObservableProxy, ObserverProxy, StreamFactoryProxy, StreamProxy,
    SubscriptionFactoryProxy, SubscriptionProxy,
};
pub use resource_limits::ResourceLimits;
pub use semantic::*;
pub use service::{ChannelService, ServiceProvider};
pub use types::{Type, TypeScheme};
pub use value::{Record, Uri, Value};

/// Result type for Tributary operations
pub type TributaryResult<T> = Result<T, TributaryError>;

#[cfg(test)]
mod tests;
