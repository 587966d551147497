use crate::analysis::{self, Residue};
use crate::ast::Symbol;
use crate::binding::registry::KnownResources;
use crate::binding::Binder;
use crate::capture::Captures;
use crate::compiler::{self, OperationKind, TerminalCall};
use crate::operation::ServiceOperation;
use crate::parser;
use crate::reduction::Reducer;
use crate::resource_limits::ResourceLimits;
use crate::semantic::Expression;
use crate::TributaryResult;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Normalizer and compiler for expression trees
///
/// Synchronous and free of shared mutable state; one engine can serve any
/// number of threads.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<KnownResources>,
    limits: ResourceLimits,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            registry: KnownResources::shared_builtin(),
            limits: ResourceLimits::default(),
        }
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_registry(mut self, registry: KnownResources) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    pub fn registry(&self) -> &KnownResources {
        &self.registry
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    pub fn binder(&self) -> Binder<'_> {
        Binder::new(&self.registry)
    }

    /// Parse expression text under this engine's limits
    pub fn parse(&self, text: &str, source_id: Option<String>) -> TributaryResult<Expression> {
        parser::parse_expression(text, source_id, &self.limits)
    }

    /// Reduce to normal form: field reads on constants folded, no redex left
    pub fn normalize(&self, expression: &Expression) -> TributaryResult<Expression> {
        self.normalize_with_bindings(expression, HashMap::new())
    }

    /// Close free locals with `captures`, then normalize
    pub fn normalize_with(
        &self,
        expression: &Expression,
        captures: &Captures,
    ) -> TributaryResult<Expression> {
        let closed = captures.close_over(expression)?;
        self.normalize(&closed)
    }

    /// Normalize where each bound symbol denotes the given lambda in callee position
    pub fn normalize_with_bindings(
        &self,
        expression: &Expression,
        bindings: HashMap<Symbol, Expression>,
    ) -> TributaryResult<Expression> {
        let mut reducer = Reducer::new(&self.registry, &self.limits);
        for (symbol, lambda) in bindings {
            reducer = reducer.bind(symbol, lambda);
        }
        let normalized = reducer.reduce(expression)?;
        debug!(
            nodes_before = analysis::node_count(expression),
            nodes_after = analysis::node_count(&normalized),
            steps = reducer.steps(),
            "normalized expression"
        );
        Ok(normalized)
    }

    /// Validate, normalize and compile one terminal call
    pub fn compile(&self, mut call: TerminalCall) -> TributaryResult<ServiceOperation> {
        compiler::check_arguments(&call)?;

        if let Some(expression) = call.expression.take() {
            let normalized = self.normalize(&expression)?;
            if call.kind == OperationKind::MetadataQuery {
                let residue = Residue::of(&normalized);
                if !residue.is_closed() {
                    debug!(
                        unbound = ?residue.unbound,
                        opaque_calls = ?residue.opaque_calls,
                        opaque_members = ?residue.opaque_members,
                        "shipping metadata query with unresolved residue"
                    );
                }
            }
            call.expression = Some(normalized);
        }

        let operation = compiler::compile(call)?;
        debug!(operation = operation.name(), target = ?operation.target(), "compiled operation");
        Ok(operation)
    }
}
