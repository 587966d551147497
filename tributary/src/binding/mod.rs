//! Known-resource binding
//!
//! Rewrites member invocations into URI-parameterized invocation nodes. Binding
//! only reads metadata: instance annotations first, then the registry. A member
//! known to neither stays an ordinary [`Call`](crate::semantic::ExpressionKind::Call).

pub mod registry;
pub mod well_known;

use crate::semantic::{Expression, Method};
use crate::types::Type;
use crate::TributaryResult;
use registry::{KnownResources, MemberRef};
use tracing::trace;

/// A member that denotes a fixed resource on one particular instance
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub uri: String,
    pub ty: Type,
}

impl Annotation {
    pub fn new(uri: impl Into<String>, ty: Type) -> Self {
        Self {
            uri: uri.into(),
            ty,
        }
    }
}

/// Per-instance resource declarations of a proxy or context type
pub trait ResourceAnnotations {
    /// Name used for members that stay ordinary calls
    fn type_name(&self) -> &str;

    fn annotation(&self, member: &str) -> Option<Annotation>;
}

/// Identity of one invocation being bound
#[derive(Clone, Copy)]
pub struct CallSite<'a> {
    pub member: MemberRef,
    pub type_arguments: &'a [Type],
    pub instance: Option<&'a dyn ResourceAnnotations>,
    /// Result type of the call when it is not rewritten
    pub result: &'a Type,
}

impl<'a> CallSite<'a> {
    pub fn new(member: MemberRef, type_arguments: &'a [Type], result: &'a Type) -> Self {
        Self {
            member,
            type_arguments,
            instance: None,
            result,
        }
    }

    pub fn on(mut self, instance: &'a dyn ResourceAnnotations) -> Self {
        self.instance = Some(instance);
        self
    }
}

pub struct Binder<'r> {
    registry: &'r KnownResources,
}

impl<'r> Binder<'r> {
    pub fn new(registry: &'r KnownResources) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r KnownResources {
        self.registry
    }

    /// Bind one invocation of `site` applied to `arguments`
    pub fn bind(
        &self,
        site: CallSite<'_>,
        arguments: Vec<Expression>,
    ) -> TributaryResult<Expression> {
        if let Some(instance) = site.instance {
            if let Some(annotation) = instance.annotation(site.member.name) {
                trace!(member = %site.member, uri = %annotation.uri, "bound by instance annotation");
                let resource = Expression::resource(annotation.uri, annotation.ty);
                return Ok(if arguments.is_empty() {
                    resource
                } else {
                    Expression::invoke(resource, arguments)
                });
            }
        }

        if let Some(known) = self.registry.lookup(&site.member) {
            let delegate = known.delegate_type(site.type_arguments)?;
            trace!(member = %site.member, uri = %known.uri, "bound by registry");
            return Ok(Expression::invoke(
                Expression::resource(known.uri.clone(), delegate),
                arguments,
            ));
        }

        let declaring_type = site
            .instance
            .map(|instance| instance.type_name().to_string())
            .unwrap_or_else(|| site.member.declaring_type.to_string());
        trace!(member = %site.member, "no annotation, left as call");
        Ok(Expression::call(
            Method::new(declaring_type, site.member.name, site.result.clone()),
            arguments,
        ))
    }

    /// Bind a property read: a bare resource when annotated, a zero-argument call otherwise
    pub fn bind_property(
        &self,
        instance: &dyn ResourceAnnotations,
        property: &str,
        ty: Type,
    ) -> Expression {
        match instance.annotation(property) {
            Some(annotation) => Expression::resource(annotation.uri, annotation.ty),
            None => Expression::call(Method::new(instance.type_name(), property, ty), Vec::new()),
        }
    }
}
