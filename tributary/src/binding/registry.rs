use crate::binding::well_known::{self, operators, query};
use crate::error::TributaryError;
use crate::semantic::{Expression, Parameter};
use crate::types::{Type, TypeScheme};
use crate::TributaryResult;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Stable identity of a composable member: declaring surface plus member name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberRef {
    pub declaring_type: &'static str,
    pub name: &'static str,
}

impl MemberRef {
    pub const fn new(declaring_type: &'static str, name: &'static str) -> Self {
        Self {
            declaring_type,
            name,
        }
    }
}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring_type, self.name)
    }
}

/// Builds the lambda a resource stands for, given the delegate's parameter types
pub type InlineDefinition = fn(&[Type]) -> Expression;

/// One entry of the known-resource table
#[derive(Clone)]
pub struct KnownResource {
    pub member: MemberRef,
    pub uri: String,
    pub scheme: TypeScheme,
    inline: Option<InlineDefinition>,
}

impl KnownResource {
    pub fn new(member: MemberRef, uri: impl Into<String>, scheme: TypeScheme) -> Self {
        Self {
            member,
            uri: uri.into(),
            scheme,
            inline: None,
        }
    }

    pub fn with_inline(mut self, definition: InlineDefinition) -> Self {
        self.inline = Some(definition);
        self
    }

    pub fn has_inline_definition(&self) -> bool {
        self.inline.is_some()
    }

    /// Delegate type for a call site with the given closed type arguments
    pub fn delegate_type(&self, type_arguments: &[Type]) -> TributaryResult<Type> {
        self.scheme.instantiate(type_arguments)
    }

    /// Lambda substituted for this resource in callee position.
    ///
    /// Parameter types come from the callee's delegate type when it has the
    /// scheme's shape, otherwise from the erased scheme.
    pub fn inline_definition(&self, callee_type: &Type) -> Option<Expression> {
        let definition = self.inline?;
        let erased = self.scheme.erased();
        let expected = erased.invocation_parameters().map_or(0, <[Type]>::len);
        let parameters = match callee_type.invocation_parameters() {
            Some(parameters) if parameters.len() == expected => parameters.to_vec(),
            _ => erased
                .invocation_parameters()
                .map(<[Type]>::to_vec)
                .unwrap_or_default(),
        };
        Some(definition(&parameters))
    }
}

impl fmt::Debug for KnownResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KnownResource")
            .field("member", &self.member)
            .field("uri", &self.uri)
            .field("scheme", &self.scheme)
            .field("inline", &self.inline.is_some())
            .finish()
    }
}

/// Lookup table from member identities to canonical URIs.
///
/// Populated once, then shared read-only. The builtin table covers the
/// reactive operators, the context operations and the query operators.
#[derive(Debug, Clone, Default)]
pub struct KnownResources {
    by_member: HashMap<MemberRef, KnownResource>,
    by_uri: HashMap<String, MemberRef>,
}

static BUILTIN: LazyLock<Arc<KnownResources>> = LazyLock::new(|| Arc::new(builtin_table()));

impl KnownResources {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The process-wide builtin table
    pub fn builtin() -> &'static KnownResources {
        &BUILTIN
    }

    /// Shared handle to the builtin table; no copy is made
    pub fn shared_builtin() -> Arc<KnownResources> {
        Arc::clone(&BUILTIN)
    }

    /// Add an entry; members and URIs must be unique
    pub fn register(&mut self, resource: KnownResource) -> TributaryResult<()> {
        if self.by_member.contains_key(&resource.member) {
            return Err(TributaryError::InvalidArgument(format!(
                "member {} is already registered",
                resource.member
            )));
        }
        if resource.uri.trim().is_empty() {
            return Err(TributaryError::InvalidArgument(format!(
                "member {} has an empty URI",
                resource.member
            )));
        }
        if let Some(existing) = self.by_uri.get(&resource.uri) {
            return Err(TributaryError::InvalidArgument(format!(
                "URI '{}' is already bound to {}",
                resource.uri, existing
            )));
        }
        self.by_uri.insert(resource.uri.clone(), resource.member);
        self.by_member.insert(resource.member, resource);
        Ok(())
    }

    pub fn with(mut self, resource: KnownResource) -> TributaryResult<Self> {
        self.register(resource)?;
        Ok(self)
    }

    pub fn lookup(&self, member: &MemberRef) -> Option<&KnownResource> {
        self.by_member.get(member)
    }

    pub fn by_uri(&self, uri: &str) -> Option<&KnownResource> {
        self.by_uri
            .get(uri)
            .and_then(|member| self.by_member.get(member))
    }

    /// Entries ordered by URI
    pub fn iter(&self) -> impl Iterator<Item = &KnownResource> {
        let mut entries: Vec<&KnownResource> = self.by_member.values().collect();
        entries.sort_by(|a, b| a.uri.cmp(&b.uri));
        entries.into_iter()
    }

    pub fn len(&self) -> usize {
        self.by_member.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_member.is_empty()
    }
}

pub const OBSERVABLE: &str = "Observable";
pub const CONTEXT: &str = "Context";
pub const QUERYABLE: &str = "Queryable";

pub const FILTER: MemberRef = MemberRef::new(OBSERVABLE, "filter");
pub const MAP: MemberRef = MemberRef::new(OBSERVABLE, "map");
pub const BIND: MemberRef = MemberRef::new(OBSERVABLE, "bind");
pub const TAP: MemberRef = MemberRef::new(OBSERVABLE, "tap");
pub const SUBSCRIBE: MemberRef = MemberRef::new(OBSERVABLE, "subscribe");
pub const TIMER: MemberRef = MemberRef::new(CONTEXT, "timer");
pub const EMPTY: MemberRef = MemberRef::new(CONTEXT, "empty");
pub const WHERE: MemberRef = MemberRef::new(QUERYABLE, "where");
pub const SELECT: MemberRef = MemberRef::new(QUERYABLE, "select");
pub const COUNT: MemberRef = MemberRef::new(QUERYABLE, "count");
pub const CONTAINS_KEY: MemberRef = MemberRef::new(QUERYABLE, "contains_key");
pub const JOIN: MemberRef = MemberRef::new(QUERYABLE, "join");

fn g(index: usize) -> Type {
    Type::Generic(index)
}

fn builtin_table() -> KnownResources {
    let observable = |i| Type::observable(g(i));
    let queryable = Type::queryable;

    let entries = vec![
        KnownResource::new(
            FILTER,
            operators::FILTER,
            TypeScheme::new(
                1,
                Type::function(
                    vec![observable(0), Type::function(vec![g(0)], Type::Bool)],
                    observable(0),
                ),
            ),
        ),
        KnownResource::new(
            MAP,
            operators::MAP,
            TypeScheme::new(
                2,
                Type::function(
                    vec![observable(0), Type::function(vec![g(0)], g(1))],
                    observable(1),
                ),
            ),
        ),
        KnownResource::new(
            BIND,
            operators::BIND,
            TypeScheme::new(
                2,
                Type::function(
                    vec![
                        observable(0),
                        Type::function(vec![observable(0)], observable(1)),
                    ],
                    observable(1),
                ),
            ),
        )
        .with_inline(bind_definition),
        KnownResource::new(
            TAP,
            operators::TAP,
            TypeScheme::new(
                1,
                Type::function(
                    vec![observable(0), Type::function(vec![g(0)], Type::Unit)],
                    observable(0),
                ),
            ),
        ),
        KnownResource::new(
            SUBSCRIBE,
            well_known::SUBSCRIBE,
            TypeScheme::new(
                1,
                Type::function(
                    vec![observable(0), Type::observer(g(0))],
                    Type::Subscription,
                ),
            ),
        ),
        KnownResource::new(
            TIMER,
            operators::TIMER,
            TypeScheme::closed(Type::function(
                vec![Type::Duration],
                Type::observable(Type::Int),
            )),
        ),
        KnownResource::new(
            EMPTY,
            operators::EMPTY,
            TypeScheme::new(1, Type::function(vec![], observable(0))),
        ),
        KnownResource::new(
            WHERE,
            query::WHERE,
            TypeScheme::new(
                1,
                Type::function(
                    vec![queryable(g(0)), Type::function(vec![g(0)], Type::Bool)],
                    queryable(g(0)),
                ),
            ),
        ),
        KnownResource::new(
            SELECT,
            query::SELECT,
            TypeScheme::new(
                2,
                Type::function(
                    vec![queryable(g(0)), Type::function(vec![g(0)], g(1))],
                    queryable(g(1)),
                ),
            ),
        ),
        KnownResource::new(
            COUNT,
            query::COUNT,
            TypeScheme::new(1, Type::function(vec![queryable(g(0))], Type::Int)),
        ),
        KnownResource::new(
            CONTAINS_KEY,
            query::CONTAINS_KEY,
            TypeScheme::new(
                1,
                Type::function(
                    vec![queryable(Type::key_value(Type::Uri, g(0))), Type::Uri],
                    Type::Bool,
                ),
            ),
        ),
        KnownResource::new(
            JOIN,
            query::JOIN,
            TypeScheme::new(
                4,
                Type::function(
                    vec![
                        queryable(g(0)),
                        queryable(g(1)),
                        Type::function(vec![g(0)], g(2)),
                        Type::function(vec![g(1)], g(2)),
                        Type::function(vec![g(0), g(1)], g(3)),
                    ],
                    queryable(g(3)),
                ),
            ),
        ),
    ];

    let mut table = KnownResources::empty();
    for entry in entries {
        if let Err(e) = table.register(entry) {
            tracing::error!(error = %e, "invalid builtin known-resource entry");
        }
    }
    table
}

/// `bind` is `(source, selector) => selector(source)`
fn bind_definition(parameters: &[Type]) -> Expression {
    let source = Parameter::local("source", parameters.first().cloned().unwrap_or(Type::Any));
    let selector = Parameter::local("selector", parameters.get(1).cloned().unwrap_or(Type::Any));
    let body = Expression::invoke(selector.to_expression(), vec![source.to_expression()]);
    Expression::lambda(vec![source, selector], body)
}
