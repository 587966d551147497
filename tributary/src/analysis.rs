//! Static analysis of expression trees
//!
//! Provides utilities for:
//! - Free-variable computation (binding-aware)
//! - Residue classification: what keeps a tree from being closed
//! - Resource references, depth and size metrics
//! - Alpha-equivalence and redex detection

use crate::ast::Symbol;
use crate::binding::registry::KnownResources;
use crate::semantic::{Expression, ExpressionKind};
use std::collections::{BTreeSet, HashMap};

/// Non-resource symbols referenced but not bound within `expression`
pub fn free_variables(expression: &Expression) -> BTreeSet<Symbol> {
    let mut free = BTreeSet::new();
    let mut bound = Vec::new();
    collect_free(expression, &mut bound, &mut free);
    free
}

fn collect_free(expression: &Expression, bound: &mut Vec<Symbol>, free: &mut BTreeSet<Symbol>) {
    match &expression.kind {
        ExpressionKind::Parameter(symbol) => {
            if !symbol.is_resource() && !bound.contains(symbol) {
                free.insert(symbol.clone());
            }
        }
        ExpressionKind::Lambda { parameters, body } => {
            let mark = bound.len();
            bound.extend(parameters.iter().map(|p| p.symbol.clone()));
            collect_free(body, bound, free);
            bound.truncate(mark);
        }
        _ => {
            for child in expression.children() {
                collect_free(child, bound, free);
            }
        }
    }
}

/// URIs of every resource referenced by `expression`
pub fn resources(expression: &Expression) -> BTreeSet<String> {
    let mut uris = BTreeSet::new();
    collect_resources(expression, &mut uris);
    uris
}

fn collect_resources(expression: &Expression, uris: &mut BTreeSet<String>) {
    if let Some(uri) = expression.as_resource() {
        uris.insert(uri.to_string());
    }
    for child in expression.children() {
        collect_resources(child, uris);
    }
}

/// What keeps a tree from being evaluable remotely without client context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Residue {
    /// Free locals that no capture or lambda closes
    pub unbound: BTreeSet<Symbol>,
    /// Calls through members that binding did not recognize (`Type::member`)
    pub opaque_calls: BTreeSet<String>,
    /// Member reads outside the recognized capability set
    pub opaque_members: BTreeSet<String>,
}

impl Residue {
    pub fn of(expression: &Expression) -> Self {
        let mut residue = Residue {
            unbound: free_variables(expression),
            ..Residue::default()
        };
        residue.collect(expression);
        residue
    }

    fn collect(&mut self, expression: &Expression) {
        match &expression.kind {
            ExpressionKind::Call { method, .. } => {
                self.opaque_calls.insert(method.to_string());
            }
            ExpressionKind::MemberAccess { target, member } => {
                if target.ty.member_type(member).is_none() && target.as_constant().is_none() {
                    self.opaque_members.insert(member.clone());
                }
            }
            _ => {}
        }
        for child in expression.children() {
            self.collect(child);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.unbound.is_empty() && self.opaque_calls.is_empty() && self.opaque_members.is_empty()
    }
}

/// Longest path from the root to a leaf, counting the root
pub fn depth(expression: &Expression) -> usize {
    1 + expression
        .children()
        .into_iter()
        .map(depth)
        .max()
        .unwrap_or(0)
}

pub fn node_count(expression: &Expression) -> usize {
    1 + expression
        .children()
        .into_iter()
        .map(node_count)
        .sum::<usize>()
}

/// Structural equality up to consistent renaming of bound parameters
pub fn alpha_equivalent(left: &Expression, right: &Expression) -> bool {
    let mut pairs = AlphaEnv::default();
    alpha_eq(left, right, &mut pairs)
}

#[derive(Default)]
struct AlphaEnv {
    left: HashMap<Symbol, Vec<usize>>,
    right: HashMap<Symbol, Vec<usize>>,
    next: usize,
}

impl AlphaEnv {
    fn lookup(map: &HashMap<Symbol, Vec<usize>>, symbol: &Symbol) -> Option<usize> {
        map.get(symbol).and_then(|levels| levels.last().copied())
    }

    fn push(&mut self, left: &Symbol, right: &Symbol) {
        let level = self.next;
        self.next += 1;
        self.left.entry(left.clone()).or_default().push(level);
        self.right.entry(right.clone()).or_default().push(level);
    }

    fn pop(&mut self, left: &Symbol, right: &Symbol) {
        if let Some(levels) = self.left.get_mut(left) {
            levels.pop();
        }
        if let Some(levels) = self.right.get_mut(right) {
            levels.pop();
        }
    }
}

fn alpha_eq(left: &Expression, right: &Expression, env: &mut AlphaEnv) -> bool {
    if left.ty != right.ty {
        return false;
    }
    match (&left.kind, &right.kind) {
        (ExpressionKind::Parameter(a), ExpressionKind::Parameter(b)) => {
            match (AlphaEnv::lookup(&env.left, a), AlphaEnv::lookup(&env.right, b)) {
                (Some(x), Some(y)) => x == y,
                (None, None) => a == b,
                _ => false,
            }
        }
        (
            ExpressionKind::Lambda {
                parameters: pa,
                body: ba,
            },
            ExpressionKind::Lambda {
                parameters: pb,
                body: bb,
            },
        ) => {
            if pa.len() != pb.len() || pa.iter().zip(pb).any(|(a, b)| a.ty != b.ty) {
                return false;
            }
            for (a, b) in pa.iter().zip(pb) {
                env.push(&a.symbol, &b.symbol);
            }
            let equal = alpha_eq(ba, bb, env);
            for (a, b) in pa.iter().zip(pb).rev() {
                env.pop(&a.symbol, &b.symbol);
            }
            equal
        }
        (ExpressionKind::Constant(a), ExpressionKind::Constant(b)) => a == b,
        (
            ExpressionKind::MemberAccess {
                member: ma,
                ..
            },
            ExpressionKind::MemberAccess {
                member: mb,
                ..
            },
        ) if ma != mb => false,
        (ExpressionKind::New { constructor: ca, .. }, ExpressionKind::New { constructor: cb, .. })
            if ca != cb =>
        {
            false
        }
        (ExpressionKind::Call { method: ma, .. }, ExpressionKind::Call { method: mb, .. })
            if ma != mb =>
        {
            false
        }
        (ExpressionKind::Binary(_, oa, _), ExpressionKind::Binary(_, ob, _)) if oa != ob => false,
        (ExpressionKind::Unary(oa, _), ExpressionKind::Unary(ob, _)) if oa != ob => false,
        (a, b) if std::mem::discriminant(a) == std::mem::discriminant(b) => {
            let (ca, cb) = (left.children(), right.children());
            ca.len() == cb.len() && ca.into_iter().zip(cb).all(|(x, y)| alpha_eq(x, y, env))
        }
        _ => false,
    }
}

/// Whether normalization against `registry` would still rewrite `expression`
pub fn contains_redex(expression: &Expression, registry: &KnownResources) -> bool {
    if let Some((callee, arguments)) = expression.as_invoke() {
        let arity = match &callee.kind {
            ExpressionKind::Lambda { parameters, .. } => Some(parameters.len()),
            ExpressionKind::Parameter(Symbol::Resource(uri)) => registry
                .by_uri(uri)
                .and_then(|known| known.inline_definition(&callee.ty))
                .and_then(|definition| definition.as_lambda().map(|(p, _)| p.len())),
            _ => None,
        };
        if arity == Some(arguments.len()) {
            return true;
        }
    }
    expression
        .children()
        .into_iter()
        .any(|child| contains_redex(child, registry))
}
