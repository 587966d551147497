//! AST infrastructure types
//!
//! This module contains identity types used throughout the parser and normalizer:
//! - `Span` for tracking source text locations
//! - `Symbol` for naming parameters (resources, user locals, generated names)
//! - `SymbolGenerator` for minting collision-free names during hygienic renaming

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Span representing a location in source text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn from_pest_span(span: pest::Span) -> Self {
        let (line, col) = span.start_pos().line_col();
        Self {
            start: span.start(),
            end: span.end(),
            line,
            col,
        }
    }
}

/// Identity of a parameter node.
///
/// Resource symbols name remote resources by URI and are never bound by a lambda.
/// Fresh symbols are only produced by [`SymbolGenerator`]; their numeric id makes
/// them distinct from every user-chosen name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Symbol {
    Resource(String),
    Local(String),
    Fresh { hint: String, id: u64 },
}

impl Symbol {
    pub fn resource(uri: impl Into<String>) -> Self {
        Symbol::Resource(uri.into())
    }

    pub fn local(name: impl Into<String>) -> Self {
        Symbol::Local(name.into())
    }

    pub fn is_resource(&self) -> bool {
        matches!(self, Symbol::Resource(_))
    }

    /// The URI of a resource symbol
    pub fn uri(&self) -> Option<&str> {
        match self {
            Symbol::Resource(uri) => Some(uri),
            _ => None,
        }
    }

    /// The user-facing part of the name, without any generated suffix
    pub fn hint(&self) -> &str {
        match self {
            Symbol::Resource(uri) => uri,
            Symbol::Local(name) => name,
            Symbol::Fresh { hint, .. } => hint,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Resource(uri) => write!(f, "<{}>", uri),
            Symbol::Local(name) => write!(f, "{}", name),
            Symbol::Fresh { hint, id } => write!(f, "{}#{}", hint, id),
        }
    }
}

static NEXT_FRESH_ID: AtomicU64 = AtomicU64::new(1);

/// Process-wide source of fresh symbols.
///
/// Ids increase monotonically across all threads, so two renames can never
/// produce the same symbol even when normalizations run concurrently.
pub struct SymbolGenerator;

impl SymbolGenerator {
    pub fn fresh(hint: &str) -> Symbol {
        let id = NEXT_FRESH_ID.fetch_add(1, Ordering::Relaxed);
        Symbol::Fresh {
            hint: hint.to_string(),
            id,
        }
    }

    /// Fresh symbol derived from an existing one, keeping its readable hint
    pub fn refresh(symbol: &Symbol) -> Symbol {
        Self::fresh(symbol.hint())
    }
}
