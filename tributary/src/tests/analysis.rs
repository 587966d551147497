use crate::analysis::{self, alpha_equivalent, free_variables, resources, Residue};
use crate::ast::{Symbol, SymbolGenerator};
use crate::binding::registry::KnownResources;
use crate::binding::well_known::operators;
use crate::engine::Engine;
use crate::semantic::Expression;
use std::collections::BTreeSet;

fn parse(input: &str) -> Expression {
    Engine::new().parse(input, None).unwrap()
}

#[test]
fn test_free_variables_exclude_bound_and_resources() {
    let free = free_variables(&parse("x => x + y + <rx://xs>"));
    assert_eq!(free, BTreeSet::from([Symbol::local("y")]));
}

#[test]
fn test_resources_are_collected() {
    let found = resources(&parse("<rx://a>(<rx://b>, x => <rx://a>)"));
    assert_eq!(
        found,
        BTreeSet::from(["rx://a".to_string(), "rx://b".to_string()])
    );
}

#[test]
fn test_depth_and_node_count() {
    let expression = parse("1 + 2 * 3");
    assert_eq!(analysis::depth(&expression), 3);
    assert_eq!(analysis::node_count(&expression), 5);
}

#[test]
fn test_alpha_equivalence() {
    assert!(alpha_equivalent(&parse("x => x"), &parse("y => y")));
    assert!(alpha_equivalent(
        &parse("(a, b) => a - b"),
        &parse("(b, a) => b - a")
    ));
    assert!(!alpha_equivalent(
        &parse("(a, b) => a - b"),
        &parse("(a, b) => b - a")
    ));
    assert!(!alpha_equivalent(&parse("x => y"), &parse("y => y")));
    assert!(!alpha_equivalent(&parse("(x: int) => x"), &parse("x => x")));
}

#[test]
fn test_alpha_equivalence_with_inner_shadowing() {
    assert!(alpha_equivalent(
        &parse("x => x => x"),
        &parse("a => b => b")
    ));
    assert!(!alpha_equivalent(
        &parse("x => x => x"),
        &parse("a => b => a")
    ));
}

#[test]
fn test_fresh_symbols_are_unique() {
    let first = SymbolGenerator::fresh("x");
    let second = SymbolGenerator::fresh("x");
    assert_ne!(first, second);
    assert_eq!(first.hint(), "x");
    assert_eq!(SymbolGenerator::refresh(&first).hint(), "x");
}

#[test]
fn test_residue_of_closed_query() {
    let residue = Residue::of(&parse(
        "<rx://query/where>(<rx://metadata/observables>: Queryable<KeyValue<uri, ObservableDefinition>>, (kv: KeyValue<uri, ObservableDefinition>) => kv.value.uri == uri\"rx://xs\")",
    ));
    assert!(residue.is_closed(), "{:?}", residue);
}

#[test]
fn test_residue_reports_what_stays_local() {
    let residue = Residue::of(&parse("x => Client::lookup(x) + kv.weight + limit"));
    assert_eq!(residue.unbound, BTreeSet::from([Symbol::local("kv"), Symbol::local("limit")]));
    assert_eq!(residue.opaque_calls, BTreeSet::from(["Client::lookup".to_string()]));
    assert_eq!(residue.opaque_members, BTreeSet::from(["weight".to_string()]));
    assert!(!residue.is_closed());
}

#[test]
fn test_contains_redex() {
    let registry = KnownResources::builtin();
    assert!(contains(registry, "(x => x)(1)"));
    assert!(contains(registry, "y => (x => x)(y)"));
    assert!(!contains(registry, "(x => x)(1, 2)"));
    assert!(!contains(registry, "f(1)"));
    assert!(contains(
        registry,
        &format!("<{}>(<rx://xs>, s => s)", operators::BIND)
    ));
    assert!(!contains(
        registry,
        &format!("<{}>(<rx://xs>, s => s)", operators::FILTER)
    ));
}

fn contains(registry: &KnownResources, input: &str) -> bool {
    analysis::contains_redex(&parse(input), registry)
}
