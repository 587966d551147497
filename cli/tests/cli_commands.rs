use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn tributary() -> Command {
    Command::cargo_bin("tributary").unwrap()
}

#[test]
fn test_cli_normalize_beta_reduces() {
    tributary()
        .arg("normalize")
        .arg("(x => x + 1)(2)")
        .assert()
        .success()
        .stdout("2 + 1\n");
}

#[test]
fn test_cli_normalize_with_let_bindings() {
    tributary()
        .arg("normalize")
        .arg("limit > 3 && name == station")
        .arg("--let")
        .arg("limit=5")
        .arg("--let")
        .arg("name=\"north\"")
        .assert()
        .success()
        .stdout("5 > 3 && \"north\" == station\n");
}

#[test]
fn test_cli_normalize_json() {
    tributary()
        .arg("normalize")
        .arg("--json")
        .arg("1")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"Constant\""));
}

#[test]
fn test_cli_normalize_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("query.rx");
    fs::write(&path, "// inline the selector\n(f => f(3))(y => y * y)\n").unwrap();

    tributary()
        .arg("normalize")
        .arg("--file")
        .arg(&path)
        .assert()
        .success()
        .stdout("3 * 3\n");
}

#[test]
fn test_cli_compile_create_subscription() {
    tributary()
        .arg("compile")
        .arg("create-subscription")
        .arg("--target")
        .arg("rx://s")
        .arg("<rx://builtin/subscribe>(<rx://xs>, <rx://ob>)")
        .assert()
        .success()
        .stdout("CreateSubscription(rx://s, <rx://builtin/subscribe>(<rx://xs>, <rx://ob>), null)\n");
}

#[test]
fn test_cli_compile_delete_carries_only_target() {
    tributary()
        .arg("compile")
        .arg("DeleteSubscription")
        .arg("--target")
        .arg("rx://s1")
        .assert()
        .success()
        .stdout("DeleteSubscription(rx://s1)\n");
}

#[test]
fn test_cli_compile_on_next_value() {
    tributary()
        .arg("compile")
        .arg("observer-on-next")
        .arg("--target")
        .arg("rx://ob")
        .arg("--value")
        .arg("42")
        .assert()
        .success()
        .stdout("ObserverOnNext(rx://ob, 42)\n");
}

#[test]
fn test_cli_compile_json() {
    tributary()
        .arg("compile")
        .arg("undefine-observable")
        .arg("--target")
        .arg("rx://xs")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"kind\": \"UndefineObservable\""))
        .stdout(predicate::str::contains("\"target\": \"rx://xs\""));
}

#[test]
fn test_cli_compile_missing_target() {
    tributary()
        .arg("compile")
        .arg("create-subscription")
        .arg("<rx://xs>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires a target URI"));
}

#[test]
fn test_cli_compile_unrooted_metadata_query() {
    tributary()
        .arg("compile")
        .arg("metadata-query")
        .arg("<rx://xs>")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not rooted at a metadata collection"));
}

#[test]
fn test_cli_compile_unknown_kind() {
    tributary()
        .arg("compile")
        .arg("launch")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown operation kind"));
}

#[test]
fn test_cli_parse_error_is_reported() {
    tributary()
        .arg("normalize")
        .arg("1 +")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn test_cli_step_limit() {
    tributary()
        .arg("normalize")
        .arg("--max-steps")
        .arg("5")
        .arg("(x => x(x))(x => x(x))")
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_reduction_steps"));
}

#[test]
fn test_cli_invalid_binding() {
    tributary()
        .arg("normalize")
        .arg("x")
        .arg("--let")
        .arg("novalue")
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected name=value"));
}

#[test]
fn test_cli_inspect_reports_residue() {
    tributary()
        .arg("inspect")
        .arg("x => Client::lookup(x) + limit")
        .assert()
        .success()
        .stdout(predicate::str::contains("Residue: open"))
        .stdout(predicate::str::contains("Client::lookup"))
        .stdout(predicate::str::contains("limit"));
}

#[test]
fn test_cli_inspect_closed_with_bindings() {
    tributary()
        .arg("inspect")
        .arg("limit + 1")
        .arg("--let")
        .arg("limit=2")
        .assert()
        .success()
        .stdout(predicate::str::contains("Residue: closed"));
}

#[test]
fn test_cli_registry_lists_builtin_uris() {
    tributary()
        .arg("registry")
        .assert()
        .success()
        .stdout(predicate::str::contains("rx://operators/filter"))
        .stdout(predicate::str::contains("rx://query/containsKey"))
        .stdout(predicate::str::contains("12 known resource(s)"));
}

#[test]
fn test_cli_registry_json() {
    tributary()
        .arg("registry")
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"uri\":\"rx://operators/bind\""))
        .stdout(predicate::str::contains("\"inline\":true"));
}
