use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn pkgfetch_cmd() -> Command {
    Command::cargo_bin("pkgfetch").unwrap()
}

const GRAPH: &str = r#"digraph dependencies {
	"1" [spec="bash", implicit="false", state="cached", type="normal", kind="run", path="/out/bash-5.1-1.x86_64.rpm"];
	"2" [spec="libmissing", implicit="false", state="unresolved", type="normal", kind="run", path=""];
	"1" -> "2";
}
"#;

#[test]
fn test_status_lists_unresolved_nodes() {
    let tmp = TempDir::new().unwrap();
    let graph = tmp.path().join("graph.dot");
    fs::write(&graph, GRAPH).unwrap();

    pkgfetch_cmd()
        .args(["status", "--graph"])
        .arg(&graph)
        .assert()
        .success()
        .stdout(predicate::str::contains("cached: 1"))
        .stdout(predicate::str::contains("libmissing <- bash"));
}

#[test]
fn test_status_deny_unresolved_fails() {
    let tmp = TempDir::new().unwrap();
    let graph = tmp.path().join("graph.dot");
    fs::write(&graph, GRAPH).unwrap();

    pkgfetch_cmd()
        .args(["status", "--deny-unresolved", "--graph"])
        .arg(&graph)
        .assert()
        .failure()
        .stderr(predicate::str::contains("still unresolved"));
}

#[test]
fn test_status_malformed_graph_fails() {
    let tmp = TempDir::new().unwrap();
    let graph = tmp.path().join("graph.dot");
    fs::write(&graph, "digraph g {\n\t\"1\" -> \"2\";\n}\n").unwrap();

    pkgfetch_cmd()
        .args(["status", "--graph"])
        .arg(&graph)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Graph I/O error"));
}
