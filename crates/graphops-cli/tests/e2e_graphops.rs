//! E2E tests driving the `graphops` binary over real snapshot files.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

fn graphops() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("graphops"));
    cmd.env("GRAPHOPS_LOG", "error");
    cmd
}

/// A small graph with a cycle {a, b}, a chain to d, a redundant shortcut
/// a -> d, and tags/properties to exercise filter and supergraph.
fn write_fixture(dir: &Path) -> PathBuf {
    let path = dir.join("deps.graph.json");
    let content = serde_json::json!({
        "nodes": {
            "a": {
                "module": "m1",
                "tags": ["keep"],
                "targets": { "b": {}, "d": {} }
            },
            "b": {
                "module": "m1",
                "targets": { "a": {}, "c": {} }
            },
            "c": {
                "module": "m2",
                "tags": ["keep"],
                "targets": { "d": {} }
            },
            "d": { "module": "m2" }
        },
        "title": "fixture"
    });
    fs::write(&path, format!("{}\n", serde_json::to_string_pretty(&content).unwrap()))
        .expect("write fixture");
    path
}

fn load_json(path: &Path) -> Value {
    let text = fs::read_to_string(path).expect("read output");
    serde_json::from_str(&text).expect("valid JSON")
}

#[test]
fn stats_reports_counts_in_json() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    let output = graphops()
        .args(["stats", "-i", input.to_str().unwrap(), "--json"])
        .output()
        .expect("run stats");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("stats JSON");
    assert_eq!(json["nodes"], 4);
    assert_eq!(json["edges"], 5);
    assert_eq!(json["seeds"], 0);
    assert_eq!(json["sinks"], 1);
}

#[test]
fn cycles_finds_the_two_node_cycle() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    let output = graphops()
        .args(["cycles", "-i", input.to_str().unwrap(), "--json"])
        .output()
        .expect("run cycles");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("cycles JSON");
    assert_eq!(json["cycles"], serde_json::json!([["a", "b"]]));
}

#[test]
fn scc_writes_the_component_graph() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args(["scc", "-i", input.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("3 components, 1 cycles"));

    let quotient = load_json(&dir.path().join("deps.scc.graph.json"));
    let nodes = quotient["nodes"].as_object().expect("nodes");
    let names: Vec<&String> = nodes.keys().collect();
    assert_eq!(names, vec!["SCC-000", "SCC-001", "SCC-002"]);
    assert_eq!(nodes["SCC-000"]["sccindex"], "0");
    assert_eq!(nodes["SCC-000"]["sublabel"], "(2 nodes)");
}

#[test]
fn purify_scc_drops_the_shortcut() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args(["purify", "-i", input.to_str().unwrap(), "--scc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 redundant edges"));

    let pure = load_json(&dir.path().join("deps.sccpure.graph.json"));
    // The cycle edges survive, the a -> d shortcut does not.
    assert!(pure["nodes"]["a"]["targets"].get("b").is_some());
    assert!(pure["nodes"]["b"]["targets"].get("a").is_some());
    assert!(pure["nodes"]["a"]["targets"].get("d").is_none());
}

#[test]
fn purify_without_mark_cycles_fails_on_cycle() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args(["purify", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle detected"));
}

#[test]
fn purify_mark_cycles_tags_the_cut_edge() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args([
            "purify",
            "-i",
            input.to_str().unwrap(),
            "--mark-cycles",
            "--json",
        ])
        .assert()
        .success();

    let pure = load_json(&dir.path().join("deps.pure.graph.json"));
    // The back edge b -> a is re-added with the cyclelink tag and color.
    let edge = &pure["nodes"]["b"]["targets"]["a"];
    assert_eq!(edge["tags"], serde_json::json!(["cyclelink"]));
    assert_eq!(edge["color"], "red");
}

#[test]
fn filter_exclude_scrubs_edges() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args([
            "filter",
            "-i",
            input.to_str().unwrap(),
            "keep",
            "--exclude",
            "--json",
        ])
        .assert()
        .success();

    let filtered = load_json(&dir.path().join("deps.filtered.graph.json"));
    let nodes = filtered["nodes"].as_object().expect("nodes");
    let names: Vec<&String> = nodes.keys().collect();
    assert_eq!(names, vec!["b", "d"]);
    // b's only surviving edge target would be a or c; both are gone.
    assert!(nodes["b"].get("targets").is_none());
}

#[test]
fn prune_edge_then_node() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());
    let pruned = dir.path().join("deps.pruned.graph.json");

    graphops()
        .args([
            "prune",
            "-i",
            input.to_str().unwrap(),
            "--source",
            "a",
            "--target",
            "d",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 edges, 0 nodes"));

    graphops()
        .args([
            "prune",
            "-i",
            pruned.to_str().unwrap(),
            "-o",
            pruned.to_str().unwrap(),
            "--node",
            "b",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 3 edges, 1 nodes"));

    let result = load_json(&pruned);
    assert!(result["nodes"].get("b").is_none());
    assert!(result["nodes"]["a"].get("targets").is_none());
}

#[test]
fn prune_requires_a_selector() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args(["prune", "-i", input.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to prune"));
}

#[test]
fn dot_emits_clusters_and_rankdir() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args([
            "dot",
            "-i",
            input.to_str().unwrap(),
            "--horizontal",
            "--cluster-by",
            "module",
        ])
        .assert()
        .success();

    let dot = fs::read_to_string(dir.path().join("deps.dot")).expect("dot file");
    assert!(dot.starts_with("digraph {"));
    assert!(dot.contains("rankdir=\"LR\";"));
    assert!(dot.contains("subgraph \"cluster_m1\" {"));
    assert!(dot.contains("\"a\" -> \"b\";"));
}

#[test]
fn supergraph_folds_by_module() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args([
            "supergraph",
            "-i",
            input.to_str().unwrap(),
            "--by",
            "module",
            "--add-nodes",
            "--json",
        ])
        .assert()
        .success();

    let folded = load_json(&dir.path().join("deps.super.graph.json"));
    let nodes = folded["nodes"].as_object().expect("nodes");
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes["m1"]["sublabel"], "(2 nodes)");
    // Cross-class edges collapse to one super-edge m1 -> m2.
    assert!(nodes["m1"]["targets"].get("m2").is_some());
    assert!(nodes["m2"].get("targets").is_none());
    assert_eq!(
        nodes["m1"]["keytags"]["node"],
        serde_json::json!(["a", "b"])
    );
}

#[test]
fn csv_lists_nodes_in_order() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    graphops()
        .args(["csv", "-i", input.to_str().unwrap()])
        .assert()
        .success();

    let csv = fs::read_to_string(dir.path().join("deps.nodes.csv")).expect("csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines[0], "node,kind,sources,targets,tags");
    assert_eq!(lines[1], "a,other,1,2,keep");
    assert_eq!(lines[4], "d,sink,2,0,");
}

#[test]
fn tags_counts_tagged_nodes() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());

    let output = graphops()
        .args(["tags", "-i", input.to_str().unwrap(), "--json"])
        .output()
        .expect("run tags");
    assert!(output.status.success());

    let json: Value = serde_json::from_slice(&output.stdout).expect("tags JSON");
    assert_eq!(
        json["tags"],
        serde_json::json!([{ "key": "", "tag": "keep", "nodes": 2 }])
    );
}

#[test]
fn missing_input_fails_cleanly() {
    graphops()
        .args(["stats", "-i", "no-such-file.graph.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load"));
}

#[test]
fn malformed_input_reports_error_code_in_json() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("bad.graph.json");
    fs::write(&path, "[1, 2, 3]\n").expect("write");

    let output = graphops()
        .args(["stats", "-i", path.to_str().unwrap(), "--json"])
        .output()
        .expect("run stats");
    assert!(!output.status.success());

    let json: Value = serde_json::from_slice(&output.stderr).expect("error JSON");
    assert_eq!(json["error"]["error_code"], "malformed_input");
}

#[test]
fn round_trip_through_the_binary_is_stable() {
    let dir = TempDir::new().unwrap();
    let input = write_fixture(dir.path());
    let copy = dir.path().join("copy.graph.json");

    // A no-op prune rewrites the file without changing it.
    graphops()
        .args([
            "prune",
            "-i",
            input.to_str().unwrap(),
            "-o",
            copy.to_str().unwrap(),
            "--source",
            "ghost",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 0 edges"));

    assert_eq!(load_json(&input), load_json(&copy));
}
