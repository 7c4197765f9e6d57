use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

const MANIFEST: &str = r#"
[[models]]
name = "app::models::User"

[[models.relations]]
name = "posts"
kind = "one_to_many"
target = "app::models::Post"
foreign_key = "user_id"

[[models]]
name = "app::models::Post"

[[models.relations]]
name = "author"
kind = "many_to_one"
target = "app::models::User"
foreign_key = "user_id"
"#;

#[test]
fn config_exclude_list_drops_models() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("models.toml");
    let config = dir.path().join("model-relations-graph.toml");
    fs::write(&manifest, MANIFEST).unwrap();
    fs::write(&config, "exclude_models = [\"app::models::Post\"]\n").unwrap();

    let mut cmd = Command::cargo_bin("model-relations-graph").unwrap();
    cmd.arg("generate")
        .arg("--manifest")
        .arg(&manifest)
        .arg("--config")
        .arg(&config)
        .arg("--dry-run");
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(doc["total_models"], 1);
    assert_eq!(doc["models"][0]["short_name"], "User");
    // the mutual loop cannot form with Post excluded
    assert_eq!(doc["loops"].as_array().unwrap().len(), 0);
}

#[test]
fn dry_run_document_has_expected_shape() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("models.toml");
    fs::write(&manifest, MANIFEST).unwrap();

    let mut cmd = Command::cargo_bin("model-relations-graph").unwrap();
    cmd.arg("generate").arg("--manifest").arg(&manifest).arg("--dry-run");
    let assert = cmd.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(doc["version"], "1.0");
    assert_eq!(doc["total_models"], 2);
    assert_eq!(doc["total_relationships"], 2);
    // User <-> Post is one deduplicated loop
    assert_eq!(doc["loops"].as_array().unwrap().len(), 1);

    let edges = doc["relationships"].as_array().unwrap();
    let author = edges.iter().find(|e| e["label"] == "author").unwrap();
    assert_eq!(author["direction"], "incoming");
    assert_eq!(author["cardinality"], "many-to-one");
    let posts = edges.iter().find(|e| e["label"] == "posts").unwrap();
    assert_eq!(posts["direction"], "outgoing");
    assert_eq!(posts["cardinality"], "one-to-many");

    for node in doc["models"].as_array().unwrap() {
        assert_eq!(node["in_loops"], true);
        assert!(node["loop_severity"].as_u64().unwrap() >= 1);
    }
}

#[test]
fn quiet_suppresses_summary_output() {
    let dir = tempdir().unwrap();
    let manifest = dir.path().join("models.toml");
    fs::write(&manifest, MANIFEST).unwrap();
    let output = dir.path().join("graph.json");

    let mut cmd = Command::cargo_bin("model-relations-graph").unwrap();
    cmd.arg("generate")
        .arg("--manifest")
        .arg(&manifest)
        .arg("--output")
        .arg(&output)
        .arg("--quiet");
    cmd.assert().success().stdout(predicate::str::is_empty());
    assert!(output.exists());
}

#[test]
fn completions_emit_script() {
    let mut cmd = Command::cargo_bin("model-relations-graph").unwrap();
    cmd.arg("completions").arg("bash");
    cmd.assert().success().stdout(predicate::str::contains("model-relations-graph"));
}
