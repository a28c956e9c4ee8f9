//! End-to-end CLI flows through the `oqs` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn oqs() -> Command {
    Command::cargo_bin("oqs").expect("binary built")
}

fn seed_corpus(dir: &TempDir) -> std::path::PathBuf {
    let corpus = serde_json::json!([
        {
            "name": "alice",
            "kind": "ident",
            "label": "Alice Example",
            "description": "Alice Example works at ACME",
            "cats": ["media"],
            "country": "US"
        },
        {
            "name": "lemonde",
            "kind": "org",
            "label": "Le Monde",
            "description": "French outlet",
            "cats": ["media"],
            "country": "FR"
        }
    ]);
    let path = dir.path().join("corpus.json");
    fs::write(&path, corpus.to_string()).unwrap();
    path
}

#[test]
fn build_search_stats_round_trip() {
    let dir = TempDir::new().unwrap();
    let corpus = seed_corpus(&dir);

    oqs()
        .arg("build")
        .arg(&corpus)
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 2 documents"))
        .stdout(predicate::str::contains("ident: 1"));

    oqs()
        .args(["search", "alice", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice Example"))
        .stdout(predicate::str::contains("Type: ident"));

    oqs()
        .args(["stats", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Documents: 2"));
}

#[test]
fn facet_flags_narrow_results() {
    let dir = TempDir::new().unwrap();
    let corpus = seed_corpus(&dir);
    oqs()
        .arg("build")
        .arg(&corpus)
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .success();

    oqs()
        .args(["search", "", "--cats", "media", "--countries", "US", "--json", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ident--alice"))
        .stdout(predicate::str::contains("lemonde").not());
}

#[test]
fn fuzzy_flag_recovers_a_misspelling() {
    let dir = TempDir::new().unwrap();
    let corpus = seed_corpus(&dir);
    oqs()
        .arg("build")
        .arg(&corpus)
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .success();

    oqs()
        .args(["search", "alise", "--json", "--data-dir"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ident--alice").not());

    oqs()
        .args([
            "search", "alise", "--fuzzy", "--threshold", "70", "--json", "--data-dir",
        ])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("ident--alice"))
        .stdout(predicate::str::contains("fuzzy_score"));
}

#[test]
fn missing_index_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    oqs()
        .args(["stats", "--data-dir"])
        .arg(dir.path())
        .assert()
        .failure();
    oqs()
        .args(["search", "anything", "--data-dir"])
        .arg(dir.path())
        .assert()
        .failure();
}

#[test]
fn json_output_is_parseable() {
    let dir = TempDir::new().unwrap();
    let corpus = seed_corpus(&dir);
    oqs()
        .arg("build")
        .arg(&corpus)
        .arg("--data-dir")
        .arg(dir.path())
        .assert()
        .success();

    let output = oqs()
        .args(["search", "alice", "--json", "--data-dir"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let results = parsed.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["etype"], "ident");
    assert_eq!(results[0]["score"], 100.0);
}
