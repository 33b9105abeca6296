use assert_cmd::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::process::Command;

fn bayou() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("bayou"))
}

fn write_single_program_model(dir: &std::path::Path) {
    let config = json!({
        "latent_size": 8,
        "batch_size": 1,
        "num_epochs": 1,
        "learning_rate": 0.001,
        "print_step": 1,
        "alpha": 1e-05,
        "beta": 1e-05,
        "evidence": [
            {"name": "apicalls", "units": 8, "tile": 1, "max_num": 4},
            {"name": "types", "units": 8, "tile": 1, "max_num": 4},
            {"name": "context", "units": 8, "tile": 1, "max_num": 4}
        ],
        "decoder": {"units": 16, "max_ast_depth": 8}
    });
    let corpus = json!({
        "programs": [{"ast": {
            "node": "DSubTree",
            "_nodes": [
                {"node": "DAPICall", "_call": "java.io.BufferedReader.readLine()"},
                {"node": "DAPICall", "_call": "java.io.BufferedReader.close()"}
            ]
        }}]
    });
    fs::write(dir.join("config.json"), config.to_string()).unwrap();
    fs::write(dir.join("corpus.json"), corpus.to_string()).unwrap();
}

#[test]
fn serve_refuses_non_loopback_without_public() {
    let dir = tempfile::tempdir().unwrap();
    bayou()
        .args(["serve", "--bind", "0.0.0.0:0", "--save-dir"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicates::str::contains("without --public"));
}

#[test]
fn infer_reports_missing_model_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    bayou()
        .args(["infer", "--save-dir"])
        .arg(dir.path())
        .arg(r#"{"apicalls": ["readLine"]}"#)
        .assert()
        .failure()
        .stderr(predicates::str::contains("config.json"));
}

#[test]
fn infer_rejects_invalid_evidence() {
    let dir = tempfile::tempdir().unwrap();
    write_single_program_model(dir.path());
    bayou()
        .args(["infer", "--save-dir"])
        .arg(dir.path())
        .arg("{apicalls")
        .assert()
        .failure()
        .stderr(predicates::str::contains("invalid evidence"));
}

#[test]
fn infer_prints_ranked_asts() {
    let dir = tempfile::tempdir().unwrap();
    write_single_program_model(dir.path());
    let output = bayou()
        .args(["--quiet", "infer", "--seed", "3", "--save-dir"])
        .arg(dir.path())
        .arg(r#"{"apicalls": ["readLine"], "types": ["BufferedReader"], "note": "kept"}"#)
        .output()
        .unwrap();
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let js: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(js["evidences"]["note"], json!("kept"));
    let asts = js["asts"].as_array().unwrap();
    assert_eq!(asts.len(), 1);
    assert_eq!(asts[0]["node"], json!("DSubTree"));
    assert_eq!(asts[0]["count"], json!(100));
}

#[test]
fn query_rejects_invalid_json_before_connecting() {
    bayou()
        .args(["query", "--addr", "127.0.0.1:9", "not json"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("evidence is not valid JSON"));
}

#[test]
fn extract_evidence_writes_corpus_with_evidence() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("DATA-driver.json");
    let output = dir.path().join("corpus.json");
    let driver = json!({
        "programs": [
            {
                "ast": {"node": "DSubTree", "_nodes": []},
                "sequences": [{"calls": ["java.io.File.exists()", "java.io.File.delete()"]}]
            },
            {
                "ast": {"node": "DSubTree", "_nodes": []},
                "sequences": [{"calls": ["a.B.c()"]}, {"calls": ["a.B.d()"]}]
            }
        ]
    });
    fs::write(&input, driver.to_string()).unwrap();

    bayou()
        .args(["--quiet", "extract-evidence", "--max-seqs", "1"])
        .arg(&input)
        .arg(&output)
        .assert()
        .success();

    let js: Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    let programs = js["programs"].as_array().unwrap();
    assert_eq!(programs.len(), 1);
    assert_eq!(programs[0]["apicalls"], json!(["delete", "exists"]));
    assert_eq!(programs[0]["types"], json!(["File"]));
    assert_eq!(programs[0]["context"], json!([]));
}

#[test]
fn extract_evidence_reports_unreadable_input() {
    let dir = tempfile::tempdir().unwrap();
    bayou()
        .arg("extract-evidence")
        .arg(dir.path().join("missing.json"))
        .arg(dir.path().join("out.json"))
        .assert()
        .failure()
        .stderr(predicates::str::contains("missing.json"));
}
