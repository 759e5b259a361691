use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn stage_scratch(td: &assert_fs::TempDir) {
    let scratch = td.child("_scratch");
    scratch.create_dir_all().unwrap();
    scratch.child("tool.sh").write_str("ABC").unwrap();
}

fn generate_args(extra: &[&str]) -> Vec<String> {
    let mut args: Vec<String> = [
        "generate",
        "v9.9.9",
        "--offline",
        "--db-id",
        "mrext/tool",
        "--label",
        "tool",
        "--zip-stem",
        "tool-mister_arm",
        "--file",
        "tool.sh",
        "--out",
        "tool.json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    args.extend(extra.iter().map(|s| s.to_string()));
    args
}

#[test]
fn generate_offline_writes_database() {
    let td = assert_fs::TempDir::new().unwrap();
    stage_scratch(&td);

    Command::cargo_bin("repodb")
        .unwrap()
        .current_dir(td.path())
        .args(generate_args(&["--schema", "v2"]))
        .assert()
        .success()
        .stderr(predicate::str::contains("Wrote 1 file entry(ies)"));

    let json = std::fs::read_to_string(td.path().join("tool.json")).unwrap();
    assert!(json.contains("\"db_id\": \"mrext/tool\""));
    assert!(json.contains("902fbdd2b1df0c4f70b4a5d23525e932"));
    assert!(json.contains("9.9.9"));
    assert!(!json.contains("null"));
    // Valid JSON all the way down.
    serde_json::from_str::<serde_json::Value>(&json).unwrap();
}

#[test]
fn generate_zip_wrapped_by_default() {
    let td = assert_fs::TempDir::new().unwrap();
    stage_scratch(&td);
    // The archive is only hashed during the build, so any staged bytes do.
    td.child("_scratch/tool-mister_arm-9.9.9.zip").write_binary(b"PK-payload").unwrap();

    Command::cargo_bin("repodb")
        .unwrap()
        .current_dir(td.path())
        .args(generate_args(&[]))
        .assert()
        .success();

    let json = std::fs::read_to_string(td.path().join("tool.json")).unwrap();
    assert!(json.contains("\"zips\""));
    assert!(json.contains("\"kind\": \"extract_single_files\""));
    assert!(json.contains("\"zip_path\": \"tool.sh\""));
    assert!(json.contains("\"files\": {}"));
}

#[test]
fn missing_release_file_leaves_no_output() {
    let td = assert_fs::TempDir::new().unwrap();
    td.child("_scratch").create_dir_all().unwrap();

    Command::cargo_bin("repodb")
        .unwrap()
        .current_dir(td.path())
        .args(generate_args(&["--schema", "v2"]))
        .assert()
        .failure()
        .stderr(predicate::str::contains("tool.sh"));

    assert!(!td.path().join("tool.json").exists());
}

#[test]
fn missing_tag_is_a_usage_error() {
    Command::cargo_bin("repodb")
        .unwrap()
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn verify_reports_ok_then_bad() {
    let td = assert_fs::TempDir::new().unwrap();
    stage_scratch(&td);

    Command::cargo_bin("repodb")
        .unwrap()
        .current_dir(td.path())
        .args(generate_args(&["--schema", "v2"]))
        .assert()
        .success();

    let root = td.child("install");
    root.child("Scripts/tool.sh").write_str("ABC").unwrap();

    Command::cargo_bin("repodb")
        .unwrap()
        .current_dir(td.path())
        .args(["verify", "tool.json", "install"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OK"));

    root.child("Scripts/tool.sh").write_str("tampered").unwrap();

    Command::cargo_bin("repodb")
        .unwrap()
        .current_dir(td.path())
        .args(["verify", "tool.json", "install"])
        .assert()
        .success()
        .stdout(predicate::str::contains("BAD"));
}
