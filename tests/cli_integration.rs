//! Integration tests for the treelock binary.
//!
//! Every command runs with `HOME` pointed at a temporary directory so no
//! user configuration leaks into the results.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const SAMPLE: &str = "\
7 2 5
World Asia Africa China India SouthAfrica Egypt
1 China 9
1 India 9
3 Asia 9
2 India 9
2 Asia 9
";

const SAMPLE_OUTPUT: &str = "true\ntrue\ntrue\nfalse\ntrue\n";

/// Get a command for running treelock in an isolated home.
fn treelock(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("treelock").unwrap();
    cmd.env("HOME", home)
        .env_remove("TREELOCK_CONFIG")
        .env_remove("XDG_CONFIG_HOME");
    cmd
}

fn write_sample(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("workload.txt");
    fs::write(&path, SAMPLE).unwrap();
    path
}

#[test]
fn version_flag_works() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("treelock"));
}

#[test]
fn run_from_file() {
    let home = TempDir::new().unwrap();
    let input = write_sample(home.path());

    treelock(home.path())
        .arg("run")
        .arg(&input)
        .assert()
        .success()
        .stdout(SAMPLE_OUTPUT);
}

#[test]
fn run_from_stdin() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .arg("run")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout(SAMPLE_OUTPUT);
}

#[test]
fn strategies_and_modes_agree() {
    let home = TempDir::new().unwrap();
    let input = write_sample(home.path());

    for args in [
        vec!["--strategy", "coarse"],
        vec!["--strategy", "fine", "--verify"],
        vec!["--parallel", "--workers", "1"],
    ] {
        treelock(home.path())
            .arg("run")
            .arg(&input)
            .args(&args)
            .assert()
            .success()
            .stdout(SAMPLE_OUTPUT);
    }
}

#[test]
fn parallel_run_matches_issue_order() {
    let home = TempDir::new().unwrap();
    let mut input = String::from("3 2 40\nr a b\n");
    for _ in 0..20 {
        input.push_str("1 a 7\n2 a 7\n");
    }
    let expected = "true\n".repeat(40);

    for _ in 0..5 {
        treelock(home.path())
            .args(["run", "--parallel", "--workers", "8"])
            .write_stdin(input.clone())
            .assert()
            .success()
            .stdout(expected.clone());
    }
}

#[test]
fn run_json_output() {
    let home = TempDir::new().unwrap();
    let input = write_sample(home.path());

    let assert = treelock(home.path())
        .args(["run", "--json"])
        .arg(&input)
        .assert()
        .success();

    let stdout = String::from_utf8(assert.get_output().stdout.clone()).unwrap();
    let outcomes: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(outcomes.as_array().unwrap().len(), 5);
    assert_eq!(outcomes[2]["kind"], "upgrade");
    assert_eq!(outcomes[2]["node"], 1);
    assert_eq!(outcomes[3]["granted"], false);
}

#[test]
fn debug_goes_to_stderr() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .args(["--debug", "run", "--verify"])
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout(SAMPLE_OUTPUT)
        .stderr(predicate::str::contains("[debug] strategy: fine"))
        .stderr(predicate::str::contains("verification passed"));
}

#[test]
fn invalid_input_fails_with_line_number() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .arg("run")
        .write_stdin("3 2 1\nr a b\n1 z 4\n")
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("line 3"))
        .stderr(predicate::str::contains("unknown node name 'z'"));
}

#[test]
fn oversized_node_count_fails_cleanly() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .arg("run")
        .write_stdin("1000000000000 2 0\nr\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "line 2: unexpected end of input, expected node name",
        ));
}

#[test]
fn unknown_opcode_fails() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .arg("check")
        .write_stdin("1 2 1\nr\n9 r 1\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown opcode 9"));
}

#[test]
fn missing_input_file_fails() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .args(["run", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input file"));
}

#[test]
fn zero_workers_rejected() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .args(["run", "--parallel", "--workers", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--workers"));
}

#[test]
fn check_prints_summary() {
    let home = TempDir::new().unwrap();
    let input = write_sample(home.path());

    treelock(home.path())
        .arg("check")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("nodes: 7"))
        .stdout(predicate::str::contains("lock 2, unlock 2, upgrade 1"));
}

#[test]
fn config_set_get_list_roundtrip() {
    let home = TempDir::new().unwrap();

    treelock(home.path())
        .args(["config", "get", "strategy"])
        .assert()
        .success()
        .stdout("fine\n");

    treelock(home.path())
        .args(["config", "set", "strategy", "coarse"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Set strategy = coarse"));

    assert!(home.path().join(".treelock/config.toml").exists());

    treelock(home.path())
        .args(["config", "get", "strategy"])
        .assert()
        .success()
        .stdout("coarse\n");

    treelock(home.path())
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("strategy = coarse\n"))
        .stdout(predicate::str::contains("verify = false (default)"));
}

#[test]
fn config_rejects_bad_values() {
    let home = TempDir::new().unwrap();

    treelock(home.path())
        .args(["config", "set", "threads", "4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));

    treelock(home.path())
        .args(["config", "set", "workers", "0"])
        .assert()
        .failure();

    assert!(!home.path().join(".treelock/config.toml").exists());
}

#[test]
fn explicit_config_file_is_used() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.toml");
    fs::write(&config, "output = \"json\"\n").unwrap();

    treelock(home.path())
        .arg("--config")
        .arg(&config)
        .arg("run")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("["));
}

#[test]
fn env_config_missing_file_warns() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .env("TREELOCK_CONFIG", home.path().join("absent.toml"))
        .arg("run")
        .write_stdin(SAMPLE)
        .assert()
        .success()
        .stdout(SAMPLE_OUTPUT)
        .stderr(predicate::str::contains("warning:"));
}

#[test]
fn completion_generates_script() {
    let home = TempDir::new().unwrap();
    treelock(home.path())
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("treelock"));
}
