//! # CLI Integration Tests / CLI 集成测试
//!
//! These tests run the `autograder` binary against throwaway projects and check
//! its output, exit codes and the files it writes.
//!
//! 这些测试针对临时项目运行 `autograder` 可执行文件，并检查其输出、退出码和写入的文件。

#![cfg(unix)]

mod common;

use assert_cmd::prelude::*;
use common::{ProjectFixture, failing_case, passing_case};
use predicates::prelude::*;
use std::fs;
use std::process::Command;

fn autograder(fixture: &ProjectFixture) -> Command {
    let mut cmd = Command::cargo_bin("autograder").unwrap();
    cmd.arg("--lang")
        .arg("en")
        .env("NO_COLOR", "1")
        .current_dir(fixture.root());
    cmd
}

/// Runs every case of a project where one case passes and one fails.
/// The run succeeds because some points were earned.
///
/// 运行一个包含一个通过用例和一个失败用例的项目。
/// 由于获得了部分分数，本次运行成功。
#[test]
fn test_mixed_run_succeeds_with_partial_score() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));
    fixture.add_case("2_fail", &failing_case("Failing", 10));

    autograder(&fixture)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Running 2 test cases"))
        .stdout(predicate::str::contains("Expected return code 0, got 3"))
        .stdout(predicate::str::contains("Total Score: 10.0/20.0 (50.0%)"));
}

/// A run that earns nothing exits with a failure code.
/// 未获得任何分数的运行以失败码退出。
#[test]
fn test_zero_score_run_fails() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_fail", &failing_case("Failing", 10));

    autograder(&fixture)
        .arg("run")
        .assert()
        .failure()
        .stdout(predicate::str::contains("Total Score: 0.0/10.0 (0.0%)"));
}

/// JSON output is a single machine-readable document on stdout.
/// JSON 输出是标准输出上的单个机器可读文档。
#[test]
fn test_json_output() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));
    fixture.add_case("2_fail", &failing_case("Failing", 5));

    let output = autograder(&fixture).args(["run", "--json"]).output().unwrap();
    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["total_score"], 10.0);
    assert_eq!(report["max_score"], 15.0);
    assert_eq!(report["percentage"], 66.7);
    assert_eq!(report["tests"][0]["name"], "Passing");
    assert_eq!(report["tests"][0]["status"], "PASS");
    assert_eq!(report["tests"][1]["status"], "FAIL");
    assert_eq!(report["tests"][1]["error_details"]["return_code"], 3);
}

/// `--write-result` stores the percentage in `.autograder_result`.
#[test]
fn test_write_result_file() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));

    autograder(&fixture).args(["run", "--write-result"]).assert().success();
    let content = fs::read_to_string(fixture.root().join(".autograder_result")).unwrap();
    assert_eq!(content, "100.00");
}

/// A single case can be selected by name prefix or numeric prefix.
/// 可以通过名称前缀或数字前缀选择单个用例。
#[test]
fn test_single_case_selection() {
    let fixture = ProjectFixture::new();
    fixture.add_case("3_arrays", &passing_case("Arrays", 10));
    fixture.add_case("30_x", &failing_case("X", 10));

    autograder(&fixture)
        .args(["run", "--prefix", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Running 1 test cases"))
        .stdout(predicate::str::contains("Total Score: 10.0/10.0 (100.0%)"));
}

/// An ambiguous query lists every candidate and runs nothing.
/// 模糊的查询会列出所有候选项且不运行任何用例。
#[test]
fn test_ambiguous_selection_aborts() {
    let fixture = ProjectFixture::new();
    fixture.add_case("3_a", &passing_case("First", 10));
    fixture.add_case("3_b", &passing_case("Second", 10));

    autograder(&fixture)
        .args(["run", "--prefix", "03"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Multiple test cases have prefix number '03'"))
        .stdout(predicate::str::contains("3_a: First"))
        .stdout(predicate::str::contains("3_b: Second"))
        .stdout(predicate::str::contains("Total Score").not());
}

/// Discovery errors go to stderr in JSON mode so stdout stays parseable.
#[test]
fn test_discovery_error_in_json_mode() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));

    autograder(&fixture)
        .args(["run", "--json", "missing"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No test cases starting with 'missing' found"));
}

#[test]
fn test_unknown_group() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));

    autograder(&fixture)
        .args(["run", "--group", "advanced"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Group 'advanced' not found in config"));
}

#[test]
fn test_group_run() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("One", 10));
    fixture.add_case("2_pass", &passing_case("Two", 10));
    fixture.add_case("3_fail", &failing_case("Three", 10));
    fixture.write_grader_config("[groups]\nbasic = [\"1\", \"2\"]\n");

    autograder(&fixture)
        .args(["run", "--group", "basic"])
        .assert()
        .success()
        .stdout(predicate::str::contains("in group 'basic'"))
        .stdout(predicate::str::contains("Total Score: 20.0/20.0 (100.0%)"));
}

/// Setup steps run before discovery; a failing one aborts the invocation.
/// 准备步骤在发现之前运行；失败的准备步骤会中止本次调用。
#[test]
fn test_setup_steps() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));
    fixture.write_grader_config(
        r#"
[setup]
steps = [
  { type = "command", command = "sh", args = ["-c", "touch prepared"], message = "Preparing...", success_message = "Prepared" },
]
"#,
    );

    autograder(&fixture)
        .arg("run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Preparing..."))
        .stdout(predicate::str::contains("Prepared"));
    assert!(fixture.root().join("prepared").exists());

    fixture.write_grader_config(
        "[setup]\nsteps = [{ type = \"command\", command = \"sh\", args = [\"-c\", \"exit 2\"] }]\n",
    );
    autograder(&fixture)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed with return code 2"))
        .stdout(predicate::str::contains("Running").not());
}

/// An invalid case configuration aborts before anything runs.
#[test]
fn test_invalid_config_aborts() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_bad", "[meta]\nname = \"Bad\"\nscore = 0\n[[run]]\ncommand = \"true\"\n");

    autograder(&fixture)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load test '1_bad'"));
}

#[test]
fn test_html_report() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));
    fixture.add_case("2_fail", &failing_case("Failing", 10));
    let report_path = fixture.root().join("report.html");

    autograder(&fixture)
        .args(["run", "--html"])
        .arg(&report_path)
        .assert()
        .success();

    let html = fs::read_to_string(&report_path).unwrap();
    assert!(html.starts_with("<!DOCTYPE html>"));
    assert!(html.contains("Grading Results"));
    assert!(html.contains("Passing"));
    assert!(html.contains("Expected return code 0, got 3"));
}

#[test]
fn test_list_command() {
    let fixture = ProjectFixture::new();
    fixture.add_case("10_last", &passing_case("Last", 5));
    fixture.add_case("2_first", &passing_case("First", 5));
    fixture.write_grader_config("[groups]\nquick = [\"2\"]\n");

    let output = autograder(&fixture).arg("list").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let first = stdout.find("2_first").unwrap();
    let last = stdout.find("10_last").unwrap();
    assert!(first < last);
    assert!(stdout.contains("quick"));
}

#[test]
fn test_project_dir_option() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));

    Command::cargo_bin("autograder")
        .unwrap()
        .env("NO_COLOR", "1")
        .args(["--lang", "en", "run", "--project-dir"])
        .arg(fixture.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("Total Score: 10.0/10.0 (100.0%)"));
}

#[test]
fn test_chinese_output() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_pass", &passing_case("Passing", 10));

    Command::cargo_bin("autograder")
        .unwrap()
        .args(["--lang", "zh-CN", "run"])
        .current_dir(fixture.root())
        .assert()
        .success()
        .stdout(predicate::str::contains("总分"));
}
