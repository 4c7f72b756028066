//! # Execution Engine Integration Tests / 执行引擎集成测试
//!
//! End-to-end tests that run real processes through the step sequencer:
//! scoring modes, early abort, timeouts, optional steps, build directory
//! side effects and idempotence.
//!
//! 通过步骤序列器运行真实进程的端到端测试：
//! 计分模式、提前中止、超时、可选步骤、构建目录副作用和幂等性。

#![cfg(unix)]

mod common;

use autograder::execution::{ExecutionObserver, Silent, run_test_case};
use autograder::config::{Step, TestCase};
use autograder::models::{CaseState, StepScore, TestResult, TestStatus};
use common::ProjectFixture;

async fn run(fixture: &ProjectFixture, id: &str) -> TestResult {
    let project = fixture.project();
    let case = fixture.load_case(id);
    run_test_case(&case, &project, &mut Silent).await
}

#[tokio::test]
async fn test_single_passing_step_earns_full_score() {
    let fixture = ProjectFixture::new();
    fixture.add_case("1_exit", &common::passing_case("Exit code", 10));

    let result = run(&fixture, "1_exit").await;
    assert!(result.success);
    assert_eq!(result.status, TestStatus::Pass);
    assert_eq!(result.score, 10.0);
    assert_eq!(result.max_score, 10.0);
    assert_eq!(result.step_scores, None);
    assert_eq!(result.error_details, None);
    assert_eq!(result.message, "All steps completed");
}

#[tokio::test]
async fn test_required_failure_after_partial_success_scores_zero() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "2_abort",
        r#"
[meta]
name = "Abort"
score = 10

[[run]]
name = "first"
command = "sh"
args = ["-c", "echo one"]
score = 5

[[run]]
name = "second"
command = "sh"
args = ["-c", "echo two; echo oops >&2; exit 4"]
score = 5
[run.check]
return_code = 0

[[run]]
name = "third"
command = "sh"
args = ["-c", "touch ${build_dir}/third_ran"]
"#,
    );

    let result = run(&fixture, "2_abort").await;
    assert!(!result.success);
    assert_eq!(result.status, TestStatus::Fail);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.max_score, 10.0);
    assert_eq!(result.step_scores, None);
    assert_eq!(result.message, "Step 2 'second' failed: Expected return code 0, got 4");

    let details = result.error_details.expect("error details");
    assert_eq!(details.step, 2);
    assert_eq!(details.step_name, "second");
    assert_eq!(details.return_code, Some(4));
    assert_eq!(details.stdout.as_deref(), Some("two\n"));
    assert_eq!(details.stderr.as_deref(), Some("oops\n"));
    assert!(details.command.unwrap().starts_with("sh -c"));

    // Nothing after the failing required step runs.
    assert!(!fixture.case_dir("2_abort").join("build/third_ran").exists());
}

#[tokio::test]
async fn test_optional_failure_continues_and_scores_partially() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "3_optional",
        r#"
[meta]
name = "Optional"
score = 10

[[run]]
name = "bonus"
command = "sh"
args = ["-c", "exit 1"]
score = 4
must_pass = false
[run.check]
return_code = 0

[[run]]
name = "unscored"
command = "true"

[[run]]
name = "main"
command = "sh"
args = ["-c", "echo ok"]
score = 6
[run.check]
stdout_pattern = "^ok$"
"#,
    );

    let result = run(&fixture, "3_optional").await;
    assert!(result.success);
    assert_eq!(result.status, TestStatus::Partial);
    assert_eq!(result.score, 6.0);
    assert_eq!(
        result.step_scores,
        Some(vec![StepScore::new("bonus", 0.0, 4.0), StepScore::new("main", 6.0, 6.0)])
    );
}

#[tokio::test]
async fn test_over_reporting_steps_are_capped_at_total() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "4_cap",
        r#"
[meta]
name = "Cap"
score = 10

[[run]]
command = "true"
score = 8

[[run]]
command = "true"
score = 8
"#,
    );

    let result = run(&fixture, "4_cap").await;
    // Earned points stop at the declared total, the maximum is what the steps offer.
    assert_eq!(result.score, 10.0);
    assert_eq!(result.max_score, 16.0);
    assert_eq!(result.status, TestStatus::Partial);
    assert_eq!(result.step_scores.map(|s| s.len()), Some(2));
}

#[tokio::test]
async fn test_step_scores_below_declared_total_can_pass() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "4_short",
        r#"
[meta]
name = "Short"
score = 10

[[run]]
command = "true"
score = 3

[[run]]
command = "true"
score = 3
"#,
    );

    let result = run(&fixture, "4_short").await;
    assert_eq!(result.score, 6.0);
    assert_eq!(result.max_score, 6.0);
    assert_eq!(result.status, TestStatus::Pass);
    assert!(result.success);
}

#[tokio::test]
async fn test_dollar_arguments_reach_the_process_unchanged() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "4_dollar",
        r#"
[meta]
name = "Dollar"
score = 1

[[run]]
command = "sh"
args = ["-c", "test_dir=plain; printf '%s|%s\n' \"$test_dir\" \"$1\"", "sh", "a$$b"]
[run.check]
stdout = "expected.txt"
"#,
    );
    fixture.write_case_file("4_dollar", "expected.txt", "plain|a$$b\n");

    let result = run(&fixture, "4_dollar").await;
    assert_eq!(result.status, TestStatus::Pass, "{}", result.message);
}

#[tokio::test]
async fn test_judge_score_replaces_declared_step_score() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "5_judge",
        r#"
[meta]
name = "Judge"
score = 5

[[run]]
name = "judged"
command = "sh"
args = ["-c", "echo 1 2 3"]
score = 5
[run.check]
special_judge = "judge.sh"
"#,
    );
    fixture.write_case_file("5_judge", "judge.sh", "cat > /dev/null\necho '{\"success\": true, \"score\": 3}'\n");

    let result = run(&fixture, "5_judge").await;
    assert_eq!(result.status, TestStatus::Partial);
    assert_eq!(result.score, 3.0);
    assert_eq!(result.step_scores, Some(vec![StepScore::new("judged", 3.0, 5.0)]));
}

#[tokio::test]
async fn test_timeout_fails_even_when_optional() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "6_timeout",
        r#"
[meta]
name = "Timeout"
score = 10

[[run]]
name = "slow"
command = "sleep"
args = ["5"]
timeout = 0.5
must_pass = false
score = 5

[[run]]
command = "true"
score = 5
"#,
    );

    let start = std::time::Instant::now();
    let result = run(&fixture, "6_timeout").await;
    assert!(start.elapsed() < std::time::Duration::from_secs(4));
    assert_eq!(result.status, TestStatus::Fail);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.message, "Step 1 'slow' timed out after 0.5s");
    assert_eq!(result.error_details.map(|d| d.step), Some(1));
}

#[tokio::test]
async fn test_later_steps_see_earlier_build_dir_side_effects() {
    let fixture = ProjectFixture::new();
    let producer = r#"
[[run]]
command = "sh"
args = ["-c", "echo built > ${build_dir}/artifact"]
"#;
    let consumer = r#"
[[run]]
command = "cat"
args = ["${build_dir}/artifact"]
[run.check]
return_code = 0
files = ["${build_dir}/artifact"]
"#;
    let header = "[meta]\nname = \"Order\"\nscore = 2\n";
    fixture.add_case("7_ordered", &format!("{header}{producer}{consumer}"));
    fixture.add_case("8_reversed", &format!("{header}{consumer}{producer}"));

    let ordered = run(&fixture, "7_ordered").await;
    assert_eq!(ordered.status, TestStatus::Pass);

    let reversed = run(&fixture, "8_reversed").await;
    assert_eq!(reversed.status, TestStatus::Fail);
}

#[tokio::test]
async fn test_repeated_runs_are_identical() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "9_repeat",
        r#"
[meta]
name = "Repeat"
score = 4

[[run]]
command = "sh"
args = ["-c", "echo run >> ${build_dir}/log"]
score = 2

[[run]]
command = "cat"
args = ["${build_dir}/log"]
score = 2
[run.check]
stdout = "expected.txt"
"#,
    );
    fixture.write_case_file("9_repeat", "expected.txt", "run\n");

    let first = run(&fixture, "9_repeat").await;
    let second = run(&fixture, "9_repeat").await;
    assert_eq!(first.status, TestStatus::Pass);
    assert_eq!(
        (first.status, first.score, &first.message, &first.step_scores, &first.error_details),
        (second.status, second.score, &second.message, &second.step_scores, &second.error_details)
    );
}

#[tokio::test]
async fn test_stdin_is_fed_from_file() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "10_stdin",
        r#"
[meta]
name = "Stdin"
score = 1

[[run]]
command = "tr"
args = ["a-z", "A-Z"]
stdin = "input.txt"
[run.check]
stdout = "expected.txt"
"#,
    );
    fixture.write_case_file("10_stdin", "input.txt", "hello\n");
    fixture.write_case_file("10_stdin", "expected.txt", "HELLO\n");

    let result = run(&fixture, "10_stdin").await;
    assert_eq!(result.status, TestStatus::Pass, "{}", result.message);
}

#[tokio::test]
async fn test_missing_stdin_file_is_an_execution_error() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "11_nostdin",
        r#"
[meta]
name = "No stdin"
score = 1

[[run]]
command = "cat"
stdin = "absent.txt"
"#,
    );

    let result = run(&fixture, "11_nostdin").await;
    assert_eq!(result.status, TestStatus::Fail);
    let details = result.error_details.expect("error details");
    assert_eq!(details.error_message, "Input file absent.txt not found");
}

#[tokio::test]
async fn test_unknown_command_is_an_execution_error() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "12_nocmd",
        r#"
[meta]
name = "No command"
score = 3

[[run]]
name = "ghost"
command = "this_command_definitely_does_not_exist_12345"
must_pass = false
"#,
    );

    let result = run(&fixture, "12_nocmd").await;
    assert_eq!(result.status, TestStatus::Fail);
    assert_eq!(result.score, 0.0);
    let details = result.error_details.expect("error details");
    assert_eq!(details.step_name, "ghost");
    assert!(details.error_message.contains("Failed to execute"));
}

#[tokio::test]
async fn test_relative_program_runs_from_test_dir() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "13_script",
        r#"
[meta]
name = "Script"
score = 1

[[run]]
command = "sh"
args = ["-c", "printf '#!/bin/sh\necho from script\n' > ${build_dir}/run.sh && chmod +x ${build_dir}/run.sh"]

[[run]]
command = "./build/run.sh"
[run.check]
stdout_pattern = "^from script$"
"#,
    );

    let result = run(&fixture, "13_script").await;
    assert_eq!(result.status, TestStatus::Pass, "{}", result.message);
}

#[derive(Default)]
struct Recorder {
    states: Vec<CaseState>,
    results: usize,
}

impl ExecutionObserver for Recorder {
    fn on_state(&mut self, _case: &TestCase, state: CaseState, _step: Option<&Step>) {
        self.states.push(state);
    }

    fn on_result(&mut self, _case: &TestCase, _result: &TestResult) {
        self.results += 1;
    }
}

#[tokio::test]
async fn test_observer_sees_state_transitions() {
    let fixture = ProjectFixture::new();
    fixture.add_case(
        "14_states",
        r#"
[meta]
name = "States"
score = 2

[[run]]
command = "true"

[[run]]
command = "false"
[run.check]
return_code = 0
"#,
    );
    let project = fixture.project();
    let case = fixture.load_case("14_states");
    let mut recorder = Recorder::default();

    let result = run_test_case(&case, &project, &mut recorder).await;
    assert_eq!(result.status, TestStatus::Fail);
    assert_eq!(
        recorder.states,
        [
            CaseState::NotStarted,
            CaseState::Running(1),
            CaseState::Running(2),
            CaseState::Failed
        ]
    );
    assert_eq!(recorder.results, 1);
}
