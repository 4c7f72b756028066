//! # Configuration Module / 配置模块
//!
//! Declarative test definitions (`config.toml` inside each case directory) and the
//! optional project-level `grader_config.toml`. Every recognized option is an explicit
//! field; absent options fall back to `None` or a documented default.
//!
//! 声明式测试定义（每个用例目录中的 `config.toml`）以及可选的项目级 `grader_config.toml`。
//! 每个可识别的选项都是显式字段；缺省选项回退为 `None` 或文档中的默认值。

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Name of the per-case definition file.
pub const CASE_CONFIG_FILE: &str = "config.toml";
/// Name of the optional project-level configuration file.
pub const GRADER_CONFIG_FILE: &str = "grader_config.toml";
/// Timeout applied to a step that does not declare one.
pub const DEFAULT_STEP_TIMEOUT: Duration = Duration::from_secs(5);
/// Timeout applied to special-judge programs unless configured otherwise.
pub const DEFAULT_JUDGE_TIMEOUT: Duration = Duration::from_secs(10);

/// Metadata block of a test case.
/// 测试用例的元数据块。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TestMeta {
    /// Human readable name shown in reports / 报告中显示的可读名称
    pub name: String,
    /// The declared point total of the test case / 测试用例声明的总分
    pub score: f64,
}

/// The set of conditions a step's outcome must satisfy.
/// When several conditions are present, all of them must hold.
///
/// 步骤结果必须满足的条件集合。存在多个条件时，必须全部满足。
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CheckSpec {
    /// Expected process exit code / 期望的进程退出码
    pub return_code: Option<i32>,
    /// Files that must exist after the step ran / 步骤运行后必须存在的文件
    #[serde(default)]
    pub files: Vec<String>,
    /// File holding the expected stdout / 保存期望标准输出的文件
    pub stdout: Option<String>,
    /// File holding the expected stderr / 保存期望标准错误的文件
    pub stderr: Option<String>,
    /// Collapse whitespace runs before comparing / 比较前合并空白字符
    #[serde(default)]
    pub ignore_whitespace: bool,
    /// Regex that must match somewhere in stdout / 必须在标准输出中匹配的正则
    pub stdout_pattern: Option<String>,
    /// Regex that must match somewhere in stderr / 必须在标准错误中匹配的正则
    pub stderr_pattern: Option<String>,
    /// External judge program delegated the verdict / 负责给出判定的外部评测程序
    pub special_judge: Option<String>,
}

impl CheckSpec {
    /// Returns `true` if no condition is declared at all.
    pub fn is_empty(&self) -> bool {
        self == &CheckSpec::default()
    }
}

/// One subprocess invocation together with its verification and weight.
/// 一次子进程调用及其校验规则和分值。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Step {
    /// Program to run; may contain path placeholders.
    pub command: String,
    /// Arguments; numbers and booleans in TOML are accepted and stringified.
    #[serde(default, deserialize_with = "deserialize_args")]
    pub args: Vec<String>,
    /// File inside the test directory fed to the process's stdin.
    #[serde(default)]
    pub stdin: Option<String>,
    /// Wall-clock limit in seconds.
    #[serde(default)]
    pub timeout: Option<f64>,
    /// Point value of this step. Declaring it on any step switches the test to per-step scoring.
    #[serde(default)]
    pub score: Option<f64>,
    /// A failing required step aborts the remaining steps.
    #[serde(default = "default_must_pass")]
    pub must_pass: bool,
    /// Display name, defaults to the command.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub check: Option<CheckSpec>,
}

fn default_must_pass() -> bool {
    true
}

impl Step {
    /// Creates a required step without checks, timeout or score.
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            stdin: None,
            timeout: None,
            score: None,
            must_pass: true,
            name: None,
            check: None,
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.command)
    }

    /// The step's wall-clock limit; validation guarantees a declared value converts.
    pub fn timeout(&self) -> Duration {
        self.timeout
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_STEP_TIMEOUT)
    }

    /// The declared point value, zero when none is declared.
    pub fn max_score(&self) -> f64 {
        self.score.unwrap_or(0.0)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ArgValue {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<ArgValue> for String {
    fn from(value: ArgValue) -> Self {
        match value {
            ArgValue::Str(s) => s,
            ArgValue::Int(i) => i.to_string(),
            ArgValue::Float(f) => f.to_string(),
            ArgValue::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(ArgValue),
    Many(Vec<ArgValue>),
}

fn deserialize_args<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value.into()],
        OneOrMany::Many(values) => values.into_iter().map(String::from).collect(),
    })
}

/// On-disk shape of a case's `config.toml`.
#[derive(Debug, Deserialize)]
struct CaseDocument {
    meta: TestMeta,
    run: Vec<Step>,
}

/// A single gradeable unit: an ordered list of steps and a declared point total.
/// 单个评分单元：有序的步骤列表以及声明的总分。
#[derive(Debug, Clone, PartialEq)]
pub struct TestCase {
    /// Directory name, used for selection / 目录名，用于选择用例
    pub id: String,
    /// Absolute path of the case directory / 用例目录的绝对路径
    pub path: PathBuf,
    pub meta: TestMeta,
    /// Steps in execution order / 按执行顺序排列的步骤
    pub steps: Vec<Step>,
}

impl TestCase {
    /// Parses a case definition from TOML text and validates it.
    pub fn from_toml(id: impl Into<String>, path: impl Into<PathBuf>, content: &str) -> Result<Self> {
        let document: CaseDocument = toml::from_str(content)?;
        let case = Self {
            id: id.into(),
            path: path.into(),
            meta: document.meta,
            steps: document.run,
        };
        case.validate()?;
        Ok(case)
    }

    /// Whether any step declares a point value.
    pub fn uses_step_scores(&self) -> bool {
        self.steps.iter().any(|step| step.score.is_some())
    }

    /// Points available for this case: the sum of the declared step scores in
    /// per-step mode, the declared total otherwise.
    ///
    /// 用例可获得的分数：分步计分时为各步骤声明分数之和，否则为声明的总分。
    pub fn max_score(&self) -> f64 {
        if self.uses_step_scores() {
            self.steps.iter().map(Step::max_score).sum()
        } else {
            self.meta.score
        }
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<()> {
        if !self.meta.score.is_finite() || self.meta.score <= 0.0 {
            bail!("'meta.score' must be a positive number, got {}", self.meta.score);
        }
        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            if let Some(score) = step.score {
                if !score.is_finite() || score < 0.0 {
                    bail!("step {index} '{}': 'score' must not be negative", step.display_name());
                }
            }
            if let Some(timeout) = step.timeout {
                if !Duration::try_from_secs_f64(timeout).is_ok_and(|limit| !limit.is_zero()) {
                    bail!(
                        "step {index} '{}': 'timeout' must be a positive number of seconds, got {timeout}",
                        step.display_name()
                    );
                }
            }
            if let Some(check) = &step.check {
                for pattern in [&check.stdout_pattern, &check.stderr_pattern].into_iter().flatten() {
                    regex::Regex::new(pattern).with_context(|| {
                        format!("step {index} '{}': invalid pattern '{pattern}'", step.display_name())
                    })?;
                }
            }
        }

        if self.steps.is_empty() {
            warn!(case = %self.id, "test case declares no steps");
        }
        if self.uses_step_scores() {
            let declared = self.max_score();
            if declared <= 0.0 {
                bail!("step scores must add up to a positive total, got {declared}");
            }
            if (declared - self.meta.score).abs() > f64::EPSILON {
                warn!(
                    case = %self.id,
                    step_total = declared,
                    total = self.meta.score,
                    "step scores do not add up to the declared total"
                );
            }
        }
        Ok(())
    }
}

/// Loads and validates the test case stored in `dir`.
pub fn load_test_case(dir: &Path) -> Result<TestCase> {
    let id = dir
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let config_path = dir.join(CASE_CONFIG_FILE);
    let content = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    TestCase::from_toml(&id, dir, &content)
        .with_context(|| format!("Failed to load test '{id}'"))
}

/// Directory layout, relative to the project root.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PathsConfig {
    #[serde(default = "default_tests_dir")]
    pub tests_dir: String,
    #[serde(default = "default_cases_dir")]
    pub cases_dir: String,
    #[serde(default = "default_common_dir")]
    pub common_dir: String,
}

fn default_tests_dir() -> String {
    "tests".to_string()
}

fn default_cases_dir() -> String {
    "tests/cases".to_string()
}

fn default_common_dir() -> String {
    "tests/common".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tests_dir: default_tests_dir(),
            cases_dir: default_cases_dir(),
            common_dir: default_common_dir(),
        }
    }
}

/// How special-judge programs are launched.
/// 特殊评测程序的启动方式。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct JudgeConfig {
    /// Interpreter for `.py` judges
    #[serde(default = "default_python")]
    pub python: String,
    /// Interpreter for `.sh` judges
    #[serde(default = "default_shell")]
    pub shell: String,
    /// Wall-clock limit for one judge invocation, in seconds
    #[serde(default)]
    pub timeout: Option<f64>,
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_shell() -> String {
    "sh".to_string()
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            shell: default_shell(),
            timeout: None,
        }
    }
}

impl JudgeConfig {
    pub fn timeout(&self) -> Duration {
        self.timeout
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_JUDGE_TIMEOUT)
    }
}

/// Kind of a setup step. Only plain commands are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupStepKind {
    Command,
}

/// A command run once at the project root before any test case.
/// 在任何测试用例之前于项目根目录运行一次的命令。
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SetupStep {
    #[serde(rename = "type")]
    pub kind: SetupStepKind,
    pub command: String,
    #[serde(default, deserialize_with = "deserialize_args")]
    pub args: Vec<String>,
    #[serde(default)]
    pub timeout: Option<f64>,
    /// Printed before the command runs
    #[serde(default)]
    pub message: Option<String>,
    /// Printed after the command succeeded
    #[serde(default)]
    pub success_message: Option<String>,
}

impl SetupStep {
    pub fn timeout(&self) -> Duration {
        self.timeout
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(DEFAULT_STEP_TIMEOUT)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct SetupConfig {
    #[serde(default)]
    pub steps: Vec<SetupStep>,
}

/// Contents of `grader_config.toml`. Every section is optional.
/// `grader_config.toml` 的内容。所有部分均为可选。
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct GraderConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub setup: SetupConfig,
    /// Named lists of test IDs / 命名的测试 ID 列表
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
}

/// A project root together with its grader configuration.
/// 项目根目录及其评分配置。
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config: GraderConfig,
}

impl Project {
    /// Resolves `root` to an absolute path and reads `grader_config.toml` if present.
    pub fn load(root: &Path) -> Result<Self> {
        let root = fs::canonicalize(root)
            .with_context(|| format!("Project directory not found: {}", root.display()))?;
        let config_path = root.join(GRADER_CONFIG_FILE);
        let config = if config_path.is_file() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            GraderConfig::default()
        };
        Ok(Self { root, config })
    }

    pub fn cases_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.cases_dir)
    }

    pub fn common_dir(&self) -> PathBuf {
        self.root.join(&self.config.paths.common_dir)
    }
}
