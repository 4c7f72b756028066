//! # Test Discovery and Planning Module / 测试发现与计划模块
//!
//! This module finds the test cases of a project, orders them deterministically,
//! and narrows them down to the ones requested on the command line: every case,
//! a single case selected by name prefix or numeric prefix, or a named group.
//!
//! 此模块查找项目中的测试用例，以确定的顺序排列它们，
//! 并根据命令行请求进行筛选：全部用例、按名称前缀或数字前缀选择的单个用例，或命名分组。

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::engine::config::{CASE_CONFIG_FILE, Project, TestCase, load_test_case};
use crate::infra::fs;

static NUMERIC_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([0-9]+)").expect("numeric prefix pattern is valid"));

/// A case directory that matched a query, shown when the query is ambiguous.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub id: String,
    pub name: String,
}

/// Reasons discovery can refuse to produce a plan. None of them runs any test.
/// 发现阶段拒绝生成计划的原因。出现任何一种时都不会运行测试。
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Cases directory not found: {}", .0.display())]
    MissingCasesDir(PathBuf),

    #[error("No test cases found in {}", .0.display())]
    NoCases(PathBuf),

    #[error("No test cases match '{query}'")]
    NotFound { query: String, numeric: bool },

    #[error("Multiple test cases match '{query}'")]
    Ambiguous {
        query: String,
        numeric: bool,
        candidates: Vec<Candidate>,
    },

    #[error("Group '{0}' not found in config")]
    UnknownGroup(String),

    #[error("No test cases found in group '{0}'")]
    EmptyGroup(String),
}

/// A subdirectory of the cases directory holding a `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseDir {
    pub id: String,
    pub path: PathBuf,
}

/// Sort key placing numbered directories first, ascending by numeric value.
///
/// Numbers are compared by length and then digit by digit after stripping leading
/// zeros, so arbitrarily long prefixes order correctly.
///
/// 将带数字前缀的目录排在前面，并按数值升序排列的排序键。
pub fn case_sort_key(name: &str) -> (u8, usize, String, String) {
    match numeric_prefix(name) {
        Some(digits) => {
            let value = trim_zeros(digits);
            (0, value.len(), value.to_string(), name.to_string())
        }
        None => (1, 0, String::new(), name.to_string()),
    }
}

fn compare_cases(a: &CaseDir, b: &CaseDir) -> Ordering {
    case_sort_key(&a.id).cmp(&case_sort_key(&b.id))
}

fn numeric_prefix(name: &str) -> Option<&str> {
    NUMERIC_PREFIX
        .captures(name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn trim_zeros(digits: &str) -> &str {
    digits.trim_start_matches('0')
}

/// Lists the case directories under `cases_dir` in execution order.
///
/// # Errors
/// [`DiscoveryError::MissingCasesDir`] when `cases_dir` is not a directory.
pub fn discover_cases(cases_dir: &Path) -> Result<Vec<CaseDir>> {
    if !fs::is_directory(cases_dir) {
        return Err(DiscoveryError::MissingCasesDir(cases_dir.to_path_buf()).into());
    }

    let mut cases: Vec<CaseDir> = fs::subdirectories(cases_dir)?
        .into_iter()
        .filter(|dir| dir.join(CASE_CONFIG_FILE).is_file())
        .map(|path| CaseDir {
            id: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path,
        })
        .collect();
    cases.sort_by(compare_cases);
    debug!(count = cases.len(), dir = %cases_dir.display(), "discovered test cases");
    Ok(cases)
}

/// Returns `true` when `query` is compared by numeric prefix.
pub fn is_numeric_query(query: &str, numeric: bool) -> bool {
    numeric && !query.is_empty() && query.bytes().all(|b| b.is_ascii_digit())
}

/// Returns every case matching `query`.
///
/// In numeric mode only the leading digit run of each directory name is compared,
/// by value. Otherwise the query is a case-insensitive name prefix.
///
/// 返回所有匹配 `query` 的用例。数字模式下只按数值比较目录名开头的数字；
/// 否则查询被视为不区分大小写的名称前缀。
pub fn matching_cases<'a>(cases: &'a [CaseDir], query: &str, numeric: bool) -> Vec<&'a CaseDir> {
    if is_numeric_query(query, numeric) {
        let wanted = trim_zeros(query);
        cases
            .iter()
            .filter(|case| numeric_prefix(&case.id).is_some_and(|digits| trim_zeros(digits) == wanted))
            .collect()
    } else {
        let wanted = query.to_lowercase();
        cases
            .iter()
            .filter(|case| case.id.to_lowercase().starts_with(&wanted))
            .collect()
    }
}

/// Picks the single case matching `query`.
///
/// # Errors
/// [`DiscoveryError::NotFound`] or [`DiscoveryError::Ambiguous`].
pub fn select_case<'a>(cases: &'a [CaseDir], query: &str, numeric: bool) -> Result<&'a CaseDir, DiscoveryError> {
    let numeric = is_numeric_query(query, numeric);
    let matches = matching_cases(cases, query, numeric);
    match matches.as_slice() {
        [] => Err(DiscoveryError::NotFound {
            query: query.to_string(),
            numeric,
        }),
        [single] => Ok(*single),
        many => Err(DiscoveryError::Ambiguous {
            query: query.to_string(),
            numeric,
            candidates: many.iter().copied().map(candidate).collect(),
        }),
    }
}

fn candidate(case: &CaseDir) -> Candidate {
    // A broken config must not hide the ambiguity itself.
    let name = load_test_case(&case.path)
        .map(|loaded| loaded.meta.name)
        .unwrap_or_default();
    Candidate {
        id: case.id.clone(),
        name,
    }
}

/// Which cases the user asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    All,
    Single { query: String, numeric: bool },
    Group(String),
}

impl Selection {
    pub fn from_args(test: Option<&str>, numeric: bool, group: Option<&str>) -> Self {
        match (group, test) {
            (Some(group), _) => Selection::Group(group.to_string()),
            (None, Some(query)) => Selection::Single {
                query: query.to_string(),
                numeric,
            },
            (None, None) => Selection::All,
        }
    }
}

/// The test cases to run, in order.
/// 要按顺序运行的测试用例。
#[derive(Debug)]
pub struct ExecutionPlan {
    pub cases: Vec<TestCase>,
    /// The group the cases were selected from, if any.
    pub group: Option<String>,
}

impl ExecutionPlan {
    /// Sum of the maximum scores of every planned case.
    pub fn max_score(&self) -> f64 {
        self.cases.iter().map(TestCase::max_score).sum()
    }
}

/// Creates the execution plan for `selection`.
///
/// Every selected case is loaded and validated before returning, so configuration
/// errors abort the invocation before any step runs.
///
/// 为 `selection` 创建执行计划。返回前会加载并校验每个选中的用例，
/// 因此配置错误会在任何步骤运行之前中止本次调用。
///
/// # Arguments
/// * `project` - The project whose cases directory is searched
/// * `selection` - The requested cases
///
/// # Returns
/// An `ExecutionPlan`, or an error downcastable to [`DiscoveryError`]
pub fn plan_execution(project: &Project, selection: &Selection) -> Result<ExecutionPlan> {
    let cases_dir = project.cases_dir();
    let discovered = discover_cases(&cases_dir)?;

    let (selected, group): (Vec<&CaseDir>, Option<String>) = match selection {
        Selection::All => {
            if discovered.is_empty() {
                return Err(DiscoveryError::NoCases(cases_dir).into());
            }
            (discovered.iter().collect(), None)
        }
        Selection::Single { query, numeric } => {
            (vec![select_case(&discovered, query, *numeric)?], None)
        }
        Selection::Group(name) => {
            let ids = project
                .config
                .groups
                .get(name)
                .ok_or_else(|| DiscoveryError::UnknownGroup(name.clone()))?;
            let mut seen = HashSet::new();
            let mut selected = Vec::new();
            for id in ids {
                let case = select_case(&discovered, id, true)?;
                if seen.insert(&case.path) {
                    selected.push(case);
                }
            }
            if selected.is_empty() {
                return Err(DiscoveryError::EmptyGroup(name.clone()).into());
            }
            (selected, Some(name.clone()))
        }
    };

    let cases = selected
        .into_iter()
        .map(|dir| load_test_case(&dir.path))
        .collect::<Result<Vec<_>>>()?;
    Ok(ExecutionPlan { cases, group })
}
