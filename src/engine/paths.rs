//! # Path Resolver Module / 路径解析模块
//!
//! Substitutes directory placeholders (`${test_dir}`, `${build_dir}`,
//! `${common_dir}`, `${root_dir}`) in command, argument and path strings.
//! Unknown placeholders and plain strings pass through untouched.
//!
//! 替换命令、参数和路径字符串中的目录占位符。
//! 未知占位符和普通字符串保持原样。

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Name of the per-test scratch directory inside a case directory.
pub const BUILD_DIR_NAME: &str = "build";

/// Only the four braced markers are recognized; any other `$` text is left as is.
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(test_dir|build_dir|common_dir|root_dir)\}")
        .expect("placeholder pattern is valid")
});

/// Placeholder-to-path mapping for one test case.
/// 单个测试用例的占位符到路径映射。
#[derive(Debug, Clone)]
pub struct PathResolver {
    test_dir: PathBuf,
    build_dir: PathBuf,
    vars: [(&'static str, String); 4],
}

impl PathResolver {
    /// Creates the resolver for the case stored in `test_dir` and makes sure its
    /// build directory exists.
    pub fn new(test_dir: &Path, common_dir: &Path, root_dir: &Path) -> Self {
        let build_dir = test_dir.join(BUILD_DIR_NAME);
        let vars = [
            ("test_dir", test_dir.to_string_lossy().into_owned()),
            ("build_dir", build_dir.to_string_lossy().into_owned()),
            ("common_dir", common_dir.to_string_lossy().into_owned()),
            ("root_dir", root_dir.to_string_lossy().into_owned()),
        ];
        let resolver = Self {
            test_dir: test_dir.to_path_buf(),
            build_dir,
            vars,
        };
        resolver.ensure_build_dir();
        resolver
    }

    pub fn test_dir(&self) -> &Path {
        &self.test_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Replaces every known placeholder in `input` with its absolute path.
    ///
    /// 将 `input` 中的每个已知占位符替换为对应的绝对路径。
    pub fn resolve(&self, input: &str) -> String {
        self.ensure_build_dir();
        PLACEHOLDER
            .replace_all(input, |caps: &Captures<'_>| {
                self.lookup(&caps[1]).unwrap_or(&caps[0]).to_string()
            })
            .into_owned()
    }

    /// Resolves placeholders and anchors relative results at the test directory.
    pub fn resolve_path(&self, input: &str) -> PathBuf {
        let resolved = PathBuf::from(self.resolve(input));
        if resolved.is_absolute() {
            resolved
        } else {
            self.test_dir.join(resolved)
        }
    }

    fn lookup(&self, name: &str) -> Option<&str> {
        self.vars
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    fn ensure_build_dir(&self) {
        // Steps may delete the directory themselves; recreating it is idempotent.
        if let Err(e) = fs::create_dir_all(&self.build_dir) {
            warn!(path = %self.build_dir.display(), error = %e, "failed to create build directory");
        }
    }
}
