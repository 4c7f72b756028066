//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides utilities for file system operations,
//! such as resetting per-test build directories and reading case inputs.
//!
//! 此模块提供文件系统操作的实用功能，
//! 如重置每个测试的构建目录和读取用例输入。

use anyhow::{Context, Result};
use fs_extra::dir;
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::paths::BUILD_DIR_NAME;

/// Clears the build directory of a test case and recreates it empty.
///
/// # Arguments
/// * `test_dir` - Directory of the test case owning the build directory
///
/// # Returns
/// The absolute path of the fresh build directory
pub fn reset_build_dir(test_dir: &Path) -> Result<PathBuf> {
    let build_dir = test_dir.join(BUILD_DIR_NAME);
    // `erase = true` removes any previous contents before creating the directory.
    dir::create(&build_dir, true).with_context(|| {
        format!(
            "Failed to reset build directory: {}",
            build_dir.display()
        )
    })?;
    tracing::debug!(path = %build_dir.display(), "build directory reset");
    Ok(build_dir)
}

/// Checks if a path exists and is a directory.
///
/// # Arguments
/// * `path` - Path to check
///
/// # Returns
/// `true` if the path exists and is a directory, `false` otherwise
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

/// Lists the immediate subdirectories of `path`.
pub fn subdirectories(path: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path).with_context(|| format!("Failed to read {}", path.display()))? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    Ok(dirs)
}
