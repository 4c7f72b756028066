// Shared test helpers for integration tests
#![allow(dead_code)]

use autograder::config::{Project, TestCase, load_test_case};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

/// A throwaway project laid out the default way: `tests/cases/<id>/config.toml`.
pub struct ProjectFixture {
    pub dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let dir = tempdir().expect("Failed to create temporary directory");
        fs::create_dir_all(dir.path().join("tests/cases")).expect("Failed to create cases directory");
        fs::create_dir_all(dir.path().join("tests/common")).expect("Failed to create common directory");
        Self { dir }
    }

    /// A project without a cases directory.
    pub fn empty() -> Self {
        Self {
            dir: tempdir().expect("Failed to create temporary directory"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn case_dir(&self, id: &str) -> PathBuf {
        self.root().join("tests/cases").join(id)
    }

    /// Creates the case directory `id` with the given `config.toml`.
    pub fn add_case(&self, id: &str, config: &str) -> PathBuf {
        let dir = self.case_dir(id);
        fs::create_dir_all(&dir).expect("Failed to create case directory");
        fs::write(dir.join("config.toml"), config).expect("Failed to write config.toml");
        dir
    }

    /// Writes a file relative to the case directory `id`.
    pub fn write_case_file(&self, id: &str, name: &str, content: &str) -> PathBuf {
        let path = self.case_dir(id).join(name);
        fs::write(&path, content).expect("Failed to write case file");
        path
    }

    pub fn write_grader_config(&self, content: &str) {
        fs::write(self.root().join("grader_config.toml"), content).expect("Failed to write grader_config.toml");
    }

    pub fn project(&self) -> Project {
        Project::load(self.root()).expect("Failed to load project")
    }

    pub fn load_case(&self, id: &str) -> TestCase {
        let project = self.project();
        load_test_case(&project.cases_dir().join(id)).expect("Failed to load test case")
    }
}

/// A minimal passing case worth `score` points.
pub fn passing_case(name: &str, score: u32) -> String {
    format!(
        r#"
[meta]
name = "{name}"
score = {score}

[[run]]
command = "sh"
args = ["-c", "exit 0"]
[run.check]
return_code = 0
"#
    )
}

/// A minimal failing case worth `score` points.
pub fn failing_case(name: &str, score: u32) -> String {
    format!(
        r#"
[meta]
name = "{name}"
score = {score}

[[run]]
command = "sh"
args = ["-c", "exit 3"]
[run.check]
return_code = 0
"#
    )
}
