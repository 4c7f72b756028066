//! # Engine Module / 引擎模块
//!
//! This module contains the test execution and verification engine:
//! the test case model, placeholder resolution, step execution, the
//! checker chain, score aggregation and test case discovery.
//!
//! 此模块包含测试执行与校验引擎：
//! 测试用例模型、占位符解析、步骤执行、检查器链、分数汇总以及测试用例发现。

pub mod checker;
pub mod config;
pub mod execution;
pub mod executor;
pub mod models;
pub mod paths;
pub mod planner;

// Re-exports
pub use config::{Project, TestCase};
pub use execution::run_test_case;
pub use models::TestResult;
