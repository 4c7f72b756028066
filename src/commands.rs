//! # Commands Module / 命令模块
//!
//! Implementations of the CLI subcommands and the setup phase that precedes a run.
//!
//! CLI 子命令的实现，以及运行之前的准备阶段。

pub mod list;
pub mod run;
pub mod setup;
