// src/cli.rs
use anyhow::Result;
use clap::{Arg, ArgAction, ArgMatches, Command};
use std::{env, path::PathBuf};

use crate::{commands, infra::t};

/// Pre-parses the command line arguments to find the language setting.
/// This allows i18n to be initialized before the full CLI is built.
/// It looks for a `--lang <VALUE>` or `--lang=<VALUE>` argument.
fn pre_parse_language() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    if let Some(pos) = args.iter().position(|arg| arg == "--lang") {
        return args.get(pos + 1).cloned();
    }
    args.iter()
        .find_map(|arg| arg.strip_prefix("--lang=").map(str::to_string))
}

fn project_dir_arg(locale: &str) -> Arg {
    Arg::new("project-dir")
        .long("project-dir")
        .help(t!("arg_project_dir", locale = locale).to_string())
        .value_name("PROJECT_DIR")
        .default_value(".")
        .value_parser(clap::value_parser!(PathBuf))
        .action(ArgAction::Set)
}

pub fn build_cli(locale: &str) -> Command {
    Command::new("autograder")
        .version(env!("CARGO_PKG_VERSION"))
        .about(t!("cli_about", locale = locale).to_string())
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("lang")
                .long("lang")
                .help(t!("cli_lang", locale = locale).to_string())
                .value_name("LANGUAGE")
                .global(true)
                .action(ArgAction::Set),
        )
        .subcommand(
            Command::new("run")
                .about(t!("cmd_run_about", locale = locale).to_string())
                .arg(
                    Arg::new("test")
                        .help(t!("arg_test", locale = locale).to_string())
                        .value_name("TEST")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help(t!("arg_json", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("write-result")
                        .long("write-result")
                        .help(t!("arg_write_result", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("prefix")
                        .long("prefix")
                        .help(t!("arg_prefix", locale = locale).to_string())
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("group")
                        .long("group")
                        .help(t!("arg_group", locale = locale).to_string())
                        .value_name("GROUP")
                        .conflicts_with("test")
                        .action(ArgAction::Set),
                )
                .arg(
                    Arg::new("html")
                        .long("html")
                        .help(t!("arg_html", locale = locale).to_string())
                        .value_name("HTML")
                        .value_parser(clap::value_parser!(PathBuf))
                        .action(ArgAction::Set),
                )
                .arg(project_dir_arg(locale)),
        )
        .subcommand(
            Command::new("list")
                .about(t!("cmd_list_about", locale = locale).to_string())
                .arg(project_dir_arg(locale)),
        )
}

fn project_dir(matches: &ArgMatches) -> PathBuf {
    matches
        .get_one::<PathBuf>("project-dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Parses the command line and dispatches to the selected subcommand.
///
/// # Returns
/// Whether the invocation succeeded, which decides the process exit code.
pub async fn run() -> Result<bool> {
    // Pre-parse language and initialize i18n first.
    let locale = crate::init(pre_parse_language().as_deref());

    let matches = build_cli(&locale).get_matches();

    match matches.subcommand() {
        Some(("run", run_matches)) => {
            let options = commands::run::RunOptions {
                project_dir: project_dir(run_matches),
                test: run_matches.get_one::<String>("test").cloned(),
                numeric: run_matches.get_flag("prefix"),
                group: run_matches.get_one::<String>("group").cloned(),
                json: run_matches.get_flag("json"),
                write_result: run_matches.get_flag("write-result"),
                html: run_matches.get_one::<PathBuf>("html").cloned(),
            };
            commands::run::execute(options, &locale).await
        }
        Some(("list", list_matches)) => commands::list::execute(&project_dir(list_matches), &locale),
        // `subcommand_required` makes clap print help and exit before we get here.
        _ => Ok(false),
    }
}
