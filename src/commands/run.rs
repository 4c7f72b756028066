// src/commands/run.rs

use anyhow::Result;
use colored::*;
use std::path::PathBuf;

use crate::{
    commands::setup::run_setup_steps,
    engine::{
        config::Project,
        execution::{ExecutionObserver, Silent, run_test_case},
        models::CaseOutcome,
        planner::{self, DiscoveryError, ExecutionPlan, Selection},
    },
    infra::t,
    reporting::{
        ConsoleProgress, RunReport, console::discovery_error_message, generate_html_report,
        print_discovery_error, print_summary,
    },
};

/// Options of the `run` subcommand.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub project_dir: PathBuf,
    pub test: Option<String>,
    pub numeric: bool,
    pub group: Option<String>,
    pub json: bool,
    pub write_result: bool,
    pub html: Option<PathBuf>,
}

/// Runs the setup phase, the selected test cases and the reporters.
///
/// # Returns
/// `Ok(true)` when any point was earned, `Ok(false)` when nothing was earned or
/// discovery refused to produce a plan.
pub async fn execute(options: RunOptions, locale: &str) -> Result<bool> {
    let project = Project::load(&options.project_dir)?;

    run_setup_steps(&project, options.json, locale).await?;

    let selection = Selection::from_args(
        options.test.as_deref(),
        options.numeric,
        options.group.as_deref(),
    );
    let plan = match planner::plan_execution(&project, &selection) {
        Ok(plan) => plan,
        Err(e) => match e.downcast_ref::<DiscoveryError>() {
            Some(discovery) => {
                if options.json {
                    eprintln!(
                        "{} {}",
                        t!("report.error_prefix", locale = locale),
                        discovery_error_message(discovery, locale)
                    );
                } else {
                    print_discovery_error(discovery, locale);
                }
                return Ok(false);
            }
            None => return Err(e),
        },
    };

    if !options.json {
        let banner = match &plan.group {
            Some(group) => t!(
                "run.banner_group",
                locale = locale,
                count = plan.cases.len(),
                group = group
            ),
            None => t!("run.banner", locale = locale, count = plan.cases.len()),
        };
        println!("\n{}\n", banner.bold());
    }

    let outcomes = if options.json {
        run_cases(&project, plan, &mut Silent).await
    } else {
        let mut progress = ConsoleProgress::new(locale, plan.cases.len());
        run_cases(&project, plan, &mut progress).await
    };
    let report = RunReport::build(&outcomes);

    if options.json {
        println!("{}", report.to_json()?);
    } else {
        print_summary(&report, locale);
    }

    if let Some(report_path) = &options.html {
        if !options.json {
            println!(
                "\n{}",
                t!("html_report.generating", locale = locale, path = report_path.display())
            );
        }
        if let Err(e) = generate_html_report(&report, report_path, locale) {
            eprintln!("{} {:#}", t!("html_report.failed", locale = locale).red(), e);
        }
    }

    if options.write_result {
        report.write_result_file(&project.root)?;
    }

    Ok(report.is_passing())
}

/// Runs the planned cases one after another, in plan order.
pub async fn run_cases(
    project: &Project,
    plan: ExecutionPlan,
    observer: &mut dyn ExecutionObserver,
) -> Vec<CaseOutcome> {
    let mut outcomes = Vec::with_capacity(plan.cases.len());
    for case in plan.cases {
        let result = run_test_case(&case, project, observer).await;
        outcomes.push(CaseOutcome { case, result });
    }
    outcomes
}
