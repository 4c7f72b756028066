// src/commands/list.rs

use anyhow::Result;
use colored::*;
use std::path::Path;

use crate::{
    engine::{
        config::Project,
        planner::{self, DiscoveryError, Selection},
    },
    infra::t,
    reporting::print_discovery_error,
};

/// Prints the discovered test cases in run order, followed by the configured groups.
///
/// # Returns
/// `Ok(false)` when discovery failed, `Ok(true)` otherwise.
pub fn execute(project_dir: &Path, locale: &str) -> Result<bool> {
    let project = Project::load(project_dir)?;
    let plan = match planner::plan_execution(&project, &Selection::All) {
        Ok(plan) => plan,
        Err(e) => match e.downcast_ref::<DiscoveryError>() {
            Some(discovery) => {
                print_discovery_error(discovery, locale);
                return Ok(false);
            }
            None => return Err(e),
        },
    };

    println!(
        "{}",
        t!("list.cases_header", locale = locale, count = plan.cases.len()).bold()
    );
    for case in &plan.cases {
        println!(
            "  - {:<24} {} {}",
            case.id.cyan(),
            case.meta.name,
            format!("[{}]", case.max_score()).dimmed()
        );
    }

    let groups = &project.config.groups;
    if !groups.is_empty() {
        println!("\n{}", t!("list.groups_header", locale = locale).bold());
        for (name, ids) in groups {
            println!("  - {}: {}", name.yellow(), ids.join(", "));
        }
    }
    Ok(true)
}
