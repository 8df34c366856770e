//! Init, auto, start, push and pull commands

use colored::Colorize;

use crate::commands::{print_bulk, print_outcome, run_status};
use crate::context::Context;
use crate::error::{CliError, Result};

/// Create the generated file if needed and write infrastructure blocks.
pub fn run_init(ctx: &Context) -> Result<()> {
    let sections = ctx.policy.sections();
    if sections.init()? {
        println!(
            "{} Created {}",
            "OK".green().bold(),
            sections.path().display()
        );
    }
    let written = ctx.policy.ensure_infrastructure(&ctx.config.static_blocks)?;
    println!(
        "{} {} infrastructure block(s) written",
        "OK".green().bold(),
        written
    );
    Ok(())
}

/// Heal one-sided drift and list conflicts.
pub fn run_auto(ctx: &Context) -> Result<()> {
    println!("{} Reconciling extensions...", "=>".blue().bold());
    let result = ctx.policy.auto_sync()?;

    println!(
        "{} {} pushed, {} pulled, {} already in sync",
        "OK".green().bold(),
        result.pushed,
        result.pulled,
        result.already_in_sync
    );
    for failure in &result.failures {
        println!("   {} {}: {}", "!".red(), failure.number.cyan(), failure.error);
    }
    if result.has_conflicts() {
        println!("{} Conflicts need a decision:", "CONFLICT".red().bold());
        for conflict in &result.conflicts {
            let fields: Vec<_> = conflict.differences.iter().map(|d| d.as_str()).collect();
            println!("   {} {}: {}", "!".red(), conflict.number.cyan(), fields.join(", "));
        }
    }
    if let Some(warning) = &result.reload_warning {
        println!(
            "{} {}; reload the server manually",
            "WARN".yellow().bold(),
            warning
        );
    }
    Ok(())
}

/// Startup sequence. Only a failure to prepare the generated file stops it;
/// a failed auto-sync or status report is a warning.
pub fn run_start(ctx: &Context) -> Result<()> {
    run_init(ctx)?;
    if ctx.config.sync.auto_sync_on_start
        && let Err(e) = run_auto(ctx)
    {
        tracing::warn!(error = %e, "Auto-sync failed");
        println!("{} auto-sync failed: {}", "WARN".yellow().bold(), e);
    }
    if let Err(e) = run_status(ctx) {
        tracing::warn!(error = %e, "Status report failed");
        println!("{} status unavailable: {}", "WARN".yellow().bold(), e);
    }
    Ok(())
}

pub fn run_push(ctx: &Context, number: Option<&str>, all: bool) -> Result<()> {
    match (number, all) {
        (_, true) => {
            let report = ctx.policy.sync_all_declared_to_runtime()?;
            print_bulk(&report, "push");
        }
        (Some(number), false) => {
            let outcome = ctx.policy.sync_declared_to_runtime(number)?;
            print_outcome(&outcome);
        }
        (None, false) => return Err(CliError::user("Specify an extension number or --all")),
    }
    Ok(())
}

pub fn run_pull(ctx: &Context, number: Option<&str>, all: bool) -> Result<()> {
    match (number, all) {
        (_, true) => {
            let report = ctx.policy.sync_all_runtime_to_declared()?;
            print_bulk(&report, "pull");
        }
        (Some(number), false) => {
            let outcome = ctx.policy.sync_runtime_to_declared(number)?;
            print_outcome(&outcome);
        }
        (None, false) => return Err(CliError::user("Specify an extension number or --all")),
    }
    Ok(())
}
