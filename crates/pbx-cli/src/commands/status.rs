//! Status command

use colored::{ColoredString, Colorize};
use pbx_core::{SyncStatus, summarize};

use crate::context::Context;
use crate::error::Result;

fn status_label(status: SyncStatus) -> ColoredString {
    match status {
        SyncStatus::Match => status.as_str().green(),
        SyncStatus::DeclaredOnly => status.as_str().yellow(),
        SyncStatus::RuntimeOnly => status.as_str().blue(),
        SyncStatus::Mismatch => status.as_str().red().bold(),
    }
}

/// Print every extension's classification and a summary line.
pub fn run_status(ctx: &Context) -> Result<()> {
    let infos = ctx.policy.compare()?;

    if infos.is_empty() {
        println!("{} No extensions declared or configured.", "OK".green().bold());
        return Ok(());
    }

    for info in &infos {
        let registered = info
            .runtime
            .as_ref()
            .is_some_and(|snapshot| snapshot.registered);
        print!("   {:>8}  {:<14}", info.number.cyan(), status_label(info.status));
        if registered {
            print!(" {}", "registered".dimmed());
        }
        if !info.differences.is_empty() {
            print!(" differs: {}", info.difference_names().join(", "));
        }
        println!();
    }

    let summary = summarize(&infos);
    println!();
    println!(
        "{} total, {} match, {} declared-only, {} runtime-only, {} mismatch",
        summary.total,
        summary.matched,
        summary.declared_only,
        summary.runtime_only,
        summary.mismatched
    );
    if summary.mismatched > 0 {
        println!(
            "Resolve mismatches with {} or {}.",
            "pbx-sync push <number>".cyan(),
            "pbx-sync pull <number>".cyan()
        );
    }
    Ok(())
}
