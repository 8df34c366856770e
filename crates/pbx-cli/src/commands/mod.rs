//! Command implementations for pbx-cli

pub mod lifecycle;
pub mod status;
pub mod sync;

pub use lifecycle::{run_delete, run_set_enabled};
pub use status::run_status;
pub use sync::{run_auto, run_init, run_pull, run_push, run_start};

use colored::Colorize;
use pbx_core::{BulkReport, SyncAction, SyncOutcome};

pub(crate) fn print_outcome(outcome: &SyncOutcome) {
    let what = match outcome.action {
        SyncAction::SectionWritten => "section written",
        SyncAction::SectionCommentedOut => "section commented out",
        SyncAction::SectionRemoved => "section removed",
        SyncAction::DeclaredUpdated => "declared record updated",
        SyncAction::Unchanged => "already up to date",
    };
    let tag = if outcome.changed() {
        "OK".green().bold()
    } else {
        "OK".dimmed()
    };
    println!("{} {}: {}", tag, outcome.number.cyan(), what);
    if let Some(backup) = &outcome.backup {
        println!("   {} backup {}", "+".dimmed(), backup.display());
    }
    if let Some(warning) = &outcome.reload_warning {
        println!(
            "{} {}; reload the server manually",
            "WARN".yellow().bold(),
            warning
        );
    }
}

pub(crate) fn print_bulk(report: &BulkReport, verb: &str) {
    if report.attempted() == 0 {
        println!("{} Nothing to {}.", "OK".green().bold(), verb);
        return;
    }
    let tag = if report.is_complete_success() {
        "OK".green().bold()
    } else {
        "PARTIAL".yellow().bold()
    };
    println!(
        "{} {} of {} extensions {}ed",
        tag,
        report.succeeded,
        report.attempted(),
        verb
    );
    for failure in &report.failures {
        println!("   {} {}: {}", "!".red(), failure.number.cyan(), failure.error);
    }
    if let Some(warning) = &report.reload_warning {
        println!(
            "{} {}; reload the server manually",
            "WARN".yellow().bold(),
            warning
        );
    }
}
