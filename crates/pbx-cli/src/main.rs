//! pbx-sync CLI
//!
//! Keeps declared telephony extensions and the generated PJSIP configuration
//! in step.

mod cli;
mod commands;
mod context;
mod error;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::Context;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    if let Err(e) = pbx_core::logging::init_with_default(default_level) {
        eprintln!("{}: logging disabled: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!("Verbose mode enabled");

    let ctx = Context::load(cli.config.as_deref())?;
    execute_command(&ctx, cli.command)
}

fn execute_command(ctx: &Context, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Init => commands::run_init(ctx),
        Commands::Status => commands::run_status(ctx),
        Commands::Start => commands::run_start(ctx),
        Commands::Auto => commands::run_auto(ctx),
        Commands::Push { number, all } => commands::run_push(ctx, number.as_deref(), all),
        Commands::Pull { number, all } => commands::run_pull(ctx, number.as_deref(), all),
        Commands::Enable { number } => commands::run_set_enabled(ctx, &number, true),
        Commands::Disable { number } => commands::run_set_enabled(ctx, &number, false),
        Commands::Delete { number } => commands::run_delete(ctx, &number),
    }
}
