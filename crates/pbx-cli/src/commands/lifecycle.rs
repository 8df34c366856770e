//! Enable, disable and delete commands

use crate::commands::print_outcome;
use crate::context::Context;
use crate::error::Result;

pub fn run_set_enabled(ctx: &Context, number: &str, enabled: bool) -> Result<()> {
    let outcome = ctx.policy.set_enabled(number, enabled)?;
    print_outcome(&outcome);
    Ok(())
}

pub fn run_delete(ctx: &Context, number: &str) -> Result<()> {
    let outcome = ctx.policy.delete_extension(number)?;
    print_outcome(&outcome);
    Ok(())
}
