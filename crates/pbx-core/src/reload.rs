//! Reload trigger implementations

use std::fmt;

use crate::error::ReloadError;
use crate::traits::ReloadTrigger;

/// Reload trigger that does nothing, for setups where the server picks up
/// configuration changes on its own or an operator reloads by hand.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReload;

impl ReloadTrigger for NoopReload {
    fn reload(&self) -> Result<(), ReloadError> {
        tracing::debug!("Reload skipped");
        Ok(())
    }
}

/// Reload trigger backed by a closure.
pub struct FnReload<F> {
    reload: F,
}

impl<F> FnReload<F>
where
    F: Fn() -> Result<(), ReloadError> + Send + Sync,
{
    pub fn new(reload: F) -> Self {
        Self { reload }
    }
}

impl<F> fmt::Debug for FnReload<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnReload").finish_non_exhaustive()
    }
}

impl<F> ReloadTrigger for FnReload<F>
where
    F: Fn() -> Result<(), ReloadError> + Send + Sync,
{
    fn reload(&self) -> Result<(), ReloadError> {
        (self.reload)()
    }
}
