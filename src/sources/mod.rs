use crate::error::Result;
use crate::model::Entry;

/// A family of scan roots that yields candidate entries.
///
/// Implementations absorb per-root and per-file failures themselves; an
/// `Err` means the whole source could not run and is skipped by the scanner.
pub trait Source: Send + Sync {
    fn name(&self) -> &'static str;
    fn scan(&self) -> Result<Vec<Entry>>;
}

pub mod desktop;
pub mod bin;
