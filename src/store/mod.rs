//! Durable per-user state: favorite flags keyed by name and usage keyed by id.

pub mod favorites;
pub mod history;

use crate::error::{CatalogError, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Writes `value` as pretty JSON, creating the parent directory first.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| CatalogError::io(parent, e))?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).map_err(|e| CatalogError::io(path, e))
}
