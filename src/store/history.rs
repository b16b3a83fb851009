use crate::error::Result;
use crate::model::Entry;
use crate::store::write_json;
use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use std::time::SystemTime;

#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub use_count: u32,
    pub last_used_at: Option<SystemTime>,
}

#[derive(Serialize, Deserialize, Default)]
pub struct History {
    pub usage: HashMap<String, Usage>,
}

impl History {
    /// Copies recorded usage onto an entry with the same id.
    pub fn apply(&self, entry: &mut Entry) {
        if let Some(usage) = self.usage.get(&entry.id) {
            entry.use_count = usage.use_count;
            entry.last_used_at = usage.last_used_at;
        }
    }
}

/// Usage counters keyed by entry id, persisted as JSON.
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> History {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return History::default();
        };
        serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!("Ignoring malformed history {:?}: {}", self.path, err);
            History::default()
        })
    }

    /// Stores the usage of `entry`, keeping every other record.
    ///
    /// Counts and timestamps never move backwards.
    pub fn record(&self, entry: &Entry) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut history = self.load();
        history
            .usage
            .entry(entry.id.clone())
            .or_default()
            .merge(entry.use_count, entry.last_used_at);
        write_json(&self.path, &history)
    }
}

impl Usage {
    fn merge(&mut self, use_count: u32, last_used_at: Option<SystemTime>) {
        self.use_count = self.use_count.max(use_count);
        self.last_used_at = self.last_used_at.max(last_used_at);
    }
}
