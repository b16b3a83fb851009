use crate::model::Entry;
use crate::sources::Source;
use crate::store::favorites::FavoritesStore;
use crate::store::history::HistoryStore;
use log::{debug, info, warn};
use regex::Regex;
use std::sync::Arc;
use std::thread;

// Some of these tools open a gpsd connection as soon as they start.
const GPS_TERMS: &[&str] = &[
    "gps",
    "gpsd",
    "xgps",
    "xgpsspeed",
    "gpsbabel",
    "gpscorrelate",
    "gpsprune",
    "gpsdrive",
];
const GPS_CATEGORIES: &[&str] = &["gps", "navigation", "maps", "geography"];

/// Runs every configured source and merges persisted state into the result.
pub struct Scanner {
    sources: Vec<Box<dyn Source>>,
    favorites: Arc<dyn FavoritesStore>,
    history: Option<Arc<HistoryStore>>,
    exclude: Vec<Regex>,
}

impl Scanner {
    pub fn new(sources: Vec<Box<dyn Source>>, favorites: Arc<dyn FavoritesStore>) -> Self {
        Self {
            sources,
            favorites,
            history: None,
            exclude: Vec::new(),
        }
    }

    pub fn with_history(mut self, history: Arc<HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// Adds user exclusion patterns. Patterns that fail to compile are ignored.
    pub fn with_exclusions(mut self, patterns: &[String]) -> Self {
        for pattern in patterns {
            match Regex::new(pattern) {
                Ok(re) => self.exclude.push(re),
                Err(err) => warn!("Ignoring invalid exclude pattern '{}': {}", pattern, err),
            }
        }
        self
    }

    pub fn favorites(&self) -> &Arc<dyn FavoritesStore> {
        &self.favorites
    }

    /// Scans all sources. Failures of a single source are logged and skipped.
    pub fn scan(&self) -> Vec<Entry> {
        let results = thread::scope(|scope| {
            let handles: Vec<_> = self
                .sources
                .iter()
                .map(|source| scope.spawn(move || source.scan()))
                .collect();
            handles
                .into_iter()
                .zip(&self.sources)
                .map(|(handle, source)| (source.name(), handle.join()))
                .collect::<Vec<_>>()
        });

        let favorites = self.favorites.load();
        let history = self.history.as_ref().map(|h| h.load());

        let mut entries = Vec::new();
        for (name, result) in results {
            let found = match result {
                Ok(Ok(found)) => found,
                Ok(Err(err)) => {
                    warn!("Source '{}' failed: {}", name, err);
                    continue;
                }
                Err(_) => {
                    warn!("Source '{}' panicked during scan", name);
                    continue;
                }
            };

            for mut entry in found {
                if is_gps_related(&entry) {
                    info!("Skipping GPS application: {}", entry.name);
                    continue;
                }
                if self.is_excluded(&entry) {
                    debug!("Excluded by pattern: {}", entry.id);
                    continue;
                }
                entry.is_favorite = favorites.get(&entry.name).copied().unwrap_or(false);
                if let Some(history) = &history {
                    history.apply(&mut entry);
                }
                entries.push(entry);
            }
        }

        info!("Scanner: {} entries after filtering", entries.len());
        entries
    }

    fn is_excluded(&self, entry: &Entry) -> bool {
        self.exclude.iter().any(|re| {
            re.is_match(&entry.name) || re.is_match(&entry.id) || re.is_match(&entry.exec_command)
        })
    }
}

pub fn is_gps_related(entry: &Entry) -> bool {
    let fields = [
        &entry.name,
        &entry.display_name,
        &entry.description,
        &entry.exec_command,
    ];
    let text_hit = fields.iter().any(|field| {
        let field = field.to_lowercase();
        GPS_TERMS.iter().any(|term| field.contains(term))
    });

    text_hit
        || entry.categories.iter().any(|category| {
            let category = category.to_lowercase();
            GPS_CATEGORIES.iter().any(|term| category.contains(term))
        })
}
