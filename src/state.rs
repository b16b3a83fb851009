use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::{CatalogError, Result};
use crate::executor::{Launcher, SystemLauncher};
use crate::matcher::{Ranker, RelevanceRanker};
use crate::model::Entry;
use crate::scanner::Scanner;
use crate::sources::Source;
use crate::sources::bin::BinSource;
use crate::sources::desktop::DesktopSource;
use crate::store::favorites::{FavoritesStore, JsonFavoritesStore};
use crate::store::history::HistoryStore;
use log::{debug, warn};
use std::sync::Arc;
use std::time::SystemTime;

/// The one context every front end talks to.
pub struct AppState {
    catalog: Catalog,
    ranker: Box<dyn Ranker>,
    launcher: Box<dyn Launcher>,
    history: Option<Arc<HistoryStore>>,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        ranker: Box<dyn Ranker>,
        launcher: Box<dyn Launcher>,
        history: Option<Arc<HistoryStore>>,
    ) -> Self {
        Self {
            catalog,
            ranker,
            launcher,
            history,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut sources: Vec<Box<dyn Source>> = Vec::new();
        if config.sources.scan_desktop {
            let desktop = match &config.sources.desktop_dirs {
                Some(dirs) => DesktopSource::new(dirs.clone()),
                None => DesktopSource::with_default_roots(),
            };
            sources.push(Box::new(desktop));
        }
        if config.sources.scan_path {
            sources.push(Box::new(BinSource::from_env()));
        }

        let favorites = JsonFavoritesStore::new(config.favorites_path());
        debug!("Favorites file: {:?}", favorites.path());
        let favorites: Arc<dyn FavoritesStore> = Arc::new(favorites);

        let history = config.general.persist_usage.then(|| {
            let history = HistoryStore::new(config.history_path());
            debug!("Usage history file: {:?}", history.path());
            Arc::new(history)
        });

        let mut scanner =
            Scanner::new(sources, favorites).with_exclusions(&config.filter.exclude);
        if let Some(history) = &history {
            scanner = scanner.with_history(Arc::clone(history));
        }

        Self::new(
            Catalog::new(scanner),
            Box::new(RelevanceRanker),
            Box::new(SystemLauncher),
            history,
        )
    }

    pub fn list_all(&self) -> Vec<Entry> {
        self.catalog.get_all()
    }

    pub fn get_by_id(&self, id: &str) -> Result<Entry> {
        self.catalog.get_by_id(id)
    }

    /// Blank queries list everything by name; others are ranked by relevance.
    pub fn search(&self, query: &str) -> Vec<Entry> {
        if query.trim().is_empty() {
            return self.catalog.get_all();
        }
        let candidates = self.catalog.search(query);
        self.ranker.rank(candidates, query)
    }

    pub fn get_favorites(&self) -> Vec<Entry> {
        self.catalog.get_favorites()
    }

    pub fn get_recently_used(&self, limit: usize) -> Vec<Entry> {
        self.catalog.get_recently_used(limit)
    }

    pub fn get_by_category(&self, category: &str) -> Vec<Entry> {
        self.catalog.get_by_category(category)
    }

    pub fn list_categories(&self) -> Vec<String> {
        self.catalog.get_categories()
    }

    /// Returns the new favorite flag for `name`.
    pub fn toggle_favorite(&self, name: &str) -> Result<bool> {
        if name.trim().is_empty() {
            return Err(CatalogError::InvalidArgument("app name cannot be empty".into()));
        }
        self.catalog.toggle_favorite(name)
    }

    /// Starts the entry's program and records the launch on success.
    pub fn launch(&self, id: &str) -> Result<Entry> {
        if id.trim().is_empty() {
            return Err(CatalogError::InvalidArgument("app id cannot be empty".into()));
        }
        let entry = self.catalog.get_by_id(id)?;

        // The catalog lock is not held while spawning.
        self.launcher.launch(&entry.exec_command)?;

        let updated = self
            .catalog
            .update(id, |e| e.record_launch(SystemTime::now()))?;
        if let Some(history) = &self.history {
            if let Err(err) = history.record(&updated) {
                warn!("Could not persist usage for {}: {}", updated.id, err);
            }
        }
        Ok(updated)
    }

    pub fn refresh(&self) -> usize {
        self.catalog.refresh()
    }
}
