use crate::error::Result;
use crate::store::write_json;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Favorite flags keyed by application `name`, not entry id.
pub type Favorites = BTreeMap<String, bool>;

pub trait FavoritesStore: Send + Sync {
    /// Never fails: any problem reading the store yields an empty mapping.
    fn load(&self) -> Favorites;

    /// Replaces the persisted mapping wholesale.
    fn save(&self, favorites: &Favorites) -> Result<()>;

    /// Load, flip, write back. Returns the new flag for `name`.
    fn toggle(&self, name: &str) -> Result<bool> {
        let mut favorites = self.load();
        let flag = favorites.entry(name.to_string()).or_insert(false);
        *flag = !*flag;
        let new_value = *flag;
        self.save(&favorites)?;
        Ok(new_value)
    }
}

/// Stores the mapping as a single JSON object.
pub struct JsonFavoritesStore {
    path: PathBuf,
}

impl JsonFavoritesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FavoritesStore for JsonFavoritesStore {
    fn load(&self) -> Favorites {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("No favorites file at {:?} yet", self.path);
                return Favorites::new();
            }
            Err(err) => {
                warn!("Cannot read favorites {:?}: {}", self.path, err);
                return Favorites::new();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|err| {
            warn!("Ignoring malformed favorites {:?}: {}", self.path, err);
            Favorites::new()
        })
    }

    fn save(&self, favorites: &Favorites) -> Result<()> {
        write_json(&self.path, favorites)
    }
}
