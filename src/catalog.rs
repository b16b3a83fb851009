//! The in-memory application index.
//!
//! Every operation takes the same mutex, so a refresh is never observed half
//! done, and callers only ever receive clones of the stored entries.

use crate::error::{CatalogError, Result};
use crate::matcher::{matches_query, normalize_query};
use crate::model::Entry;
use crate::scanner::Scanner;
use log::{debug, info};
use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

type Index = HashMap<String, Entry>;

pub struct Catalog {
    index: Mutex<Index>,
    scanner: Scanner,
}

impl Catalog {
    pub fn new(scanner: Scanner) -> Self {
        Self {
            index: Mutex::new(Index::new()),
            scanner,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Index> {
        self.index.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Locks the index, scanning first if it is empty.
    ///
    /// The scan happens while the lock is held, so concurrent first callers
    /// wait for a single scan rather than each starting their own. A scan that
    /// finds nothing leaves the index empty and the next read scans again.
    fn loaded(&self) -> MutexGuard<'_, Index> {
        let mut index = self.lock();
        if index.is_empty() {
            debug!("Catalog empty, loading");
            self.fill(&mut index);
        }
        index
    }

    fn fill(&self, index: &mut Index) {
        for entry in self.scanner.scan() {
            index.insert(entry.id.clone(), entry);
        }
        info!("Catalog loaded with {} entries", index.len());
    }

    pub fn get_all(&self) -> Vec<Entry> {
        let index = self.loaded();
        sorted_by_display_name(index.values().cloned().collect())
    }

    pub fn get_by_id(&self, id: &str) -> Result<Entry> {
        self.loaded()
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    /// Entries matching `query` in any searchable field, in no particular order.
    pub fn search(&self, query: &str) -> Vec<Entry> {
        let query = normalize_query(query);
        self.loaded()
            .values()
            .filter(|entry| matches_query(entry, &query))
            .cloned()
            .collect()
    }

    pub fn get_favorites(&self) -> Vec<Entry> {
        let index = self.loaded();
        sorted_by_display_name(index.values().filter(|e| e.is_favorite).cloned().collect())
    }

    /// Most recently launched first. A `limit` of zero means no limit.
    pub fn get_recently_used(&self, limit: usize) -> Vec<Entry> {
        let mut recent: Vec<Entry> = self
            .loaded()
            .values()
            .filter(|e| e.last_used_at.is_some())
            .cloned()
            .collect();
        recent.sort_by(|a, b| {
            b.last_used_at
                .cmp(&a.last_used_at)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        if limit > 0 && limit < recent.len() {
            recent.truncate(limit);
        }
        recent
    }

    pub fn get_by_category(&self, category: &str) -> Vec<Entry> {
        let wanted = category.to_lowercase();
        let index = self.loaded();
        let matching = index
            .values()
            .filter(|e| e.categories.iter().any(|c| c.to_lowercase() == wanted))
            .cloned()
            .collect();
        sorted_by_display_name(matching)
    }

    pub fn get_categories(&self) -> Vec<String> {
        let index = self.loaded();
        let categories: BTreeSet<&String> = index.values().flat_map(|e| &e.categories).collect();
        categories.into_iter().cloned().collect()
    }

    /// Inserts or replaces the entry with the same id.
    #[allow(dead_code)]
    pub fn save(&self, entry: Entry) {
        upsert(&mut self.loaded(), entry);
    }

    #[allow(dead_code)]
    pub fn delete(&self, id: &str) -> Option<Entry> {
        self.loaded().remove(id)
    }

    /// Read-modify-save of one entry under a single lock, so concurrent
    /// updates of the same id never lose each other's changes.
    pub fn update<F>(&self, id: &str, f: F) -> Result<Entry>
    where
        F: FnOnce(&mut Entry),
    {
        let mut index = self.loaded();
        let mut entry = index
            .get(id)
            .cloned()
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        f(&mut entry);
        upsert(&mut index, entry.clone());
        Ok(entry)
    }

    /// Drops the whole index and scans again. Returns the new entry count.
    pub fn refresh(&self) -> usize {
        let mut index = self.lock();
        index.clear();
        self.fill(&mut index);
        index.len()
    }

    /// Flips the persisted flag for `name` and mirrors it onto every entry
    /// sharing that name. Memory is left untouched if the write fails.
    pub fn toggle_favorite(&self, name: &str) -> Result<bool> {
        let mut index = self.lock();
        let flag = self.scanner.favorites().toggle(name)?;
        for entry in index.values_mut().filter(|e| e.name == name) {
            entry.is_favorite = flag;
        }
        Ok(flag)
    }
}

fn upsert(index: &mut Index, entry: Entry) {
    index.insert(entry.id.clone(), entry);
}

fn sorted_by_display_name(mut entries: Vec<Entry>) -> Vec<Entry> {
    entries.sort_by(|a, b| a.display_name.cmp(&b.display_name).then_with(|| a.id.cmp(&b.id)));
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntryType;
    use crate::sources::Source;
    use crate::store::favorites::{FavoritesStore, JsonFavoritesStore};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, SystemTime};
    use tempfile::{TempDir, tempdir};

    struct CountingSource {
        entries: Vec<Entry>,
        scans: Arc<AtomicUsize>,
    }

    impl Source for CountingSource {
        fn name(&self) -> &'static str {
            "counting"
        }

        fn scan(&self) -> Result<Vec<Entry>> {
            self.scans.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(10));
            Ok(self.entries.clone())
        }
    }

    fn entry(id: &str, name: &str, categories: &[&str]) -> Entry {
        let mut e = Entry::new(id.into(), name.into(), name.to_lowercase(), EntryType::Desktop);
        categories.iter().for_each(|c| e.add_category(c));
        e
    }

    fn fixtures() -> Vec<Entry> {
        let mut firefox = entry("/usr/share/applications/firefox.desktop", "Firefox", &["Network", "WebBrowser"]);
        firefox.description = "Browse the web".into();
        vec![
            firefox,
            entry("/usr/share/applications/files.desktop", "Files", &["Utility", "FileManager"]),
            entry("/usr/share/applications/term.desktop", "Terminal", &["System", "utility"]),
            entry("/home/u/.local/share/applications/files.desktop", "Files", &["Utility"]),
        ]
    }

    fn catalog_with(entries: Vec<Entry>, dir: &TempDir) -> (Catalog, Arc<AtomicUsize>, Arc<dyn FavoritesStore>) {
        let scans = Arc::new(AtomicUsize::new(0));
        let favorites: Arc<dyn FavoritesStore> =
            Arc::new(JsonFavoritesStore::new(dir.path().join("favorites.json")));
        let source = CountingSource {
            entries,
            scans: Arc::clone(&scans),
        };
        let scanner = Scanner::new(vec![Box::new(source)], Arc::clone(&favorites));
        (Catalog::new(scanner), scans, favorites)
    }

    fn ids(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn get_all_loads_lazily_and_sorts_by_display_name() {
        let dir = tempdir().unwrap();
        let mut entries = fixtures();
        entries.push(entry("/x/zed.desktop", "Zed", &[]));
        entries.push(entry("/x/alpha.desktop", "alpha", &[]));
        let (catalog, scans, _) = catalog_with(entries, &dir);
        assert_eq!(scans.load(Ordering::SeqCst), 0);

        let all = catalog.get_all();
        let names: Vec<&str> = all.iter().map(|e| e.display_name.as_str()).collect();
        // byte order puts upper case first
        assert_eq!(names, vec!["Files", "Files", "Firefox", "Terminal", "Zed", "alpha"]);
        assert_eq!(scans.load(Ordering::SeqCst), 1);

        catalog.get_all();
        assert_eq!(scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn concurrent_first_reads_scan_once() {
        let dir = tempdir().unwrap();
        let (catalog, scans, _) = catalog_with(fixtures(), &dir);
        let catalog = Arc::new(catalog);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let catalog = Arc::clone(&catalog);
                thread::spawn(move || catalog.get_all().len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 4);
        }
        assert_eq!(scans.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn empty_scan_is_retried_on_every_read() {
        let dir = tempdir().unwrap();
        let (catalog, scans, _) = catalog_with(Vec::new(), &dir);
        assert!(catalog.get_all().is_empty());
        assert!(catalog.get_categories().is_empty());
        assert_eq!(scans.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn get_by_id_reports_not_found() {
        let dir = tempdir().unwrap();
        let (catalog, _, _) = catalog_with(fixtures(), &dir);
        let found = catalog.get_by_id("/usr/share/applications/firefox.desktop").unwrap();
        assert_eq!(found.name, "Firefox");
        assert!(matches!(catalog.get_by_id("/nope"), Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn search_is_case_insensitive() {
        let dir = tempdir().unwrap();
        let (catalog, _, _) = catalog_with(fixtures(), &dir);
        let mut upper = ids(&catalog.search("FIREFOX")).into_iter().map(String::from).collect::<Vec<_>>();
        let mut lower = ids(&catalog.search("  firefox ")).into_iter().map(String::from).collect::<Vec<_>>();
        upper.sort();
        lower.sort();
        assert_eq!(upper, lower);
        assert_eq!(upper, vec!["/usr/share/applications/firefox.desktop"]);

        assert_eq!(catalog.search("utility").len(), 3);
        assert_eq!(catalog.search("").len(), catalog.get_all().len());
    }

    #[test]
    fn category_queries() {
        let dir = tempdir().unwrap();
        let (catalog, _, _) = catalog_with(fixtures(), &dir);

        let utility = catalog.get_by_category("UTILITY");
        assert_eq!(utility.len(), 3);
        assert_eq!(utility[0].display_name, "Files");
        assert_eq!(utility[2].display_name, "Terminal");

        assert_eq!(
            catalog.get_categories(),
            vec!["FileManager", "Network", "System", "Utility", "WebBrowser", "utility"]
        );
    }

    #[test]
    fn recently_used_orders_and_limits() {
        let dir = tempdir().unwrap();
        let (catalog, _, _) = catalog_with(fixtures(), &dir);
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let stamps = [
            ("/usr/share/applications/firefox.desktop", 10),
            ("/usr/share/applications/files.desktop", 30),
            ("/usr/share/applications/term.desktop", 20),
        ];
        for (id, offset) in stamps {
            let mut e = catalog.get_by_id(id).unwrap();
            e.record_launch(base + Duration::from_secs(offset));
            catalog.save(e);
        }

        let top = catalog.get_recently_used(2);
        assert_eq!(
            ids(&top),
            vec!["/usr/share/applications/files.desktop", "/usr/share/applications/term.desktop"]
        );
        assert_eq!(catalog.get_recently_used(0).len(), 3);
        assert_eq!(catalog.get_recently_used(10).len(), 3);
    }

    #[test]
    fn save_upserts_and_delete_removes() {
        let dir = tempdir().unwrap();
        let (catalog, _, _) = catalog_with(fixtures(), &dir);

        catalog.save(entry("/x/new.desktop", "New", &[]));
        assert_eq!(catalog.get_all().len(), 5);

        let mut firefox = catalog.get_by_id("/usr/share/applications/firefox.desktop").unwrap();
        firefox.display_name = "Firefox Web".into();
        catalog.save(firefox);
        assert_eq!(catalog.get_all().len(), 5);
        assert_eq!(
            catalog.get_by_id("/usr/share/applications/firefox.desktop").unwrap().display_name,
            "Firefox Web"
        );

        assert!(catalog.delete("/x/new.desktop").is_some());
        assert!(catalog.delete("/x/new.desktop").is_none());
        assert_eq!(catalog.get_all().len(), 4);
    }

    #[test]
    fn concurrent_updates_keep_every_change() {
        let dir = tempdir().unwrap();
        let (catalog, _, _) = catalog_with(fixtures(), &dir);
        let id = "/usr/share/applications/term.desktop";

        thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| catalog.update(id, |e| e.record_launch(SystemTime::now())).unwrap());
            }
        });

        assert_eq!(catalog.get_by_id(id).unwrap().use_count, 8);
        assert!(matches!(
            catalog.update("/missing.desktop", |_| {}),
            Err(CatalogError::NotFound(_))
        ));
    }

    #[test]
    fn refresh_rebuilds_from_scratch() {
        let dir = tempdir().unwrap();
        let (catalog, scans, _) = catalog_with(fixtures(), &dir);

        catalog.save(entry("/x/extra.desktop", "Extra", &[]));
        let first = catalog.refresh();
        let first_ids: BTreeSet<String> = catalog.get_all().into_iter().map(|e| e.id).collect();
        let second = catalog.refresh();
        let second_ids: BTreeSet<String> = catalog.get_all().into_iter().map(|e| e.id).collect();

        assert_eq!(first, 4);
        assert_eq!(first, second);
        assert_eq!(first_ids, second_ids);
        assert!(!first_ids.contains("/x/extra.desktop"));
        assert_eq!(scans.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn toggle_favorite_applies_to_every_entry_with_the_name() {
        let dir = tempdir().unwrap();
        let (catalog, _, store) = catalog_with(fixtures(), &dir);
        catalog.get_all();

        assert!(catalog.toggle_favorite("Files").unwrap());
        let favorites = catalog.get_favorites();
        assert_eq!(favorites.len(), 2);
        assert!(favorites.iter().all(|e| e.name == "Files"));
        assert_eq!(store.load().get("Files"), Some(&true));

        assert!(!catalog.toggle_favorite("Files").unwrap());
        assert!(catalog.get_favorites().is_empty());
        assert_eq!(store.load().get("Files"), Some(&false));

        catalog.toggle_favorite("Firefox").unwrap();
        catalog.refresh();
        let firefox = catalog.get_by_id("/usr/share/applications/firefox.desktop").unwrap();
        assert!(firefox.is_favorite);
    }

    #[test]
    fn failed_favorite_write_leaves_memory_unchanged() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "").unwrap();
        let favorites: Arc<dyn FavoritesStore> =
            Arc::new(JsonFavoritesStore::new(blocker.join("favorites.json")));
        let source = CountingSource {
            entries: fixtures(),
            scans: Arc::new(AtomicUsize::new(0)),
        };
        let catalog = Catalog::new(Scanner::new(vec![Box::new(source)], favorites));
        catalog.get_all();

        assert!(matches!(catalog.toggle_favorite("Files"), Err(CatalogError::Io { .. })));
        assert!(catalog.get_favorites().is_empty());
    }
}
