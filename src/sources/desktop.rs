use crate::error::Result;
use crate::model::{Entry, EntryType};
use crate::sources::Source;
use directories::BaseDirs;
use log::{debug, info, warn};
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use walkdir::WalkDir;

const APPLICATION_SECTION: &str = "[Desktop Entry]";
const DESKTOP_EXTENSION: &str = "desktop";

static EXEC_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%[UuFfk]").expect("placeholder pattern compiles"));

/// Result of reading one descriptor file.
#[derive(Debug)]
pub enum ParseOutcome {
    Valid(Entry),
    NotAnApplication,
    Unreadable(io::Error),
}

/// Scans `.desktop` descriptors in a fixed, ordered list of roots.
pub struct DesktopSource {
    roots: Vec<PathBuf>,
}

impl DesktopSource {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    pub fn with_default_roots() -> Self {
        Self::new(default_roots())
    }
}

/// System-wide roots first, then the user's own applications directory.
pub fn default_roots() -> Vec<PathBuf> {
    let mut roots = vec![
        PathBuf::from("/usr/share/applications"),
        PathBuf::from("/usr/local/share/applications"),
    ];
    if let Some(base_dirs) = BaseDirs::new() {
        roots.push(base_dirs.data_dir().join("applications"));
    }
    roots
}

impl Source for DesktopSource {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn scan(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();

        for root in &self.roots {
            if !root.is_dir() {
                debug!("Desktop root {:?} does not exist, skipping", root);
                continue;
            }
            debug!("Scanning desktop files in {:?}", root);
            let before = entries.len();
            let skipped = scan_root(root, &mut entries);
            info!(
                "DesktopSource: {:?} yielded {} entries ({} skipped)",
                root,
                entries.len() - before,
                skipped
            );
        }

        Ok(entries)
    }
}

fn scan_root(root: &Path, entries: &mut Vec<Entry>) -> usize {
    let mut skipped = 0;
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name();

    for item in walker {
        let item = match item {
            Ok(item) => item,
            Err(err) => {
                warn!("Cannot read entry under {:?}: {}", root, err);
                continue;
            }
        };
        let path = item.path();
        if !item.file_type().is_file()
            || path.extension().and_then(|s| s.to_str()) != Some(DESKTOP_EXTENSION)
        {
            continue;
        }

        match parse_desktop_file(path) {
            ParseOutcome::Valid(entry) => entries.push(entry),
            ParseOutcome::NotAnApplication => {
                debug!("Skipping {:?}: missing Name or Exec", path);
                skipped += 1;
            }
            ParseOutcome::Unreadable(err) => {
                debug!("Skipping unreadable {:?}: {}", path, err);
                skipped += 1;
            }
        }
    }

    skipped
}

/// Reads and parses one descriptor. The entry id is the canonical path.
pub fn parse_desktop_file(path: &Path) -> ParseOutcome {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => return ParseOutcome::Unreadable(err),
    };
    let id = fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned();
    parse_desktop_entry(id, &content)
}

pub fn parse_desktop_entry(id: String, content: &str) -> ParseOutcome {
    let mut entry = Entry::new(id, String::new(), String::new(), EntryType::Desktop);
    let mut in_section = false;

    for line in content.lines() {
        let line = line.trim();

        if line.starts_with('[') && line.ends_with(']') {
            if in_section {
                break;
            }
            in_section = line == APPLICATION_SECTION;
            continue;
        }

        if !in_section || line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "Name" => {
                entry.display_name = value.to_string();
                if entry.name.is_empty() {
                    entry.name = value.to_string();
                }
            }
            "Comment" => entry.description = value.to_string(),
            "Exec" => entry.exec_command = clean_exec(value),
            "Icon" => entry.icon = (!value.is_empty()).then(|| value.to_string()),
            "Categories" => {
                entry.categories.clear();
                value.split(';').for_each(|c| entry.add_category(c));
            }
            "Keywords" => {
                entry.keywords.clear();
                value.split(';').for_each(|k| entry.add_keyword(k));
            }
            _ => {}
        }
    }

    if entry.name.is_empty() || entry.display_name.is_empty() || entry.exec_command.is_empty() {
        return ParseOutcome::NotAnApplication;
    }
    ParseOutcome::Valid(entry)
}

/// Drops field codes and every argument, keeping only the program.
pub fn clean_exec(raw: &str) -> String {
    EXEC_PLACEHOLDER
        .replace_all(raw, "")
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string()
}
