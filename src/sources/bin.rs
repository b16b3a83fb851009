use crate::error::Result;
use crate::model::{Entry, EntryType};
use crate::sources::Source;
use log::{debug, info, warn};
use std::env;
use std::ffi::OsStr;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use walkdir::WalkDir;

pub const ID_PREFIX: &str = "bin:";
const COMMAND_LINE_CATEGORY: &str = "Command Line";

/// Synthesizes low-fidelity entries for executables on the search path.
///
/// No attempt is made to match these against descriptor entries that
/// launch the same binary, so one program can appear twice.
pub struct BinSource {
    dirs: Vec<PathBuf>,
}

impl BinSource {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }

    pub fn from_env() -> Self {
        let dirs = env::var_os("PATH")
            .map(|path| search_dirs(&path))
            .unwrap_or_default();
        Self::new(dirs)
    }
}

/// Absolute directories of a `PATH`-style list. Relative parts like `.` are dropped.
fn search_dirs(path: &OsStr) -> Vec<PathBuf> {
    env::split_paths(path)
        .filter(|dir| {
            let keep = dir.is_absolute();
            if !keep && !dir.as_os_str().is_empty() {
                debug!("Skipping relative PATH entry {:?}", dir);
            }
            keep
        })
        .collect()
}

impl Source for BinSource {
    fn name(&self) -> &'static str {
        "bin"
    }

    fn scan(&self) -> Result<Vec<Entry>> {
        let mut entries = Vec::new();

        for dir in &self.dirs {
            if !dir.is_dir() {
                continue;
            }
            debug!("Scanning binaries in {:?}", dir);

            let walker = WalkDir::new(dir)
                .min_depth(1)
                .max_depth(1)
                .follow_links(true)
                .sort_by_file_name();
            for item in walker {
                let item = match item {
                    Ok(item) => item,
                    Err(err) => {
                        warn!("Cannot read entry under {:?}: {}", dir, err);
                        continue;
                    }
                };
                if !item.file_type().is_file() {
                    continue;
                }
                let Ok(metadata) = item.metadata() else { continue };
                if metadata.permissions().mode() & 0o111 == 0 {
                    continue;
                }
                let Some(file_name) = item.file_name().to_str() else { continue };

                let path = item.path().to_string_lossy().into_owned();
                let mut entry = Entry::new(
                    format!("{ID_PREFIX}{path}"),
                    file_name.to_string(),
                    path,
                    EntryType::Binary,
                );
                entry.description = format!("command-line executable from {}", dir.display());
                entry.add_category(COMMAND_LINE_CATEGORY);
                entries.push(entry);
            }
        }

        info!("BinSource: found {} entries", entries.len());
        Ok(entries)
    }
}
