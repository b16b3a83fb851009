use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const FAVORITES_FILE: &str = "favorites.json";
const HISTORY_FILE: &str = "history.json";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub sources: SourceConfig,
    #[serde(default)]
    pub filter: FilterConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_true")]
    pub persist_usage: bool,
    #[serde(default)]
    pub favorites_file: Option<PathBuf>,
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            persist_usage: true,
            favorites_file: None,
            history_file: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_true")]
    pub scan_desktop: bool,
    #[serde(default)]
    pub scan_path: bool,
    /// Replaces the default descriptor roots when set.
    #[serde(default)]
    pub desktop_dirs: Option<Vec<PathBuf>>,
}

fn default_true() -> bool { true }

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            scan_desktop: true,
            scan_path: false,
            desktop_dirs: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct FilterConfig {
    /// Regexes matched against name, id and exec command.
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl Config {
    pub fn favorites_path(&self) -> PathBuf {
        self.general.favorites_file.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.config_dir().join(FAVORITES_FILE))
                .unwrap_or_else(|| PathBuf::from(FAVORITES_FILE))
        })
    }

    pub fn history_path(&self) -> PathBuf {
        self.general.history_file.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.data_dir().join(HISTORY_FILE))
                .unwrap_or_else(|| PathBuf::from(HISTORY_FILE))
        })
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("org", "launchy", "launchy")
}

pub fn load_config() -> Result<Config> {
    let config_path = match project_dirs() {
        Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
        None => PathBuf::from(CONFIG_FILE),
    };
    load_config_from(&config_path)
}

pub fn load_config_from(config_path: &Path) -> Result<Config> {
    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("reading {}", config_path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("parsing {}", config_path.display()))?;
    Ok(config)
}
