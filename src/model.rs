use serde::Serialize;
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Desktop,
    Binary,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: String,               // Canonical descriptor path, or "bin:<path>"
    pub name: String,             // Short name, also the favorites key
    pub display_name: String,     // Human-facing name
    pub description: String,
    pub exec_command: String,     // Single program, arguments stripped
    pub icon: Option<String>,     // Icon name/path
    pub categories: Vec<String>,
    pub keywords: Vec<String>,
    pub installed_at: SystemTime,
    pub last_used_at: Option<SystemTime>,
    pub use_count: u32,
    pub is_favorite: bool,
    pub entry_type: EntryType,
}

impl Entry {
    pub fn new(id: String, name: String, exec_command: String, entry_type: EntryType) -> Self {
        Self {
            id,
            display_name: name.clone(),
            name,
            description: String::new(),
            exec_command,
            icon: None,
            categories: Vec::new(),
            keywords: Vec::new(),
            installed_at: SystemTime::now(),
            last_used_at: None,
            use_count: 0,
            is_favorite: false,
            entry_type,
        }
    }

    /// Adds a category unless it is blank or already present.
    pub fn add_category(&mut self, category: &str) {
        push_unique(&mut self.categories, category);
    }

    /// Adds a keyword unless it is blank or already present.
    pub fn add_keyword(&mut self, keyword: &str) {
        push_unique(&mut self.keywords, keyword);
    }

    pub fn record_launch(&mut self, at: SystemTime) {
        self.use_count = self.use_count.saturating_add(1);
        self.last_used_at = Some(at);
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() || list.iter().any(|v| v == value) {
        return;
    }
    list.push(value.to_string());
}
