use crate::model::Entry;

const NAME_WEIGHT: f64 = 100.0;
const DISPLAY_NAME_WEIGHT: f64 = 80.0;
const KEYWORD_WEIGHT: f64 = 60.0;
const DESCRIPTION_WEIGHT: f64 = 40.0;
const CATEGORY_WEIGHT: f64 = 30.0;
const FAVORITE_BOOST: f64 = 20.0;
const USAGE_STEP: f64 = 0.1;
const USAGE_CAP: f64 = 10.0;

/// Lower-cases and trims a raw query.
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

fn contains(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

/// True if any searchable field contains the normalized query.
pub fn matches_query(entry: &Entry, query: &str) -> bool {
    contains(&entry.name, query)
        || contains(&entry.display_name, query)
        || contains(&entry.description, query)
        || contains(&entry.exec_command, query)
        || entry.keywords.iter().any(|k| contains(k, query))
        || entry.categories.iter().any(|c| contains(c, query))
}

pub trait Ranker: Send + Sync {
    fn score(&self, entry: &Entry, query: &str) -> f64;

    /// Orders by score, highest first; equal scores fall back to display name.
    fn rank(&self, entries: Vec<Entry>, query: &str) -> Vec<Entry> {
        let query = normalize_query(query);
        let mut scored: Vec<(f64, Entry)> = entries
            .into_iter()
            .map(|e| (self.score(&e, &query), e))
            .collect();
        scored.sort_by(|(a_score, a), (b_score, b)| {
            b_score
                .total_cmp(a_score)
                .then_with(|| a.display_name.cmp(&b.display_name))
        });
        scored.into_iter().map(|(_, entry)| entry).collect()
    }
}

/// Weighted field relevance with small favorite and usage boosts.
#[derive(Debug, Default, Clone, Copy)]
pub struct RelevanceRanker;

impl Ranker for RelevanceRanker {
    fn score(&self, entry: &Entry, query: &str) -> f64 {
        let mut score = 0.0;

        if contains(&entry.name, query) {
            score += NAME_WEIGHT;
        }
        if contains(&entry.display_name, query) {
            score += DISPLAY_NAME_WEIGHT;
        }
        let keyword_hits = entry.keywords.iter().filter(|k| contains(k, query)).count();
        score += keyword_hits as f64 * KEYWORD_WEIGHT;
        if contains(&entry.description, query) {
            score += DESCRIPTION_WEIGHT;
        }
        let category_hits = entry.categories.iter().filter(|c| contains(c, query)).count();
        score += category_hits as f64 * CATEGORY_WEIGHT;

        if entry.is_favorite {
            score += FAVORITE_BOOST;
        }
        score + (entry.use_count as f64 * USAGE_STEP).min(USAGE_CAP)
    }
}
