//! Fuzzy lookup of library services.
//!
//! Each service carries a list of keywords. A query is scored against every
//! keyword with normalized Damerau-Levenshtein similarity, both as a whole and
//! window-by-window over the query's words, so a keyword buried in a longer
//! sentence still scores well. The best-scoring keyword wins if it reaches
//! the configured threshold.
//!
//! Keywords shorter than [`MIN_FUZZY_LEN`] characters must match exactly.

use serde::Serialize;

use crate::config::ServicesConfig;
use crate::models::LibraryService;

/// Shortest keyword (in characters) that accepts a non-exact match.
pub const MIN_FUZZY_LEN: usize = 6;

#[derive(Debug, Clone, Serialize)]
pub struct ServiceMatch {
    pub service: LibraryService,
    pub keyword: String,
    /// Similarity on a 0-100 scale.
    pub score: f64,
}

impl ServiceMatch {
    pub fn reply_text(&self) -> String {
        format!(
            "🔗 **{}**\n{}\n\n{}",
            self.service.name, self.service.description, self.service.url
        )
    }
}

#[derive(Debug, Clone)]
pub struct ServiceTable {
    services: Vec<LibraryService>,
    threshold: f64,
}

impl ServiceTable {
    pub fn new(services: Vec<LibraryService>, threshold: f64) -> Self {
        Self {
            services,
            threshold,
        }
    }

    pub fn from_config(cfg: &ServicesConfig) -> Self {
        Self::new(cfg.entries.clone(), cfg.threshold)
    }

    pub fn services(&self) -> &[LibraryService] {
        &self.services
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Best match above the threshold, if any. Ties go to the earlier service.
    pub fn lookup(&self, query: &str) -> Option<ServiceMatch> {
        let query = normalize(query);
        if query.is_empty() {
            return None;
        }

        let mut best: Option<ServiceMatch> = None;
        for service in &self.services {
            for keyword in &service.keywords {
                let kw = normalize(keyword);
                if kw.is_empty() {
                    continue;
                }
                let score = keyword_score(&query, &kw);
                if score < self.required_score(&kw) {
                    continue;
                }
                if best.as_ref().map_or(true, |b| score > b.score) {
                    best = Some(ServiceMatch {
                        service: service.clone(),
                        keyword: keyword.clone(),
                        score,
                    });
                }
            }
        }

        best
    }

    fn required_score(&self, keyword: &str) -> f64 {
        if keyword.chars().count() < MIN_FUZZY_LEN {
            100.0
        } else {
            self.threshold
        }
    }
}

/// Lowercase, strip punctuation, collapse whitespace.
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity (0-100) between a normalized query and a normalized keyword.
pub fn keyword_score(query: &str, keyword: &str) -> f64 {
    let mut best = strsim::normalized_damerau_levenshtein(query, keyword);

    let words: Vec<&str> = query.split_whitespace().collect();
    let width = keyword.split_whitespace().count().max(1);
    if words.len() > width {
        for window in words.windows(width) {
            let candidate = window.join(" ");
            let sim = strsim::normalized_damerau_levenshtein(&candidate, keyword);
            if sim > best {
                best = sim;
            }
        }
    }

    (best * 100.0).round()
}
