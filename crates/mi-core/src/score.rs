use serde::{Deserialize, Serialize};

use crate::catalog::DocumentDescriptor;
use crate::constants::{PATH_HIT_WEIGHT, TASK_HIT_WEIGHT};

/// How a keyword is located inside the task text and path hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Plain substring containment: "react" matches inside "reactive".
    #[default]
    Substring,
    /// The keyword must not be flanked by letters, digits or underscores.
    WordBoundary,
}

impl MatchStrategy {
    pub fn matches(self, haystack: &str, keyword: &str) -> bool {
        match self {
            MatchStrategy::Substring => haystack.contains(keyword),
            MatchStrategy::WordBoundary => word_boundary_match(haystack, keyword),
        }
    }
}

// Candidates may overlap, so the search resumes one char past each start.
fn word_boundary_match(haystack: &str, keyword: &str) -> bool {
    let Some(step) = keyword.chars().next().map(char::len_utf8) else {
        return true;
    };

    let mut from = 0;
    while let Some(offset) = haystack[from..].find(keyword) {
        let start = from + offset;
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + keyword.len()..].chars().next();
        if !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char) {
            return true;
        }
        from = start + step;
    }
    false
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// A catalog entry with its relevance for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredDescriptor {
    pub descriptor: DocumentDescriptor,
    pub score: u32,
}

/// Score a descriptor with substring matching.
///
/// `task_lower` and `path_hints_lower` must already be lower-cased.
/// Each keyword adds 2 when found in the task and 1 per path hint containing it.
pub fn score(descriptor: &DocumentDescriptor, task_lower: &str, path_hints_lower: &[String]) -> u32 {
    score_with(MatchStrategy::Substring, descriptor, task_lower, path_hints_lower)
}

pub fn score_with(
    strategy: MatchStrategy,
    descriptor: &DocumentDescriptor,
    task_lower: &str,
    path_hints_lower: &[String],
) -> u32 {
    let mut total = 0;
    for keyword in &descriptor.keywords {
        if strategy.matches(task_lower, keyword) {
            total += TASK_HIT_WEIGHT;
        }
        for hint in path_hints_lower {
            if strategy.matches(hint, keyword) {
                total += PATH_HIT_WEIGHT;
            }
        }
    }
    total
}

/// Scores whole catalogs, lower-casing the request inputs once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer {
    strategy: MatchStrategy,
}

impl Scorer {
    pub fn new(strategy: MatchStrategy) -> Self {
        Self { strategy }
    }

    /// Score every entry, preserving catalog order.
    pub fn score_all(
        &self,
        entries: &[DocumentDescriptor],
        task: &str,
        path_hints: &[String],
    ) -> Vec<ScoredDescriptor> {
        let task_lower = task.to_lowercase();
        let hints_lower: Vec<String> = path_hints.iter().map(|h| h.to_lowercase()).collect();

        entries
            .iter()
            .map(|descriptor| ScoredDescriptor {
                score: score_with(self.strategy, descriptor, &task_lower, &hints_lower),
                descriptor: descriptor.clone(),
            })
            .collect()
    }
}
