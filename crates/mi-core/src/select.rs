use crate::catalog::DocumentDescriptor;
use crate::constants::{FALLBACK_SCORE, GENERAL_RULES_FILE, MAX_MANUALS};
use crate::score::{ScoredDescriptor, Scorer};

/// Cap and fallback applied when choosing manuals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPolicy {
    pub max_selected: usize,
    /// `file_ref` of the manual used when nothing scores.
    pub fallback_file: String,
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            max_selected: MAX_MANUALS,
            fallback_file: GENERAL_RULES_FILE.to_string(),
        }
    }
}

/// Drop zero scores, order by score descending and cap.
///
/// The sort is stable: equal scores keep catalog order, so two equally
/// relevant manuals come out the same way on every request.
pub fn rank(scored: Vec<ScoredDescriptor>, policy: &SelectionPolicy) -> Vec<ScoredDescriptor> {
    let mut ranked: Vec<ScoredDescriptor> = scored.into_iter().filter(|s| s.score > 0).collect();
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(policy.max_selected);
    ranked
}

/// Choose the manuals to inject for a task.
///
/// Falls back to the general rules manual alone (score 1) when no entry
/// scores, or to nothing when the catalog has no such manual.
pub fn select(
    entries: &[DocumentDescriptor],
    task: &str,
    path_hints: &[String],
    scorer: &Scorer,
    policy: &SelectionPolicy,
) -> Vec<ScoredDescriptor> {
    let ranked = rank(scorer.score_all(entries, task, path_hints), policy);
    if !ranked.is_empty() {
        return ranked;
    }

    entries
        .iter()
        .find(|e| e.file_ref == policy.fallback_file)
        .map(|general| ScoredDescriptor {
            descriptor: general.clone(),
            score: FALLBACK_SCORE,
        })
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::parse_catalog;
    use proptest::prelude::*;

    fn entry(name: &str, file: &str, keywords: &[&str]) -> DocumentDescriptor {
        DocumentDescriptor {
            name: name.to_string(),
            file_ref: file.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
        }
    }

    fn names(selected: &[ScoredDescriptor]) -> Vec<&str> {
        selected.iter().map(|s| s.descriptor.name.as_str()).collect()
    }

    fn run(entries: &[DocumentDescriptor], task: &str) -> Vec<ScoredDescriptor> {
        select(
            entries,
            task,
            &[],
            &Scorer::default(),
            &SelectionPolicy::default(),
        )
    }

    #[test]
    fn test_highest_score_first() {
        let entries = vec![
            entry("Db", "db.md", &["sql"]),
            entry("Api", "api.md", &["api", "endpoint"]),
        ];
        let selected = run(&entries, "add api endpoint with sql");
        assert_eq!(names(&selected), vec!["Api", "Db"]);
        assert_eq!(selected[0].score, 4);
        assert_eq!(selected[1].score, 2);
    }

    #[test]
    fn test_ties_keep_catalog_order() {
        let entries = vec![
            entry("First", "first.md", &["alpha"]),
            entry("Second", "second.md", &["beta"]),
            entry("Third", "third.md", &["gamma"]),
        ];
        let selected = run(&entries, "gamma beta alpha");
        assert_eq!(names(&selected), vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_capped_at_three() {
        let entries: Vec<DocumentDescriptor> = (0..6)
            .map(|i| entry(&format!("M{i}"), &format!("m{i}.md"), &["shared"]))
            .collect();
        let selected = run(&entries, "shared work");
        assert_eq!(names(&selected), vec!["M0", "M1", "M2"]);
    }

    #[test]
    fn test_fallback_to_general_rules() {
        let entries = vec![
            entry("Security Rules", "security_rules.md", &["auth"]),
            entry("General Rules", "general_rules.md", &["general"]),
        ];
        let selected = run(&entries, "refactor css spacing");
        assert_eq!(names(&selected), vec!["General Rules"]);
        assert_eq!(selected[0].score, FALLBACK_SCORE);
    }

    #[test]
    fn test_no_fallback_available() {
        let entries = vec![entry("Security Rules", "security_rules.md", &["auth"])];
        assert!(run(&entries, "refactor css spacing").is_empty());
    }

    #[test]
    fn test_general_rules_scored_normally_when_matching() {
        let entries = vec![
            entry("General Rules", "general_rules.md", &["style"]),
            entry("Css", "css.md", &["css"]),
        ];
        let selected = run(&entries, "css style cleanup");
        assert_eq!(names(&selected), vec!["General Rules", "Css"]);
    }

    #[test]
    fn test_custom_policy() {
        let entries = vec![
            entry("A", "a.md", &["x"]),
            entry("B", "b.md", &["x"]),
            entry("Base", "base.md", &["base"]),
        ];
        let policy = SelectionPolicy {
            max_selected: 1,
            fallback_file: "base.md".to_string(),
        };
        let scorer = Scorer::default();
        assert_eq!(names(&select(&entries, "x", &[], &scorer, &policy)), vec!["A"]);
        assert_eq!(names(&select(&entries, "y", &[], &scorer, &policy)), vec!["Base"]);
    }

    #[test]
    fn test_path_hints_drive_selection() {
        let catalog = parse_catalog(
            "| React Rules | react_rules.md | react, component |\n\
             | Api Rules | api_rules.md | api |\n",
        );
        let hints = vec!["src/components/Button.tsx".to_string()];
        let selected = select(
            &catalog.entries,
            "fix the button",
            &hints,
            &Scorer::default(),
            &SelectionPolicy::default(),
        );
        assert_eq!(names(&selected), vec!["React Rules"]);
        assert_eq!(selected[0].score, 1);
    }

    proptest! {
        #[test]
        fn prop_never_more_than_cap(task in "[a-e ]{0,30}", count in 0usize..10) {
            let entries: Vec<DocumentDescriptor> = (0..count)
                .map(|i| entry(&format!("M{i}"), &format!("m{i}.md"), &["a", "b"]))
                .collect();
            let selected = run(&entries, &task);
            prop_assert!(selected.len() <= MAX_MANUALS);
            for pair in selected.windows(2) {
                prop_assert!(pair[0].score >= pair[1].score);
            }
        }
    }
}
