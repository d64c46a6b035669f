use integrity_retrieval::DocumentCategory;
use std::collections::HashMap;

/// Lines starting with these markers are pre-filtered from `golden`
/// documents before scanning for red-flag phrases (§4.6 step 1) — they
/// document counter-examples rather than instruct the reader.
const GOLDEN_WARNING_MARKERS: [&str; 4] = ["never ", "warning:", "- never", "do not "];

/// Configured `category -> phrase list` table (§4.6 red-flag scorer),
/// grouped into five semantic categories.
#[derive(Debug, Clone, Default)]
pub struct RedFlagTable {
    categories: HashMap<String, Vec<String>>,
}

impl RedFlagTable {
    pub fn new(categories: HashMap<String, Vec<String>>) -> Self {
        Self { categories }
    }

    fn max_possible_phrases(&self) -> usize {
        self.categories.values().map(|v| v.len()).sum()
    }

    /// `red_flag(content, category)` (§4.6).
    pub fn score(&self, content: &str, category: DocumentCategory) -> f64 {
        let scanned = if category == DocumentCategory::Golden {
            filter_golden_warnings(content)
        } else {
            content.to_string()
        };
        let lower = scanned.to_lowercase();

        let m = self.max_possible_phrases();
        if m == 0 {
            return 1.0;
        }

        let mut total_hits = 0usize;
        let mut categories_hit = 0usize;
        for phrases in self.categories.values() {
            let mut hit_this_category = false;
            for phrase in phrases {
                let count = lower.matches(&phrase.to_lowercase()).count();
                if count > 0 {
                    total_hits += count;
                    hit_this_category = true;
                }
            }
            if hit_this_category {
                categories_hit += 1;
            }
        }

        let base = (1.0 - 1.5 * (total_hits as f64 / m as f64)).clamp(0.0, 1.0);
        let multiplier = if categories_hit >= 4 {
            0.60
        } else if categories_hit >= 3 {
            0.70
        } else if categories_hit >= 2 {
            0.80
        } else {
            1.0
        };

        (base * multiplier).clamp(0.0, 1.0)
    }
}

fn filter_golden_warnings(content: &str) -> String {
    content
        .lines()
        .filter(|line| {
            let lower = line.to_lowercase();
            !GOLDEN_WARNING_MARKERS.iter().any(|marker| lower.contains(marker))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RedFlagTable {
        let mut categories = HashMap::new();
        categories.insert(
            "security-downgrade".to_string(),
            vec!["disable firewall".to_string(), "skip verification".to_string()],
        );
        categories.insert("dangerous-permissions".to_string(), vec!["chmod 777".to_string()]);
        categories.insert("severity-downplay".to_string(), vec!["not urgent".to_string(), "low priority".to_string()]);
        categories.insert("unsafe-operations".to_string(), vec!["rm -rf /".to_string()]);
        categories.insert("social-engineering".to_string(), vec!["urgent action required".to_string()]);
        RedFlagTable::new(categories)
    }

    #[test]
    fn clean_content_scores_near_one() {
        let score = table().score("This document describes a routine patch procedure.", DocumentCategory::Clean);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn multi_category_hits_are_penalized_below_midpoint() {
        let content = "disable firewall, chmod 777, skip verification, not urgent, low priority";
        let score = table().score(content, DocumentCategory::Poisoned);
        assert!(score < 0.5, "expected score < 0.5, got {}", score);
    }

    #[test]
    fn golden_documents_filter_warning_lines() {
        let content = "Never disable firewall rules in production.\nThis is a safe baseline configuration.";
        let score = table().score(content, DocumentCategory::Golden);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn p9_adding_red_flag_phrase_never_increases_score() {
        let table = table();
        let base = "A routine guide with no issues.";
        let with_flag = format!("{} Also, please disable firewall.", base);
        assert!(table.score(&with_flag, DocumentCategory::Clean) <= table.score(base, DocumentCategory::Clean));
    }
}
