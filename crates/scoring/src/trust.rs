use std::collections::HashMap;

/// Source-trust lookup table (§4.6 trust scorer): known-good prefixes map to
/// 1.0, known-bad to 0.0, absent entries default to 0.5. Ties broken by
/// longest matching prefix.
#[derive(Debug, Clone, Default)]
pub struct TrustTable {
    entries: HashMap<String, f64>,
}

/// A document's integrity signal defaults to this when its source has no
/// configured entry.
pub const UNKNOWN_SOURCE_TRUST: f64 = 0.5;

impl TrustTable {
    pub fn new(entries: HashMap<String, f64>) -> Self {
        Self { entries }
    }

    /// `trust(source)`: the configured score for the longest prefix of
    /// `source` present in the table, or 0.5 if nothing matches.
    pub fn score(&self, source: &str) -> f64 {
        self.entries
            .iter()
            .filter(|(prefix, _)| source.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, score)| *score)
            .unwrap_or(UNKNOWN_SOURCE_TRUST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TrustTable {
        let mut entries = HashMap::new();
        entries.insert("nvd.nist.gov".to_string(), 1.0);
        entries.insert("nist.gov".to_string(), 1.0);
        entries.insert("unknown-security-site.com".to_string(), 0.0);
        TrustTable::new(entries)
    }

    #[test]
    fn known_good_source_scores_one() {
        assert_eq!(table().score("nvd.nist.gov"), 1.0);
    }

    #[test]
    fn known_bad_source_scores_zero() {
        assert_eq!(table().score("unknown-security-site.com"), 0.0);
    }

    #[test]
    fn absent_source_defaults_to_midpoint() {
        assert_eq!(table().score("example.com"), UNKNOWN_SOURCE_TRUST);
    }

    #[test]
    fn longest_matching_prefix_wins() {
        let mut entries = HashMap::new();
        entries.insert("nist".to_string(), 0.2);
        entries.insert("nist.gov".to_string(), 1.0);
        let table = TrustTable::new(entries);
        assert_eq!(table.score("nist.gov"), 1.0);
    }
}
