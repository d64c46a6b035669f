use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

static CVE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)CVE-\d{4}-\d{4,7}").expect("failed to compile CVE regex"));

/// Extract the fixed set of recognized entities from `text` (§4.4). Today
/// this is CVE-style identifiers only; additional extractors (software
/// names, versions) would be added here behind the same `(text) -> set`
/// shape, normalizing to upper case and preserving first-occurrence order.
pub fn extract(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut ordered = Vec::new();
    for m in CVE_REGEX.find_iter(text) {
        let normalized = m.as_str().to_uppercase();
        if seen.insert(normalized.clone()) {
            ordered.push(normalized);
        }
    }
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_single_identifier() {
        let ids = extract("How do I patch CVE-2024-0001?");
        assert_eq!(ids, vec!["CVE-2024-0001"]);
    }

    #[test]
    fn normalizes_case_and_dedupes() {
        let ids = extract("cve-2024-0001 mentioned twice: CVE-2024-0001");
        assert_eq!(ids, vec!["CVE-2024-0001"]);
    }

    #[test]
    fn preserves_first_occurrence_order() {
        let ids = extract("related to CVE-2024-0002 and also CVE-2024-0001");
        assert_eq!(ids, vec!["CVE-2024-0002", "CVE-2024-0001"]);
    }

    #[test]
    fn no_identifiers_returns_empty() {
        assert!(extract("no identifiers in this query").is_empty());
    }

    #[test]
    fn case_normalization_law_l2() {
        let text = "See cve-2024-0003 for details";
        let upper = text.to_uppercase();
        assert_eq!(extract(text), extract(&upper));
    }
}
