use crate::extract::extract;

/// Boost factor B applied to the first extracted identifier (§4.4).
pub const DEFAULT_BOOST_FACTOR: usize = 3;

/// The exact-match metadata filter synthesized when a query names an
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataFilter {
    pub identifier: String,
}

/// Output of `process` (§4.4): the text actually sent to retrieval, plus an
/// optional exact-match filter.
#[derive(Debug, Clone)]
pub struct PreprocessedQuery {
    pub augmented_text: String,
    pub metadata_filter: Option<MetadataFilter>,
}

/// `process(query) -> (augmented_text, metadata_filter?)` (§4.4). When the
/// query names a recognizable identifier, repeat it `boost` times ahead of
/// the original text (embeddings weight repeated terms more) and pin an
/// exact-match filter on that identifier.
pub fn process(query: &str, boost: usize) -> PreprocessedQuery {
    let identifiers = extract(query);
    match identifiers.into_iter().next() {
        Some(identifier) => {
            let prefix = format!("{} ", identifier).repeat(boost);
            PreprocessedQuery {
                augmented_text: format!("{}{}", prefix, query),
                metadata_filter: Some(MetadataFilter { identifier }),
            }
        }
        None => PreprocessedQuery { augmented_text: query.to_string(), metadata_filter: None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augments_and_filters_on_identifier() {
        let result = process("How do I patch CVE-2024-0001?", DEFAULT_BOOST_FACTOR);
        assert_eq!(result.metadata_filter, Some(MetadataFilter { identifier: "CVE-2024-0001".to_string() }));
        assert_eq!(result.augmented_text, "CVE-2024-0001 CVE-2024-0001 CVE-2024-0001 How do I patch CVE-2024-0001?");
    }

    #[test]
    fn passes_through_when_no_identifier() {
        let result = process("what is the weather today", DEFAULT_BOOST_FACTOR);
        assert!(result.metadata_filter.is_none());
        assert_eq!(result.augmented_text, "what is the weather today");
    }
}
