/// `anomaly(retrieved_set)` (§4.6). Computed once per query over the
/// retrieved set's sources and trust scores; the same value is assigned to
/// every document in that set since the signal is a property of the set,
/// not of an individual document.
pub fn score(sources: &[String], trust_scores: &[f64]) -> f64 {
    if sources.is_empty() {
        return UNKNOWN_SET_ANOMALY;
    }

    let unique_sources = sources.iter().collect::<std::collections::HashSet<_>>().len();
    let diversity_ratio = unique_sources as f64 / sources.len() as f64;
    let diversity = if diversity_ratio >= 0.7 {
        1.0
    } else if diversity_ratio >= 0.4 {
        0.7
    } else {
        0.5
    };

    let penalty = variance_penalty(trust_scores);
    (diversity - penalty).clamp(0.0, 1.0)
}

/// Default for an empty retrieved set (should not occur in practice since
/// the scorer is only invoked on non-empty retrievals, but keeps the
/// function total).
const UNKNOWN_SET_ANOMALY: f64 = 0.5;

fn variance_penalty(trust_scores: &[f64]) -> f64 {
    if trust_scores.is_empty() {
        return 0.0;
    }
    let mean = trust_scores.iter().sum::<f64>() / trust_scores.len() as f64;
    let variance = trust_scores.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / trust_scores.len() as f64;
    let std_dev = variance.sqrt();
    if std_dev <= 0.0 {
        return 0.0;
    }
    let min_trust = trust_scores.iter().cloned().fold(f64::INFINITY, f64::min);
    if ((min_trust - mean) / std_dev).abs() > 2.0 {
        0.3
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diverse_sources_score_high() {
        let sources = vec!["a.com".to_string(), "b.com".to_string(), "c.com".to_string()];
        let trust = vec![0.9, 0.9, 0.9];
        assert_eq!(score(&sources, &trust), 1.0);
    }

    #[test]
    fn low_diversity_scores_mid() {
        let sources = vec!["a.com".to_string(), "a.com".to_string(), "a.com".to_string()];
        let trust = vec![0.9, 0.9, 0.9];
        assert_eq!(score(&sources, &trust), 0.5);
    }

    #[test]
    fn outlier_trust_applies_variance_penalty() {
        let sources = vec!["a.com".to_string(), "b.com".to_string(), "c.com".to_string(), "d.com".to_string()];
        let trust = vec![0.9, 0.9, 0.9, 0.0];
        let s = score(&sources, &trust);
        assert!(s < 1.0);
    }
}
