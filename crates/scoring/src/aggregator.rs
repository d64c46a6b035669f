use integrity_vault::IntegritySignals;

/// 2-of-4 quarantine rule (§3, §4.6): `should_quarantine = |{s : s < Θ}| ≥
/// Q`. The aggregator never weighs the signals — weights are reserved for a
/// future mode (§9) and are not consulted here.
pub fn aggregate(trust: f64, red_flag: f64, anomaly: f64, semantic_drift: f64, theta: f64, quorum: usize) -> IntegritySignals {
    let below_threshold = [trust, red_flag, anomaly, semantic_drift].iter().filter(|s| **s < theta).count();
    let should_quarantine = below_threshold >= quorum;
    IntegritySignals::clipped(trust, red_flag, anomaly, semantic_drift, should_quarantine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn p2_two_below_threshold_quarantines() {
        let signals = aggregate(0.0, 0.2, 0.9, 0.9, 0.5, 2);
        assert!(signals.should_quarantine);
    }

    #[test]
    fn p2_only_one_below_threshold_does_not_quarantine() {
        let signals = aggregate(0.0, 0.9, 0.9, 0.9, 0.5, 2);
        assert!(!signals.should_quarantine);
    }

    #[test]
    fn p1_signals_are_clipped_into_range() {
        let signals = aggregate(-1.0, 2.0, 0.5, 0.5, 0.5, 2);
        assert_eq!(signals.trust, 0.0);
        assert_eq!(signals.red_flag, 1.0);
    }
}
