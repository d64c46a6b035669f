use crate::aggregator::aggregate;
use crate::anomaly;
use crate::drift::GoldenCorpus;
use crate::red_flag::RedFlagTable;
use crate::trust::TrustTable;
use integrity_retrieval::{Document, Embedder};
use integrity_vault::IntegritySignals;
use std::sync::Arc;

/// The four signals for one document, plus whether the semantic-drift
/// embedding call degraded to the mid-point default (§7 `SCORER_ERROR`:
/// "scorer's score defaults to 0.5 ... pipeline continues").
#[derive(Debug, Clone)]
pub struct ScoreOutcome {
    pub signals: IntegritySignals,
    pub drift_degraded: bool,
}

/// Wires the four independent scorers (§4.6) plus the 2-of-4 aggregator.
/// Each scorer is pure over its inputs and never observes the others; the
/// only suspending call here is the semantic-drift embedding.
pub struct ScorerSet {
    trust_table: TrustTable,
    red_flag_table: RedFlagTable,
    golden_corpus: GoldenCorpus,
    embedder: Arc<dyn Embedder>,
    theta: f64,
    quorum: usize,
}

impl ScorerSet {
    pub fn new(
        trust_table: TrustTable,
        red_flag_table: RedFlagTable,
        golden_corpus: GoldenCorpus,
        embedder: Arc<dyn Embedder>,
        theta: f64,
        quorum: usize,
    ) -> Self {
        Self { trust_table, red_flag_table, golden_corpus, embedder, theta, quorum }
    }

    /// The trust score alone, used by callers to assemble the sibling-trust
    /// slice the anomaly scorer needs before fanning out full scoring.
    pub fn trust_score(&self, source: &str) -> f64 {
        self.trust_table.score(source)
    }

    /// Score a single document against the sibling set of the current
    /// retrieval (§4.6 anomaly scorer's input).
    pub async fn score(&self, doc: &Document, sibling_sources: &[String], sibling_trust: &[f64]) -> ScoreOutcome {
        let trust = self.trust_table.score(&doc.metadata.source);
        let red_flag = self.red_flag_table.score(&doc.content, doc.metadata.category);
        let anomaly_score = anomaly::score(sibling_sources, sibling_trust);

        let (semantic_drift, drift_degraded) = match self.embedder.embed(&doc.content).await {
            Ok(vector) => (self.golden_corpus.score(&vector), false),
            Err(_) => (0.5, true),
        };

        let signals = aggregate(trust, red_flag, anomaly_score, semantic_drift, self.theta, self.quorum);
        ScoreOutcome { signals, drift_degraded }
    }
}
