use crate::generator::Generator;
use integrity_core::error::{Error, Result};
use integrity_core::events::{self, EventBus, EventCode};
use integrity_core::lineage::{LineageAction, LineageRecord, LineageStore};
use integrity_retrieval::RetrievalAdapter;
use integrity_scoring::ScorerSet;
use integrity_vault::{IntegritySignals, VaultService};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;
use uuid::Uuid;

const MISSING_IDENTIFIER_MESSAGE: &str =
    "The requested identifier's document is unavailable (it may be quarantined or does not exist in this corpus).";
const ALL_QUARANTINED_MESSAGE: &str = "All retrieved material failed integrity checks and has been withheld.";

/// Result of `IntegrityPipeline::query` (§4.7, §6 `POST /api/query`).
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub query_id: String,
    pub answer: String,
    pub signals_by_doc: HashMap<String, IntegritySignals>,
    pub retrieved_doc_ids: Vec<String>,
    pub quarantined_doc_ids: Vec<String>,
}

/// Orchestrates §4.4 -> §4.5 -> §4.6 -> §4.3 -> generation (C7).
pub struct IntegrityPipeline {
    adapter: Arc<RetrievalAdapter>,
    vault: Arc<VaultService>,
    scorer_set: Arc<ScorerSet>,
    generator: Arc<dyn Generator>,
    events: Arc<dyn EventBus>,
    lineage: Arc<dyn LineageStore>,
    boost_factor: usize,
    deadline: Duration,
}

impl IntegrityPipeline {
    pub fn new(
        adapter: Arc<RetrievalAdapter>,
        vault: Arc<VaultService>,
        scorer_set: Arc<ScorerSet>,
        generator: Arc<dyn Generator>,
        events: Arc<dyn EventBus>,
        lineage: Arc<dyn LineageStore>,
        boost_factor: usize,
        deadline: Duration,
    ) -> Self {
        Self { adapter, vault, scorer_set, generator, events, lineage, boost_factor, deadline }
    }

    /// The protected path (§4.7 steps 1-8).
    pub async fn query(&self, text: &str, user_id: &str, k: usize) -> Result<QueryOutcome> {
        let query_id = Uuid::new_v4().to_string();
        let done_quarantines: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

        let run = self.run_protected(text, user_id, k, query_id.clone(), done_quarantines.clone());

        match tokio::time::timeout(self.deadline, run).await {
            Ok(result) => result,
            Err(_) => {
                // No code in the fixed taxonomy (§6) covers a deadline warning, and
                // reusing RAG-1001 here would mint a second "query received" event
                // mid-pipeline, breaking the causal subsequence guarantee (§5 P6).
                // Surface it through tracing only, not the event bus.
                warn!(query_id = %query_id, "pipeline deadline exceeded");

                let quarantined = done_quarantines.lock().await.clone();
                if !quarantined.is_empty() {
                    let _ = self
                        .lineage
                        .append(LineageRecord {
                            query_id: query_id.clone(),
                            query_text: text.to_string(),
                            user_id: user_id.to_string(),
                            retrieved_doc_ids: Vec::new(),
                            quarantined_doc_ids: quarantined,
                            timestamp: chrono::Utc::now(),
                            action: LineageAction::Partial,
                        })
                        .await;
                }
                Err(Error::timeout(format!("query {} exceeded deadline", query_id)))
            }
        }
    }

    /// The unsafe demonstration path (§4.7 note): preprocessing and
    /// retrieval run as usual, but scoring/quarantine (steps 5-7) are
    /// skipped entirely and generation runs on the raw retrieved set.
    /// Callers MUST gate this behind an explicit enablement flag (§6).
    pub async fn query_unsafe(&self, text: &str, user_id: &str, k: usize) -> Result<QueryOutcome> {
        let query_id = Uuid::new_v4().to_string();
        let preprocessed = integrity_retrieval::process(text, self.boost_factor);
        let retrieved = self
            .adapter
            .retrieve(&preprocessed.augmented_text, k, true, preprocessed.metadata_filter.as_ref())
            .await?;

        let docs: Vec<_> = retrieved.iter().map(|(doc, _)| doc.clone()).collect();
        let retrieved_doc_ids: Vec<String> = docs.iter().map(|d| d.doc_id.clone()).collect();
        let answer = self.generator.generate(text, &docs).await?;

        let _ = self
            .events
            .publish(events::info(EventCode::GenerationCompleted, "unsafe path generation completed").correlation_id(query_id.clone()))
            .await;

        self.lineage
            .append(LineageRecord {
                query_id: query_id.clone(),
                query_text: text.to_string(),
                user_id: user_id.to_string(),
                retrieved_doc_ids: retrieved_doc_ids.clone(),
                quarantined_doc_ids: Vec::new(),
                timestamp: chrono::Utc::now(),
                action: LineageAction::Clean,
            })
            .await?;

        Ok(QueryOutcome {
            query_id,
            answer,
            signals_by_doc: HashMap::new(),
            retrieved_doc_ids,
            quarantined_doc_ids: Vec::new(),
        })
    }

    async fn run_protected(
        &self,
        text: &str,
        user_id: &str,
        k: usize,
        query_id: String,
        done_quarantines: Arc<Mutex<Vec<String>>>,
    ) -> Result<QueryOutcome> {
        let _ = self
            .events
            .publish(events::info(EventCode::QueryReceived, "query received").correlation_id(query_id.clone()))
            .await;

        let preprocessed = integrity_retrieval::process(text, self.boost_factor);
        let retrieved = self
            .adapter
            .retrieve(&preprocessed.augmented_text, k, true, preprocessed.metadata_filter.as_ref())
            .await?;

        if preprocessed.metadata_filter.is_some() && retrieved.is_empty() {
            let _ = self
                .events
                .publish(
                    events::warn(EventCode::RetrievalFallbackOrQuarantineOnly, "exact-identifier retrieval returned no survivors")
                        .correlation_id(query_id.clone()),
                )
                .await;
            self.lineage
                .append(LineageRecord {
                    query_id: query_id.clone(),
                    query_text: text.to_string(),
                    user_id: user_id.to_string(),
                    retrieved_doc_ids: Vec::new(),
                    quarantined_doc_ids: Vec::new(),
                    timestamp: chrono::Utc::now(),
                    action: LineageAction::Blocked,
                })
                .await?;
            return Ok(QueryOutcome {
                query_id,
                answer: MISSING_IDENTIFIER_MESSAGE.to_string(),
                signals_by_doc: HashMap::new(),
                retrieved_doc_ids: Vec::new(),
                quarantined_doc_ids: Vec::new(),
            });
        }

        let _ = self
            .events
            .publish(events::info(EventCode::RetrievalCompleted, format!("retrieved {} documents", retrieved.len())).correlation_id(query_id.clone()))
            .await;

        let retrieved_doc_ids: Vec<String> = retrieved.iter().map(|(doc, _)| doc.doc_id.clone()).collect();
        let sibling_sources: Vec<String> = retrieved.iter().map(|(doc, _)| doc.metadata.source.clone()).collect();
        let sibling_trust: Vec<f64> = retrieved.iter().map(|(doc, _)| self.scorer_set.trust_score(&doc.metadata.source)).collect();

        let mut join_set = JoinSet::new();
        for (doc, _distance) in retrieved.iter().cloned() {
            let scorer_set = self.scorer_set.clone();
            let sources = sibling_sources.clone();
            let trust = sibling_trust.clone();
            join_set.spawn(async move {
                let outcome = scorer_set.score(&doc, &sources, &trust).await;
                (doc, outcome)
            });
        }

        let mut signals_by_doc = HashMap::new();
        let mut quarantine_candidates = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            let (doc, outcome) = joined.map_err(|e| Error::scorer_error(format!("scoring task panicked: {}", e)))?;
            if outcome.drift_degraded {
                // SCORER_ERROR (§7) has no code in the fixed taxonomy either;
                // same reasoning as the deadline warning above.
                warn!(query_id = %query_id, doc_id = %doc.doc_id, "semantic-drift scorer degraded, defaulting to 0.5");
            }
            signals_by_doc.insert(doc.doc_id.clone(), outcome.signals);
            if outcome.signals.should_quarantine {
                quarantine_candidates.push(doc);
            }
        }

        let mut quarantined_doc_ids = Vec::new();
        for doc in quarantine_candidates {
            let signals = signals_by_doc.get(&doc.doc_id).copied().unwrap_or(IntegritySignals::clipped(0.5, 0.5, 0.5, 0.5, false));
            let mut metadata_json = serde_json::Map::new();
            metadata_json.insert("source".to_string(), serde_json::Value::String(doc.metadata.source.clone()));
            let result = self
                .vault
                .quarantine(
                    &doc.doc_id,
                    doc.content.clone(),
                    metadata_json.into_iter().collect(),
                    signals,
                    format!("integrity signals below threshold for query {}", query_id),
                    Some(query_id.clone()),
                )
                .await;
            match result {
                Ok(_quarantine_id) => {
                    quarantined_doc_ids.push(doc.doc_id.clone());
                    done_quarantines.lock().await.push(doc.doc_id.clone());
                }
                Err(err) => {
                    let _ = self
                        .events
                        .publish(
                            events::critical(EventCode::DocumentQuarantined, format!("vault write failed for {}: {}", doc.doc_id, err))
                                .correlation_id(query_id.clone()),
                        )
                        .await;
                }
            }
        }

        let clean_docs: Vec<_> = retrieved
            .into_iter()
            .map(|(doc, _)| doc)
            .filter(|doc| !quarantined_doc_ids.contains(&doc.doc_id))
            .collect();

        let answer = if !clean_docs.is_empty() {
            let answer = self.generator.generate(text, &clean_docs).await?;
            let _ = self
                .events
                .publish(events::info(EventCode::GenerationCompleted, "generation completed").correlation_id(query_id.clone()))
                .await;
            answer
        } else {
            ALL_QUARANTINED_MESSAGE.to_string()
        };

        let action = if quarantined_doc_ids.is_empty() {
            LineageAction::Clean
        } else if quarantined_doc_ids.len() == retrieved_doc_ids.len() {
            LineageAction::Blocked
        } else {
            LineageAction::Partial
        };

        self.lineage
            .append(LineageRecord {
                query_id: query_id.clone(),
                query_text: text.to_string(),
                user_id: user_id.to_string(),
                retrieved_doc_ids: retrieved_doc_ids.clone(),
                quarantined_doc_ids: quarantined_doc_ids.clone(),
                timestamp: chrono::Utc::now(),
                action,
            })
            .await?;

        Ok(QueryOutcome { query_id, answer, signals_by_doc, retrieved_doc_ids, quarantined_doc_ids })
    }
}
