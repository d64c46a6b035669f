use chrono::{DateTime, Duration, Utc};
use integrity_core::error::Result;
use integrity_core::events::{self, EventBus, EventCode};
use integrity_core::lineage::LineageStore;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

/// Impact severity, from the queries/users table (§4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

fn severity_for_queries(count: usize) -> Severity {
    match count {
        0..=2 => Severity::Low,
        3..=5 => Severity::Medium,
        6..=10 => Severity::High,
        _ => Severity::Critical,
    }
}

fn severity_for_users(count: usize) -> Severity {
    match count {
        0..=1 => Severity::Low,
        2..=3 => Severity::Medium,
        4..=6 => Severity::High,
        _ => Severity::Critical,
    }
}

/// One query's contribution to a blast-radius report.
#[derive(Debug, Clone, Serialize)]
pub struct QueryDetail {
    pub query_id: String,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

/// `analyze(doc_id, window)` output (§4.8).
#[derive(Debug, Clone, Serialize)]
pub struct BlastRadiusReport {
    pub doc_id: String,
    pub affected_query_count: usize,
    pub affected_users: usize,
    pub query_details: Vec<QueryDetail>,
    pub time_window_start: DateTime<Utc>,
    pub time_window_end: DateTime<Utc>,
    pub severity: Severity,
    pub recommended_actions: Vec<String>,
}

fn recommended_actions(severity: Severity) -> Vec<String> {
    match severity {
        Severity::Low => vec!["Monitor; no immediate action required.".to_string()],
        Severity::Medium => vec![
            "Notify affected users of potential exposure.".to_string(),
            "Prioritize analyst review of the quarantine record.".to_string(),
        ],
        Severity::High => vec![
            "Escalate to the security team.".to_string(),
            "Notify all affected users.".to_string(),
            "Confirm or restore the quarantine record promptly.".to_string(),
        ],
        Severity::Critical => vec![
            "Page the on-call security responder.".to_string(),
            "Notify all affected users and their managers.".to_string(),
            "Audit all queries in the window for related exposure.".to_string(),
        ],
    }
}

/// C8: queries the lineage store on demand and produces an impact report.
pub struct BlastRadiusAnalyzer {
    lineage: Arc<dyn LineageStore>,
    events: Arc<dyn EventBus>,
}

impl BlastRadiusAnalyzer {
    pub fn new(lineage: Arc<dyn LineageStore>, events: Arc<dyn EventBus>) -> Self {
        Self { lineage, events }
    }

    pub async fn analyze(&self, doc_id: &str, window: Duration) -> Result<BlastRadiusReport> {
        let _ = self.events.publish(events::info(EventCode::BlastRadiusRequested, format!("blast radius requested for {}", doc_id))).await;

        let now = Utc::now();
        let since = now - window;
        let records = self.lineage.scan_for_doc(doc_id, since, now).await?;

        let affected_query_count = records.len();
        let affected_users: HashSet<&str> = records.iter().map(|r| r.user_id.as_str()).collect();
        let query_details = records
            .iter()
            .map(|r| QueryDetail { query_id: r.query_id.clone(), user_id: r.user_id.clone(), timestamp: r.timestamp })
            .collect();

        let severity = severity_for_queries(affected_query_count).max(severity_for_users(affected_users.len()));

        if severity >= Severity::High {
            let _ = self
                .events
                .publish(events::warn(EventCode::BlastRadiusHighOrCritical, format!("blast radius for {} is {:?}", doc_id, severity)))
                .await;
        }

        Ok(BlastRadiusReport {
            doc_id: doc_id.to_string(),
            affected_query_count,
            affected_users: affected_users.len(),
            query_details,
            time_window_start: since,
            time_window_end: now,
            severity,
            recommended_actions: recommended_actions(severity),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_takes_the_higher_row() {
        // 3 queries -> MEDIUM by the query-count row; 7 users -> CRITICAL by
        // the user-count row. The higher of the two wins.
        let by_queries = severity_for_queries(3);
        let by_users = severity_for_users(7);
        assert_eq!(by_queries.max(by_users), Severity::Critical);
    }

    #[test]
    fn three_queries_three_users_is_medium() {
        // S6: both dimensions land in the MEDIUM bracket (3-5 queries,
        // 2-3 users), so the higher-of-two-rows rule also yields MEDIUM.
        assert_eq!(severity_for_queries(3).max(severity_for_users(3)), Severity::Medium);
    }

    #[test]
    fn low_counts_are_low_severity() {
        assert_eq!(severity_for_queries(1), Severity::Low);
        assert_eq!(severity_for_users(1), Severity::Low);
    }
}
