pub mod aggregator;
pub mod anomaly;
pub mod drift;
pub mod red_flag;
pub mod scorer_set;
pub mod trust;

pub use aggregator::aggregate;
pub use drift::GoldenCorpus;
pub use red_flag::RedFlagTable;
pub use scorer_set::{ScoreOutcome, ScorerSet};
pub use trust::TrustTable;
