pub mod blast_radius;
pub mod generator;
pub mod pipeline;

pub use blast_radius::{BlastRadiusAnalyzer, BlastRadiusReport, QueryDetail, Severity};
pub use generator::{Generator, TemplateGenerator};
pub use pipeline::{IntegrityPipeline, QueryOutcome};
