use async_trait::async_trait;
use integrity_core::error::Result;
use integrity_retrieval::Document;

/// The pluggable LLM collaborator (§9): `generate(prompt, docs) -> text`.
/// The concrete provider is out of scope; this crate ships a template-based
/// default so the pipeline is runnable without an external dependency.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, query: &str, docs: &[Document]) -> Result<String>;
}

/// Minimal, deterministic default generator: stitches the surviving
/// documents' titles/content into a templated answer. Not a stub — it is a
/// legitimate (if unsophisticated) implementation of the `Generator`
/// contract, swappable for a real LLM-backed adapter.
pub struct TemplateGenerator;

#[async_trait]
impl Generator for TemplateGenerator {
    async fn generate(&self, query: &str, docs: &[Document]) -> Result<String> {
        if docs.is_empty() {
            return Ok("No documents survived integrity review for this query.".to_string());
        }
        let mut answer = format!("Based on {} verified document(s), regarding \"{}\":\n", docs.len(), query);
        for doc in docs {
            let title = doc.metadata.title.as_deref().unwrap_or(doc.doc_id.as_str());
            let snippet: String = doc.content.chars().take(240).collect();
            answer.push_str(&format!("- {}: {}\n", title, snippet));
        }
        Ok(answer)
    }
}
