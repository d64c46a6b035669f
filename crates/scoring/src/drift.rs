use integrity_core::error::Result;
use integrity_retrieval::Embedder;
use std::sync::Arc;

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A curated set of golden documents, embedded once at startup, used as the
/// reference shape for the semantic-drift scorer (§4.6).
pub struct GoldenCorpus {
    embeddings: Vec<Vec<f32>>,
}

impl GoldenCorpus {
    /// Embed `texts` once. An empty corpus is valid — `score` then returns
    /// the documented midpoint default.
    pub async fn build(embedder: &Arc<dyn Embedder>, texts: &[String]) -> Result<Self> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(embedder.embed(text).await?);
        }
        Ok(Self { embeddings })
    }

    pub fn empty() -> Self {
        Self { embeddings: Vec::new() }
    }

    /// `semantic_drift(doc_vector)` (§4.6): max cosine against the golden
    /// set, linearly mapped from [-1,1] to [0,1]. Empty golden set -> 0.5.
    pub fn score(&self, doc_vector: &[f32]) -> f64 {
        if self.embeddings.is_empty() {
            return 0.5;
        }
        let max_cosine = self
            .embeddings
            .iter()
            .map(|golden| cosine_similarity(doc_vector, golden))
            .fold(f32::NEG_INFINITY, f32::max);
        (((max_cosine + 1.0) / 2.0) as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_golden_set_defaults_to_midpoint() {
        let corpus = GoldenCorpus::empty();
        assert_eq!(corpus.score(&[1.0, 0.0]), 0.5);
    }

    #[test]
    fn identical_vector_scores_near_one() {
        let corpus = GoldenCorpus { embeddings: vec![vec![1.0, 0.0, 0.0]] };
        assert!(corpus.score(&[1.0, 0.0, 0.0]) > 0.99);
    }

    #[test]
    fn opposite_vector_scores_near_zero() {
        let corpus = GoldenCorpus { embeddings: vec![vec![1.0, 0.0, 0.0]] };
        assert!(corpus.score(&[-1.0, 0.0, 0.0]) < 0.01);
    }
}
