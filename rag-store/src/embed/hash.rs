//! Offline embedder based on feature hashing.
//!
//! Lowercased word unigrams (weight 1.0) and character trigrams of each padded
//! word (weight 0.5) are hashed with blake3 into `dim` signed buckets, then the
//! vector is L2-normalized. Texts sharing vocabulary end up close under cosine
//! similarity, which is enough for offline runs and tests.

use super::{EmbedFuture, EmbeddingsProvider};
use crate::errors::RagError;

const WORD_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    /// # Errors
    /// [`RagError::Config`] when `dim` is zero.
    pub fn new(dim: usize) -> Result<Self, RagError> {
        if dim == 0 {
            return Err(RagError::Config("hash embedder dimension must be > 0".into()));
        }
        Ok(Self { dim })
    }

    /// Embeds one text synchronously.
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let word = word.to_lowercase();
            self.add_feature(&mut v, b'w', &word, WORD_WEIGHT);

            let padded: Vec<char> = format!(" {word} ").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut v, b't', &gram, TRIGRAM_WEIGHT);
            }
        }

        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > f32::EPSILON {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }

    fn add_feature(&self, v: &mut [f32], kind: u8, feature: &str, weight: f32) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&[kind]);
        hasher.update(feature.as_bytes());
        let hash = hasher.finalize();
        let bytes = hash.as_bytes();

        let mut idx = [0u8; 8];
        idx.copy_from_slice(&bytes[..8]);
        let bucket = (u64::from_le_bytes(idx) % self.dim as u64) as usize;
        let sign = if bytes[8] & 1 == 0 { 1.0 } else { -1.0 };
        v[bucket] += sign * weight;
    }
}

impl EmbeddingsProvider for HashEmbedder {
    fn embed_documents<'a>(&'a self, texts: &'a [String]) -> EmbedFuture<'a, Vec<Vec<f32>>> {
        Box::pin(async move { Ok(texts.iter().map(|t| self.embed_text(t)).collect()) })
    }

    fn embed_query<'a>(&'a self, text: &'a str) -> EmbedFuture<'a, Vec<f32>> {
        Box::pin(async move { Ok(self.embed_text(text)) })
    }

    fn dimension(&self) -> usize {
        self.dim
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn deterministic_and_order_preserving() {
        let e = HashEmbedder::new(64).unwrap();
        let texts = vec!["gateway timeout".to_string(), "disk full".to_string()];
        let first = e.embed_documents(&texts).await.unwrap();
        let second = e.embed_documents(&texts).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first[1], e.embed_query("disk full").await.unwrap());
        assert!(first.iter().all(|v| v.len() == 64));
    }

    #[test]
    fn zero_dimension_is_a_config_error() {
        assert!(matches!(HashEmbedder::new(0), Err(RagError::Config(_))));
        assert_eq!(HashEmbedder::new(1).unwrap().dimension(), 1);
    }

    #[test]
    fn blank_text_is_zero_vector() {
        let e = HashEmbedder::new(16).unwrap();
        assert_eq!(e.embed_text("  \n"), vec![0.0; 16]);
    }

    #[test]
    fn shared_vocabulary_scores_higher() {
        let e = HashEmbedder::new(384).unwrap();
        let doc = e.embed_text("Error 504 means the upstream gateway timed out");
        let related = e.embed_text("what does error 504 mean");
        let unrelated = e.embed_text("Bananas are rich in potassium");
        assert!(cosine(&doc, &related) > cosine(&doc, &unrelated));
        assert!((cosine(&doc, &doc) - 1.0).abs() < 1e-5);
    }
}
