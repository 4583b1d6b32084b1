//! Batched embedding generation on top of any [`LlmProvider`].

use crate::error::LlmError;
use crate::provider::LlmProvider;

pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Converts text to fixed-length vectors, singly or in sequential batches.
#[derive(Debug, Clone)]
pub struct EmbeddingGenerator<P> {
    provider: P,
}

impl<P: LlmProvider> EmbeddingGenerator<P> {
    #[must_use]
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// # Errors
    ///
    /// Returns an error if the embedding request fails.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.provider.embed(text).await
    }

    /// Embed `texts` in batches of `batch_size`, one request per batch.
    ///
    /// Batches are sent one after another; the first failure aborts the call
    /// and discards vectors from earlier batches. A `batch_size` of zero is
    /// treated as one.
    ///
    /// # Errors
    ///
    /// Returns the first batch error, or [`LlmError::BatchMismatch`] if the
    /// provider returns the wrong number of vectors.
    pub async fn embed_batch(
        &self,
        texts: &[String],
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>, LlmError> {
        let batch_size = batch_size.max(1);
        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(batch_size) {
            let vectors = self.provider.embed_batch(batch).await?;
            if vectors.len() != batch.len() {
                return Err(LlmError::BatchMismatch {
                    expected: batch.len(),
                    got: vectors.len(),
                });
            }
            embeddings.extend(vectors);
            tracing::info!("Processed {}/{} embeddings", embeddings.len(), texts.len());
        }

        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockProvider;

    fn texts(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("text {i}")).collect()
    }

    #[tokio::test]
    async fn embed_batch_calls_backend_once_per_batch() {
        let provider = MockProvider::hashing(8);
        let generator = EmbeddingGenerator::new(provider.clone());

        let out = generator.embed_batch(&texts(250), 100).await.unwrap();
        assert_eq!(out.len(), 250);
        assert_eq!(provider.embed_batch_calls(), 3);
    }

    #[tokio::test]
    async fn embed_batch_preserves_input_order() {
        let provider = MockProvider::hashing(16);
        let generator = EmbeddingGenerator::new(provider.clone());
        let input = texts(7);

        let batched = generator.embed_batch(&input, 3).await.unwrap();
        for (text, vector) in input.iter().zip(&batched) {
            assert_eq!(vector, &provider.embed(text).await.unwrap());
        }
    }

    #[tokio::test]
    async fn embed_batch_empty_input_makes_no_calls() {
        let provider = MockProvider::hashing(4);
        let generator = EmbeddingGenerator::new(provider.clone());

        let out = generator.embed_batch(&[], 10).await.unwrap();
        assert!(out.is_empty());
        assert_eq!(provider.embed_batch_calls(), 0);
    }

    #[tokio::test]
    async fn zero_batch_size_is_treated_as_one() {
        let provider = MockProvider::hashing(4);
        let generator = EmbeddingGenerator::new(provider.clone());

        let out = generator.embed_batch(&texts(3), 0).await.unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(provider.embed_batch_calls(), 3);
    }

    #[tokio::test]
    async fn failing_batch_aborts_call() {
        let provider = MockProvider::failing();
        let generator = EmbeddingGenerator::new(provider.clone());

        let result = generator.embed_batch(&texts(5), 2).await;
        assert!(result.is_err());
        assert_eq!(provider.embed_batch_calls(), 1);
    }

    mod proptest_batches {
        use proptest::prelude::*;

        use super::*;

        proptest! {
            #[test]
            fn call_count_is_ceil_of_n_over_b(n in 0usize..60, b in 1usize..20) {
                let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
                let provider = MockProvider::hashing(4);
                let generator = EmbeddingGenerator::new(provider.clone());
                let out = rt.block_on(generator.embed_batch(&texts(n), b)).unwrap();
                prop_assert_eq!(out.len(), n);
                prop_assert_eq!(provider.embed_batch_calls(), n.div_ceil(b));
            }
        }
    }
}
