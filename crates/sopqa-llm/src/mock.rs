//! Test-only mock provider with deterministic embeddings.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    /// Output dimension of [`hash_embedding`].
    pub dimensions: usize,
    pub fail_chat: bool,
    pub fail_embed: bool,
    chat_calls: Arc<AtomicUsize>,
    embed_calls: Arc<AtomicUsize>,
    embed_batch_calls: Arc<AtomicUsize>,
    recorded: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            dimensions: 8,
            fail_chat: false,
            fail_embed: false,
            chat_calls: Arc::new(AtomicUsize::new(0)),
            embed_calls: Arc::new(AtomicUsize::new(0)),
            embed_batch_calls: Arc::new(AtomicUsize::new(0)),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn hashing(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn chat_calls(&self) -> usize {
        self.chat_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_calls(&self) -> usize {
        self.embed_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn embed_batch_calls(&self) -> usize {
        self.embed_batch_calls.load(Ordering::SeqCst)
    }

    /// Message lists passed to [`LlmProvider::chat`], oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn recorded_messages(&self) -> Vec<Vec<Message>> {
        self.recorded.lock().unwrap().clone()
    }
}

/// Bag-of-words hashing embedding: texts sharing words get similar vectors.
#[must_use]
pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let dimensions = dimensions.max(1);
    let mut vector = vec![0.0f32; dimensions];
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        let hash = word
            .to_lowercase()
            .bytes()
            .fold(0xcbf2_9ce4_8422_2325_u64, |h, b| {
                (h ^ u64::from(b)).wrapping_mul(0x0100_0000_01b3)
            });
        #[allow(clippy::cast_possible_truncation)]
        let slot = (hash % dimensions as u64) as usize;
        vector[slot] += 1.0;
    }
    vector
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        self.recorded.lock().unwrap().push(messages.to_vec());
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        self.embed_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed {
            return Err(LlmError::Unavailable);
        }
        Ok(hash_embedding(text, self.dimensions))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
        self.embed_batch_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_embed {
            return Err(LlmError::Unavailable);
        }
        Ok(texts
            .iter()
            .map(|t| hash_embedding(t, self.dimensions))
            .collect())
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_embedding_is_deterministic() {
        assert_eq!(hash_embedding("Patient parking", 16), hash_embedding("patient PARKING", 16));
    }

    #[test]
    fn hash_embedding_has_requested_dimensions() {
        assert_eq!(hash_embedding("a b c", 5).len(), 5);
        assert_eq!(hash_embedding("", 0).len(), 1);
    }

    #[tokio::test]
    async fn scripted_responses_then_default() {
        let p = MockProvider::with_responses(vec!["first".into()]);
        assert_eq!(p.chat(&[Message::user("q")]).await.unwrap(), "first");
        assert_eq!(p.chat(&[Message::user("q")]).await.unwrap(), "mock response");
        assert_eq!(p.chat_calls(), 2);
        assert_eq!(p.recorded_messages().len(), 2);
    }
}
