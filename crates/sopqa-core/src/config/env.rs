use std::str::FromStr;

use super::Config;

fn parsed<T: FromStr>(key: &str) -> Option<T> {
    let v = std::env::var(key).ok()?;
    if let Ok(parsed) = v.parse::<T>() {
        Some(parsed)
    } else {
        tracing::warn!("ignoring invalid {key} value: {v}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_services();
        self.apply_env_overrides_tunables();
    }

    fn apply_env_overrides_services(&mut self) {
        if let Ok(v) = std::env::var("AZURE_SEARCH_ENDPOINT") {
            self.search.endpoint = v;
        }
        if let Ok(v) = std::env::var("AZURE_SEARCH_INDEX_NAME") {
            self.search.index_name = v;
        }
        if let Ok(v) = std::env::var("SOPQA_SEARCH_API_VERSION") {
            self.search.api_version = v;
        }
        if let Ok(v) = std::env::var("AZURE_OPENAI_ENDPOINT") {
            self.generation.endpoint = v;
        }
        if let Ok(v) = std::env::var("AZURE_OPENAI_DEPLOYMENT_NAME") {
            self.generation.deployment = v;
        }
        // shared by the chat and embedding clients
        if let Ok(v) = std::env::var("AZURE_OPENAI_API_VERSION") {
            self.generation.api_version.clone_from(&v);
            self.embedding.api_version = v;
        }
        if let Ok(v) = std::env::var("AZURE_OPENAI_EMBEDDING_ENDPOINT") {
            self.embedding.endpoint = v;
        }
        if let Ok(v) = std::env::var("AZURE_OPENAI_EMBEDDING_DEPLOYMENT") {
            self.embedding.deployment = v;
        }
    }

    fn apply_env_overrides_tunables(&mut self) {
        if let Some(n) = parsed("SOPQA_EMBEDDING_BATCH_SIZE") {
            self.embedding.batch_size = n;
        }
        if let Some(n) = parsed("SOPQA_EMBEDDING_DIMENSIONS") {
            self.embedding.dimensions = n;
        }
        if let Some(t) = parsed("SOPQA_GENERATION_TEMPERATURE") {
            self.generation.temperature = t;
        }
        if let Some(n) = parsed("SOPQA_GENERATION_MAX_TOKENS") {
            self.generation.max_tokens = n;
        }
        if let Some(n) = parsed("SOPQA_CHUNK_SIZE") {
            self.chunking.chunk_size = n;
        }
        if let Some(n) = parsed("SOPQA_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = n;
        }
        if let Some(n) = parsed("SOPQA_MIN_CHUNK_CHARS") {
            self.chunking.min_chunk_chars = n;
        }
        if let Some(n) = parsed("SOPQA_MIN_DOCUMENT_CHARS") {
            self.chunking.min_document_chars = n;
        }
        if let Some(n) = parsed("SOPQA_TOP_K") {
            self.query.top_k = n;
        }
        if let Some(s) = parsed("SOPQA_TIMEOUT_CONNECT") {
            self.timeouts.connect_seconds = s;
        }
        if let Some(s) = parsed("SOPQA_TIMEOUT_REQUEST") {
            self.timeouts.request_seconds = s;
        }
    }
}
