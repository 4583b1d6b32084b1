use serde::{Deserialize, Serialize};
use sopqa_memory::document::DEFAULT_SECTION_HEADERS;

use crate::secrets::ResolvedSecrets;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub query: QueryConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

fn default_index_name() -> String {
    "sop-index".into()
}

fn default_search_api_version() -> String {
    sopqa_memory::search::azure::DEFAULT_API_VERSION.into()
}

fn default_openai_api_version() -> String {
    sopqa_llm::azure::DEFAULT_API_VERSION.into()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_index_name")]
    pub index_name: String,
    #[serde(default = "default_search_api_version")]
    pub api_version: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            index_name: default_index_name(),
            api_version: default_search_api_version(),
        }
    }
}

fn default_batch_size() -> usize {
    sopqa_llm::embedding::DEFAULT_BATCH_SIZE
}

fn default_dimensions() -> usize {
    sopqa_memory::search::DEFAULT_DIMENSIONS
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_openai_api_version")]
    pub api_version: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Must match the embedding deployment's output size.
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: String::new(),
            api_version: default_openai_api_version(),
            batch_size: default_batch_size(),
            dimensions: default_dimensions(),
        }
    }
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_tokens() -> u32 {
    1000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub deployment: String,
    #[serde(default = "default_openai_api_version")]
    pub api_version: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            deployment: String::new(),
            api_version: default_openai_api_version(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_min_chars() -> usize {
    1
}

fn default_section_headers() -> Vec<String> {
    DEFAULT_SECTION_HEADERS.map(str::to_owned).to_vec()
}

fn default_max_file_size_mb() -> u64 {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_min_chars")]
    pub min_chunk_chars: usize,
    #[serde(default = "default_min_chars")]
    pub min_document_chars: usize,
    #[serde(default = "default_section_headers")]
    pub section_headers: Vec<String>,
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_chars: default_min_chars(),
            min_document_chars: default_min_chars(),
            section_headers: default_section_headers(),
            max_file_size_mb: default_max_file_size_mb(),
        }
    }
}

pub const MAX_TOP_K: usize = 5;

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryConfig {
    /// Retrieved documents per question, 1 to [`MAX_TOP_K`].
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_connect_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_connect_timeout")]
    pub connect_seconds: u64,
    #[serde(default = "default_request_timeout")]
    pub request_seconds: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_seconds: default_connect_timeout(),
            request_seconds: default_request_timeout(),
        }
    }
}
