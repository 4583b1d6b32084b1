//! Construction of clients and pipelines from a validated [`Config`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sopqa_llm::{AzureOpenAiProvider, EmbeddingGenerator};
use sopqa_memory::document::{DocumentProcessor, ProcessorConfig, SplitterConfig};
use sopqa_memory::search::{AzureSearchStore, IndexManager, SearchStore};
use sopqa_memory::IndexIngestor;

use crate::config::{Config, ConfigError};
use crate::error::Service;
use crate::pipeline::QueryPipeline;
use crate::secrets::{ApiKey, ResolvedSecrets, Secret};

pub type AzurePipeline = QueryPipeline<AzureOpenAiProvider, AzureOpenAiProvider>;

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

impl AppBuilder {
    /// Load config from `path`, apply env overrides and read the Azure API
    /// keys from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn load(path: PathBuf) -> anyhow::Result<Self> {
        Self::load_with_keys(path, ResolvedSecrets::from_env())
    }

    /// Like [`AppBuilder::load`] with the API keys supplied by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    pub fn load_with_keys(path: PathBuf, secrets: ResolvedSecrets) -> anyhow::Result<Self> {
        let mut config = Config::load(&path)?;
        config.secrets = secrets;
        Ok(Self {
            config,
            config_path: path,
        })
    }

    #[must_use]
    pub fn from_config(config: Config) -> Self {
        Self {
            config,
            config_path: PathBuf::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] for the first missing setting `services` need.
    pub fn validate(&self, services: &[Service]) -> Result<(), ConfigError> {
        self.config.validate(services)
    }

    fn http_client(&self) -> reqwest::Client {
        let t = &self.config.timeouts;
        sopqa_llm::http::client_with_timeouts(
            Duration::from_secs(t.connect_seconds),
            Duration::from_secs(t.request_seconds),
        )
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if search settings are missing.
    pub fn build_search_store(&self) -> Result<AzureSearchStore, ConfigError> {
        self.validate(&[Service::Search])?;
        let c = &self.config.search;
        Ok(AzureSearchStore::new(
            c.endpoint.clone(),
            expose(self.config.secrets.get(ApiKey::Search)),
            c.index_name.clone(),
            c.api_version.clone(),
        )
        .with_client(self.http_client()))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if search settings are missing.
    pub fn build_index_manager(&self) -> Result<IndexManager, ConfigError> {
        let store: Arc<dyn SearchStore> = Arc::new(self.build_search_store()?);
        Ok(IndexManager::new(store))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if embedding settings are missing.
    pub fn build_embedding_provider(&self) -> Result<AzureOpenAiProvider, ConfigError> {
        self.validate(&[Service::Embedding])?;
        let c = &self.config.embedding;
        Ok(AzureOpenAiProvider::new(
            c.endpoint.clone(),
            expose(self.config.secrets.get(ApiKey::Embedding)),
            c.deployment.clone(),
            c.api_version.clone(),
        )
        .with_client(self.http_client()))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if generation settings are missing.
    pub fn build_generation_provider(&self) -> Result<AzureOpenAiProvider, ConfigError> {
        self.validate(&[Service::Generation])?;
        let c = &self.config.generation;
        Ok(AzureOpenAiProvider::new(
            c.endpoint.clone(),
            expose(self.config.secrets.get(ApiKey::OpenAi)),
            c.deployment.clone(),
            c.api_version.clone(),
        )
        .with_client(self.http_client())
        .with_generation(c.temperature, c.max_tokens))
    }

    #[must_use]
    pub fn processor_config(&self) -> ProcessorConfig {
        let c = &self.config.chunking;
        ProcessorConfig {
            splitter: SplitterConfig {
                chunk_size: c.chunk_size,
                chunk_overlap: c.chunk_overlap,
                min_chunk_chars: c.min_chunk_chars,
                section_headers: c.section_headers.clone(),
            },
            min_document_chars: c.min_document_chars,
            max_file_size: c.max_file_size_mb.saturating_mul(1024 * 1024),
        }
    }

    /// # Errors
    ///
    /// Returns an error if chunking settings are invalid.
    pub fn build_processor(&self) -> anyhow::Result<DocumentProcessor> {
        self.validate(&[])?;
        Ok(DocumentProcessor::new(self.processor_config())?)
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if search or embedding settings are missing.
    pub fn build_ingestor(&self) -> Result<IndexIngestor<AzureOpenAiProvider>, ConfigError> {
        let manager = self.build_index_manager()?;
        let embedder = EmbeddingGenerator::new(self.build_embedding_provider()?);
        Ok(IndexIngestor::new(embedder, manager).with_batch_size(self.config.embedding.batch_size))
    }

    /// # Errors
    ///
    /// Returns [`ConfigError`] if any of the three services is not configured.
    pub fn build_pipeline(&self) -> Result<AzurePipeline, ConfigError> {
        self.validate(&[Service::Search, Service::Embedding, Service::Generation])?;
        let store: Arc<dyn SearchStore> = Arc::new(self.build_search_store()?);
        Ok(QueryPipeline::new(
            EmbeddingGenerator::new(self.build_embedding_provider()?),
            self.build_generation_provider()?,
            store,
        ))
    }
}

fn expose(secret: Option<&Secret>) -> String {
    secret.map(|s| s.expose().to_owned()).unwrap_or_default()
}

/// Priority: `--config` argument, then `SOPQA_CONFIG`, then
/// `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("SOPQA_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}
