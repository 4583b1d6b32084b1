mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::Context;

use crate::error::Service;
use crate::secrets::{ApiKey, Secret};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{service} is not configured: set {setting} (env {env})")]
    Missing {
        service: Service,
        setting: &'static str,
        env: &'static str,
    },

    #[error("invalid {setting}: {reason}")]
    Invalid {
        setting: &'static str,
        reason: String,
    },
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::debug!("config file {} not found, using defaults", path.display());
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Check the settings needed by `services`, plus the tunables every
    /// command relies on. Reports the first problem found.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] naming the missing or invalid setting.
    pub fn validate(&self, services: &[Service]) -> Result<(), ConfigError> {
        self.validate_tunables()?;
        for service in services {
            match service {
                Service::Search => self.validate_search()?,
                Service::Embedding => self.validate_embedding()?,
                Service::Generation => self.validate_generation()?,
            }
        }
        Ok(())
    }

    fn validate_tunables(&self) -> Result<(), ConfigError> {
        let c = &self.chunking;
        if c.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                setting: "chunking.chunk_size",
                reason: "must be greater than zero".into(),
            });
        }
        if c.chunk_overlap >= c.chunk_size {
            return Err(ConfigError::Invalid {
                setting: "chunking.chunk_overlap",
                reason: format!(
                    "{} must be smaller than chunk_size {}",
                    c.chunk_overlap, c.chunk_size
                ),
            });
        }
        if !(1..=MAX_TOP_K).contains(&self.query.top_k) {
            return Err(ConfigError::Invalid {
                setting: "query.top_k",
                reason: format!("{} is outside 1..={MAX_TOP_K}", self.query.top_k),
            });
        }
        Ok(())
    }

    fn validate_search(&self) -> Result<(), ConfigError> {
        let service = Service::Search;
        required(service, &self.search.endpoint, "search.endpoint", "AZURE_SEARCH_ENDPOINT")?;
        required(
            service,
            &self.search.index_name,
            "search.index_name",
            "AZURE_SEARCH_INDEX_NAME",
        )?;
        self.require_key(ApiKey::Search)
    }

    fn validate_embedding(&self) -> Result<(), ConfigError> {
        let service = Service::Embedding;
        required(
            service,
            &self.embedding.endpoint,
            "embedding.endpoint",
            "AZURE_OPENAI_EMBEDDING_ENDPOINT",
        )?;
        required(
            service,
            &self.embedding.deployment,
            "embedding.deployment",
            "AZURE_OPENAI_EMBEDDING_DEPLOYMENT",
        )?;
        if self.embedding.dimensions == 0 {
            return Err(ConfigError::Invalid {
                setting: "embedding.dimensions",
                reason: "must be greater than zero".into(),
            });
        }
        self.require_key(ApiKey::Embedding)
    }

    fn validate_generation(&self) -> Result<(), ConfigError> {
        let service = Service::Generation;
        required(
            service,
            &self.generation.endpoint,
            "generation.endpoint",
            "AZURE_OPENAI_ENDPOINT",
        )?;
        required(
            service,
            &self.generation.deployment,
            "generation.deployment",
            "AZURE_OPENAI_DEPLOYMENT_NAME",
        )?;
        self.require_key(ApiKey::OpenAi)
    }

    fn require_key(&self, key: ApiKey) -> Result<(), ConfigError> {
        match self.secrets.get(key).map(Secret::expose) {
            Some(value) if !value.is_empty() => Ok(()),
            _ => Err(ConfigError::Missing {
                service: key.service(),
                setting: "API key",
                env: key.env_var(),
            }),
        }
    }
}

fn required(
    service: Service,
    value: &str,
    setting: &'static str,
    env: &'static str,
) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing {
            service,
            setting,
            env,
        });
    }
    Ok(())
}
