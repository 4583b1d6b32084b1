//! Azure API keys. They are read from the process environment (including a
//! loaded `.env` file) and never from the TOML config.

use std::fmt;

use crate::error::Service;

/// An API key. Formatting never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Box<str>);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into().into_boxed_str())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// The three keys the assistant needs, one per remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKey {
    Search,
    OpenAi,
    Embedding,
}

impl ApiKey {
    pub const ALL: [Self; 3] = [Self::Search, Self::OpenAi, Self::Embedding];

    #[must_use]
    pub fn env_var(self) -> &'static str {
        match self {
            Self::Search => "AZURE_SEARCH_KEY",
            Self::OpenAi => "AZURE_OPENAI_API_KEY",
            Self::Embedding => "AZURE_OPENAI_EMBEDDING_API_KEY",
        }
    }

    #[must_use]
    pub fn service(self) -> Service {
        match self {
            Self::Search => Service::Search,
            Self::OpenAi => Service::Generation,
            Self::Embedding => Service::Embedding,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct ResolvedSecrets {
    pub search_api_key: Option<Secret>,
    pub openai_api_key: Option<Secret>,
    pub embedding_api_key: Option<Secret>,
}

impl ResolvedSecrets {
    /// Keys from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Keys from an arbitrary name lookup. Blank values count as unset, so an
    /// `AZURE_SEARCH_KEY=` line in `.env` is reported as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut secrets = Self::default();
        for key in ApiKey::ALL {
            let value = lookup(key.env_var()).filter(|v| !v.trim().is_empty());
            *secrets.slot(key) = value.map(Secret::new);
        }
        secrets
    }

    #[must_use]
    pub fn get(&self, key: ApiKey) -> Option<&Secret> {
        match key {
            ApiKey::Search => self.search_api_key.as_ref(),
            ApiKey::OpenAi => self.openai_api_key.as_ref(),
            ApiKey::Embedding => self.embedding_api_key.as_ref(),
        }
    }

    fn slot(&mut self, key: ApiKey) -> &mut Option<Secret> {
        match key {
            ApiKey::Search => &mut self.search_api_key,
            ApiKey::OpenAi => &mut self.openai_api_key,
            ApiKey::Embedding => &mut self.embedding_api_key,
        }
    }
}
