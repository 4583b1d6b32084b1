use std::fmt;

use sopqa_llm::LlmError;
use sopqa_memory::document::DocumentError;
use sopqa_memory::search::SearchError;

use crate::config::ConfigError;

/// Remote services a command talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Search,
    Embedding,
    Generation,
}

impl Service {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Embedding => "embedding",
            Self::Generation => "generation",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("source unreadable: {0}")]
    SourceUnreadable(#[from] DocumentError),

    #[error("{service} service unavailable: {message}")]
    ServiceUnavailable { service: Service, message: String },

    #[error("{service} service rate limited the request, try again shortly")]
    RateLimited { service: Service },

    #[error("{service} service error: {message}")]
    Service { service: Service, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl QueryError {
    /// Classify a failure from the embedding or generation client.
    #[must_use]
    pub fn from_llm(service: Service, err: LlmError) -> Self {
        match err {
            LlmError::RateLimited => Self::RateLimited { service },
            LlmError::Unavailable | LlmError::Http(_) => Self::ServiceUnavailable {
                service,
                message: err.to_string(),
            },
            other => Self::Service {
                service,
                message: other.to_string(),
            },
        }
    }

    #[must_use]
    pub fn from_search(err: SearchError) -> Self {
        let service = Service::Search;
        match err {
            SearchError::RateLimited => Self::RateLimited { service },
            SearchError::Unavailable(_) | SearchError::Http(_) => Self::ServiceUnavailable {
                service,
                message: err.to_string(),
            },
            other => Self::Service {
                service,
                message: other.to_string(),
            },
        }
    }

    /// The service involved, if the failure came from one.
    #[must_use]
    pub fn service(&self) -> Option<Service> {
        match self {
            Self::ServiceUnavailable { service, .. }
            | Self::RateLimited { service }
            | Self::Service { service, .. } => Some(*service),
            Self::SourceUnreadable(_) | Self::Config(_) => None,
        }
    }
}
