//! Configuration, client wiring and the question answering pipeline.

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod secrets;

pub use bootstrap::{AppBuilder, resolve_config_path};
pub use config::{Config, ConfigError};
pub use error::{QueryError, Service};
pub use pipeline::{NOT_FOUND_ANSWER, QueryPipeline, QueryResult, RetrievedDocument};
