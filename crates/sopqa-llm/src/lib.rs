//! Chat and embedding provider abstraction with an Azure OpenAI backend.

pub mod azure;
pub mod embedding;
pub mod error;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod provider;

pub use azure::AzureOpenAiProvider;
pub use embedding::EmbeddingGenerator;
pub use error::LlmError;
pub use provider::{LlmProvider, Message, Role};
