//! Azure AI Search index management and hybrid retrieval.

pub mod azure;
pub mod error;
pub mod in_memory;
pub mod manager;
pub mod schema;
pub mod store;

pub use azure::AzureSearchStore;
pub use error::SearchError;
pub use in_memory::InMemorySearchStore;
pub use manager::{DEFAULT_UPLOAD_BATCH, IndexManager};
pub use schema::{DEFAULT_DIMENSIONS, IndexSchema, SELECT_FIELDS, VECTOR_FIELD};
pub use store::{HybridQuery, IndexRecord, SearchHit, SearchStore, record_key};
