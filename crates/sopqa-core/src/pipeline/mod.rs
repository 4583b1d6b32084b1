//! Retrieval-augmented answering over the SOP index.

pub mod prompt;

use std::sync::Arc;

use sopqa_llm::{EmbeddingGenerator, LlmProvider, Message};
use sopqa_memory::search::{HybridQuery, SearchHit, SearchStore};

pub use prompt::{SYSTEM_PROMPT, build_context, format_source, user_message};

use crate::error::{QueryError, Service};

pub const NOT_FOUND_ANSWER: &str =
    "I couldn't find relevant information in the SOPs to answer your question.";

const MISSING_FIELD: &str = "N/A";

/// One search hit projected to the fields the answer step uses.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedDocument {
    pub content: String,
    pub sop_number: String,
    pub title: String,
    pub section: String,
    /// Backend relevance score, comparable only within one result set.
    pub score: f64,
}

impl From<SearchHit> for RetrievedDocument {
    fn from(hit: SearchHit) -> Self {
        let field = |name: &str| hit.field_str(name).unwrap_or(MISSING_FIELD).to_owned();
        Self {
            content: hit.field_str("content").unwrap_or_default().to_owned(),
            sop_number: field("sop_number"),
            title: field("title"),
            section: field("section_type"),
            score: hit.score,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub answer: String,
    pub sources: Vec<String>,
    pub retrieved_docs: Vec<RetrievedDocument>,
}

impl QueryResult {
    #[must_use]
    pub fn not_found() -> Self {
        Self {
            answer: NOT_FOUND_ANSWER.to_owned(),
            sources: Vec::new(),
            retrieved_docs: Vec::new(),
        }
    }

    /// True when nothing was retrieved and no generation took place.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.retrieved_docs.is_empty()
    }
}

/// Embed, retrieve, then generate. Holds no per-question state.
pub struct QueryPipeline<E, G> {
    embedder: EmbeddingGenerator<E>,
    generator: G,
    store: Arc<dyn SearchStore>,
}

impl<E: LlmProvider, G: LlmProvider> QueryPipeline<E, G> {
    #[must_use]
    pub fn new(embedder: EmbeddingGenerator<E>, generator: G, store: Arc<dyn SearchStore>) -> Self {
        Self {
            embedder,
            generator,
            store,
        }
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        self.store.index_name()
    }

    /// Hybrid keyword and vector search for `question`, in backend order.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding the question or the search fails.
    pub async fn retrieve_documents(
        &self,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<RetrievedDocument>, QueryError> {
        let vector = self
            .embedder
            .embed(question)
            .await
            .map_err(|e| QueryError::from_llm(Service::Embedding, e))?;

        let hits = self
            .store
            .hybrid_search(HybridQuery::new(question, vector, top_k.max(1)))
            .await
            .map_err(QueryError::from_search)?;

        tracing::debug!(hits = hits.len(), "retrieved documents");
        Ok(hits.into_iter().map(RetrievedDocument::from).collect())
    }

    /// # Errors
    ///
    /// Returns an error if the generation request fails.
    pub async fn generate_answer(
        &self,
        question: &str,
        docs: &[RetrievedDocument],
    ) -> Result<String, QueryError> {
        let context = build_context(docs);
        let messages = [
            Message::system(SYSTEM_PROMPT),
            Message::user(user_message(&context, question)),
        ];
        self.generator
            .chat(&messages)
            .await
            .map_err(|e| QueryError::from_llm(Service::Generation, e))
    }

    /// Answer `question` from the `top_k` most relevant chunks.
    ///
    /// Retrieval that finds nothing is not an error: the result carries
    /// [`NOT_FOUND_ANSWER`] and generation is skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if any remote call fails.
    pub async fn query(&self, question: &str, top_k: usize) -> Result<QueryResult, QueryError> {
        tracing::info!("Retrieving documents for: {question}");
        let docs = self.retrieve_documents(question, top_k).await?;

        if docs.is_empty() {
            tracing::info!("no documents retrieved");
            return Ok(QueryResult::not_found());
        }

        tracing::info!("Generating answer...");
        let answer = self.generate_answer(question, &docs).await?;
        let sources = docs.iter().map(format_source).collect();

        Ok(QueryResult {
            answer,
            sources,
            retrieved_docs: docs,
        })
    }
}
