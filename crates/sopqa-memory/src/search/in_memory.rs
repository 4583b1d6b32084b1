use std::collections::{BTreeMap, HashSet};
use std::sync::RwLock;

use super::error::SearchError;
use super::schema::IndexSchema;
use super::store::{BoxFuture, HybridQuery, IndexRecord, SearchHit, SearchStore};

const VECTOR_WEIGHT: f64 = 0.7;
const KEYWORD_WEIGHT: f64 = 0.3;

struct InMemoryIndex {
    dimensions: Option<usize>,
    records: BTreeMap<String, IndexRecord>,
}

/// Process-local index for tests and offline runs.
///
/// Scores blend cosine similarity against `content_vector` with the fraction
/// of query terms present in `content`.
pub struct InMemorySearchStore {
    index_name: String,
    index: RwLock<Option<InMemoryIndex>>,
}

impl InMemorySearchStore {
    #[must_use]
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            index_name: index_name.into(),
            index: RwLock::new(None),
        }
    }

    fn missing(&self) -> SearchError {
        SearchError::NotFound(self.index_name.clone())
    }
}

impl std::fmt::Debug for InMemorySearchStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySearchStore")
            .field("index_name", &self.index_name)
            .finish_non_exhaustive()
    }
}

fn lock_error<T>(e: std::sync::PoisonError<T>) -> SearchError {
    SearchError::Other(format!("index lock poisoned: {e}"))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    f64::from(dot / (norm_a * norm_b))
}

fn terms(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn keyword_overlap(query: &HashSet<String>, content: &str) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    let content = terms(content);
    let hits = query.iter().filter(|t| content.contains(*t)).count();
    hits as f64 / query.len() as f64
}

fn project(record: &IndexRecord, select: &[String]) -> serde_json::Map<String, serde_json::Value> {
    let serde_json::Value::Object(mut all) = serde_json::to_value(record).unwrap_or_default()
    else {
        return serde_json::Map::new();
    };
    if !select.is_empty() {
        all.retain(|k, _| select.iter().any(|s| s == k));
    }
    all
}

impl SearchStore for InMemorySearchStore {
    fn index_name(&self) -> &str {
        &self.index_name
    }

    fn create_index(&self, schema: &IndexSchema) -> BoxFuture<'_, Result<(), SearchError>> {
        let dimensions = schema.vector_dimensions();
        Box::pin(async move {
            let mut index = self.index.write().map_err(lock_error)?;
            match index.as_mut() {
                Some(existing) => existing.dimensions = dimensions,
                None => {
                    *index = Some(InMemoryIndex {
                        dimensions,
                        records: BTreeMap::new(),
                    });
                }
            }
            Ok(())
        })
    }

    fn delete_index(&self) -> BoxFuture<'_, Result<(), SearchError>> {
        Box::pin(async move {
            let mut index = self.index.write().map_err(lock_error)?;
            index.take().map(|_| ()).ok_or_else(|| self.missing())
        })
    }

    fn upload(&self, records: Vec<IndexRecord>) -> BoxFuture<'_, Result<(), SearchError>> {
        Box::pin(async move {
            let mut guard = self.index.write().map_err(lock_error)?;
            let index = guard.as_mut().ok_or_else(|| self.missing())?;

            let mut failed = Vec::new();
            for record in records {
                if index
                    .dimensions
                    .is_some_and(|d| d != record.content_vector.len())
                {
                    failed.push(record.id);
                    continue;
                }
                index.records.insert(record.id.clone(), record);
            }
            if failed.is_empty() {
                Ok(())
            } else {
                Err(SearchError::Upload { failed })
            }
        })
    }

    fn hybrid_search(
        &self,
        query: HybridQuery,
    ) -> BoxFuture<'_, Result<Vec<SearchHit>, SearchError>> {
        Box::pin(async move {
            let guard = self.index.read().map_err(lock_error)?;
            let index = guard.as_ref().ok_or_else(|| self.missing())?;
            let query_terms = terms(&query.text);

            let mut scored: Vec<(f64, &IndexRecord)> = index
                .records
                .values()
                .map(|r| {
                    let score = VECTOR_WEIGHT
                        * cosine_similarity(&query.vector, &r.content_vector)
                        + KEYWORD_WEIGHT * keyword_overlap(&query_terms, &r.content);
                    (score, r)
                })
                .collect();

            scored.sort_by(|a, b| {
                b.0.partial_cmp(&a.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.1.id.cmp(&b.1.id))
            });
            scored.truncate(query.top_k);

            Ok(scored
                .into_iter()
                .map(|(score, r)| SearchHit {
                    score,
                    fields: project(r, &query.select),
                })
                .collect())
        })
    }

    fn document_count(&self) -> BoxFuture<'_, Result<u64, SearchError>> {
        Box::pin(async move {
            let guard = self.index.read().map_err(lock_error)?;
            let index = guard.as_ref().ok_or_else(|| self.missing())?;
            Ok(index.records.len() as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, content: &str, vector: Vec<f32>) -> IndexRecord {
        IndexRecord {
            id: id.into(),
            content: content.into(),
            sop_number: "1.1".into(),
            title: format!("title {id}"),
            section_type: "Purpose".into(),
            version: "1.0".into(),
            filename: "f.pdf".into(),
            effective_date: String::new(),
            content_vector: vector,
        }
    }

    async fn store_with_index(dims: usize) -> InMemorySearchStore {
        let store = InMemorySearchStore::new("sops");
        store
            .create_index(&IndexSchema::sop_index("sops", dims))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn operations_on_missing_index_fail() {
        let store = InMemorySearchStore::new("sops");
        assert!(matches!(
            store.document_count().await,
            Err(SearchError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_index().await,
            Err(SearchError::NotFound(_))
        ));
        assert!(matches!(
            store.upload(vec![record("a", "x", vec![1.0])]).await,
            Err(SearchError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn upload_upserts_by_key() {
        let store = store_with_index(2).await;
        store
            .upload(vec![record("a", "one", vec![1.0, 0.0])])
            .await
            .unwrap();
        store
            .upload(vec![record("a", "two", vec![0.0, 1.0])])
            .await
            .unwrap();
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn wrong_dimension_records_are_rejected() {
        let store = store_with_index(2).await;
        let err = store
            .upload(vec![
                record("good", "x", vec![1.0, 0.0]),
                record("bad", "y", vec![1.0]),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Upload { ref failed } if failed == &["bad"]));
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn search_ranks_by_vector_then_keywords() {
        let store = store_with_index(2).await;
        store
            .upload(vec![
                record("a", "visitor parking rules", vec![1.0, 0.0]),
                record("b", "consent forms", vec![0.0, 1.0]),
                record("c", "parking permits", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let hits = store
            .hybrid_search(HybridQuery::new("parking", vec![1.0, 0.0], 3))
            .await
            .unwrap();
        let titles: Vec<_> = hits.iter().map(|h| h.field_str("title").unwrap()).collect();
        assert_eq!(titles, ["title a", "title c", "title b"]);
        assert!((hits[0].score - 1.0).abs() < 1e-6);
        assert!((hits[1].score - 0.3).abs() < 1e-6);
        assert!(hits[2].score.abs() < 1e-6);
    }

    #[tokio::test]
    async fn search_respects_top_k_and_projection() {
        let store = store_with_index(1).await;
        store
            .upload((0..5).map(|i| record(&format!("r{i}"), "text", vec![1.0])).collect())
            .await
            .unwrap();

        let hits = store
            .hybrid_search(HybridQuery::new("text", vec![1.0], 2))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        let mut keys: Vec<_> = hits[0].fields.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, ["content", "section_type", "sop_number", "title"]);
    }

    #[tokio::test]
    async fn empty_index_returns_no_hits() {
        let store = store_with_index(1).await;
        let hits = store
            .hybrid_search(HybridQuery::new("anything", vec![1.0], 3))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn recreate_keeps_records_and_delete_drops_them() {
        let store = store_with_index(1).await;
        store
            .upload(vec![record("a", "x", vec![1.0])])
            .await
            .unwrap();
        store
            .create_index(&IndexSchema::sop_index("sops", 1))
            .await
            .unwrap();
        assert_eq!(store.document_count().await.unwrap(), 1);

        store.delete_index().await.unwrap();
        assert!(store.document_count().await.is_err());
    }

    #[test]
    fn keyword_overlap_is_case_insensitive_fraction() {
        let q = terms("Visitor PARKING hours");
        assert!((keyword_overlap(&q, "parking for visitors") - 1.0 / 3.0).abs() < 1e-9);
        assert!((keyword_overlap(&q, "visitor parking hours") - 1.0).abs() < 1e-9);
        assert!(keyword_overlap(&HashSet::new(), "x").abs() < f64::EPSILON);
    }

    #[test]
    fn cosine_similarity_orthogonal_and_zero() {
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-9);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]).abs() < 1e-9);
    }
}
