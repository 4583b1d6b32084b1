use std::sync::Arc;

use super::error::SearchError;
use super::schema::IndexSchema;
use super::store::{HybridQuery, IndexRecord, SearchHit, SearchStore};

/// Documents per indexing request; the service rejects larger batches.
pub const DEFAULT_UPLOAD_BATCH: usize = 1000;

/// Index lifecycle and bulk upload on top of a [`SearchStore`].
#[derive(Clone)]
pub struct IndexManager {
    store: Arc<dyn SearchStore>,
    upload_batch: usize,
}

impl std::fmt::Debug for IndexManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexManager")
            .field("index_name", &self.store.index_name())
            .field("upload_batch", &self.upload_batch)
            .finish()
    }
}

impl IndexManager {
    #[must_use]
    pub fn new(store: Arc<dyn SearchStore>) -> Self {
        Self {
            store,
            upload_batch: DEFAULT_UPLOAD_BATCH,
        }
    }

    #[must_use]
    pub fn with_upload_batch(mut self, size: usize) -> Self {
        self.upload_batch = size.max(1);
        self
    }

    #[must_use]
    pub fn store(&self) -> &Arc<dyn SearchStore> {
        &self.store
    }

    #[must_use]
    pub fn index_name(&self) -> &str {
        self.store.index_name()
    }

    /// Create or replace the SOP index with a vector field of
    /// `vector_dimensions`.
    ///
    /// # Errors
    ///
    /// Returns an error if the service rejects the definition.
    pub async fn create_index(&self, vector_dimensions: usize) -> Result<IndexSchema, SearchError> {
        let schema = IndexSchema::sop_index(self.index_name(), vector_dimensions);
        self.store.create_index(&schema).await?;
        tracing::info!("Index '{}' created successfully", schema.name);
        Ok(schema)
    }

    /// Upsert `records` in service-sized batches. Stops at the first batch
    /// that fails outright; per-record rejections from every batch are
    /// collected into one [`SearchError::Upload`].
    ///
    /// # Errors
    ///
    /// Returns an error if a request fails or any record is rejected.
    pub async fn upload_documents(&self, records: Vec<IndexRecord>) -> Result<usize, SearchError> {
        let total = records.len();
        let mut failed = Vec::new();
        let mut records = records.into_iter().peekable();

        while records.peek().is_some() {
            let batch: Vec<IndexRecord> = records.by_ref().take(self.upload_batch).collect();
            match self.store.upload(batch).await {
                Ok(()) => {}
                Err(SearchError::Upload { failed: keys }) => failed.extend(keys),
                Err(e) => return Err(e),
            }
        }

        if !failed.is_empty() {
            return Err(SearchError::Upload { failed });
        }
        tracing::info!("Uploaded {total} documents");
        Ok(total)
    }

    /// Remove the index. Failures, including a missing index, are logged and
    /// swallowed.
    pub async fn delete_index(&self) {
        match self.store.delete_index().await {
            Ok(()) => tracing::info!("Index '{}' deleted", self.index_name()),
            Err(e) => tracing::warn!("Could not delete index: {e}"),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the index does not exist or the service fails.
    pub async fn document_count(&self) -> Result<u64, SearchError> {
        self.store.document_count().await
    }

    /// # Errors
    ///
    /// Returns an error if the search request fails.
    pub async fn hybrid_search(&self, query: HybridQuery) -> Result<Vec<SearchHit>, SearchError> {
        self.store.hybrid_search(query).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::search::store::BoxFuture;
    use crate::search::InMemorySearchStore;

    fn record(id: &str) -> IndexRecord {
        IndexRecord {
            id: id.into(),
            content: "c".into(),
            sop_number: String::new(),
            title: String::new(),
            section_type: String::new(),
            version: String::new(),
            filename: String::new(),
            effective_date: String::new(),
            content_vector: vec![1.0],
        }
    }

    /// Records batch sizes and rejects ids listed in `reject`.
    #[derive(Default)]
    struct RecordingStore {
        batches: Mutex<Vec<usize>>,
        reject: Vec<String>,
        deletes: AtomicUsize,
    }

    impl SearchStore for RecordingStore {
        fn index_name(&self) -> &str {
            "rec"
        }

        fn create_index(&self, _schema: &IndexSchema) -> BoxFuture<'_, Result<(), SearchError>> {
            Box::pin(async { Ok(()) })
        }

        fn delete_index(&self) -> BoxFuture<'_, Result<(), SearchError>> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Err(SearchError::Unavailable(503)) })
        }

        fn upload(&self, records: Vec<IndexRecord>) -> BoxFuture<'_, Result<(), SearchError>> {
            self.batches.lock().unwrap().push(records.len());
            let failed: Vec<String> = records
                .into_iter()
                .filter(|r| self.reject.contains(&r.id))
                .map(|r| r.id)
                .collect();
            Box::pin(async move {
                if failed.is_empty() {
                    Ok(())
                } else {
                    Err(SearchError::Upload { failed })
                }
            })
        }

        fn hybrid_search(
            &self,
            _query: HybridQuery,
        ) -> BoxFuture<'_, Result<Vec<SearchHit>, SearchError>> {
            Box::pin(async { Ok(Vec::new()) })
        }

        fn document_count(&self) -> BoxFuture<'_, Result<u64, SearchError>> {
            Box::pin(async { Ok(0) })
        }
    }

    #[tokio::test]
    async fn create_index_uses_store_name_and_dimensions() {
        let store = Arc::new(InMemorySearchStore::new("sop-index"));
        let manager = IndexManager::new(store);
        let schema = manager.create_index(3072).await.unwrap();
        assert_eq!(schema.name, "sop-index");
        assert_eq!(schema.vector_dimensions(), Some(3072));
        assert_eq!(manager.document_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn upload_splits_into_batches() {
        let store = Arc::new(RecordingStore::default());
        let manager = IndexManager::new(store.clone()).with_upload_batch(2);
        let records = (0..5).map(|i| record(&i.to_string())).collect();

        assert_eq!(manager.upload_documents(records).await.unwrap(), 5);
        assert_eq!(*store.batches.lock().unwrap(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn default_batch_is_service_limit() {
        let store = Arc::new(RecordingStore::default());
        let manager = IndexManager::new(store.clone());
        let records = (0..1001).map(|i| record(&i.to_string())).collect();

        manager.upload_documents(records).await.unwrap();
        assert_eq!(*store.batches.lock().unwrap(), vec![1000, 1]);
    }

    #[tokio::test]
    async fn rejected_keys_from_all_batches_are_reported() {
        let store = Arc::new(RecordingStore {
            reject: vec!["1".into(), "4".into()],
            ..RecordingStore::default()
        });
        let manager = IndexManager::new(store.clone()).with_upload_batch(2);
        let records = (0..5).map(|i| record(&i.to_string())).collect();

        let err = manager.upload_documents(records).await.unwrap_err();
        assert!(matches!(err, SearchError::Upload { ref failed } if failed == &["1", "4"]));
        assert_eq!(store.batches.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_upload_sends_nothing() {
        let store = Arc::new(RecordingStore::default());
        let manager = IndexManager::new(store.clone());
        assert_eq!(manager.upload_documents(Vec::new()).await.unwrap(), 0);
        assert!(store.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_index_swallows_failures() {
        let store = Arc::new(RecordingStore::default());
        let manager = IndexManager::new(store.clone());
        manager.delete_index().await;
        assert_eq!(store.deletes.load(Ordering::SeqCst), 1);

        let missing = IndexManager::new(Arc::new(InMemorySearchStore::new("gone")));
        missing.delete_index().await;
    }
}
