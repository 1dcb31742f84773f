use crate::error::{StoreError, StoreResult};
use crate::storage::{Collection, Document, DocumentStore};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Stored {
    seq: u64,
    data: Document,
}

/// Process-local store. Clones share the same documents.
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<DashMap<(Collection, String), Stored>>,
    next_seq: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a document under a caller-chosen id, as an imported fixture would.
    pub fn insert_with_id(&self, collection: Collection, id: &str, data: Document) {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.documents
            .insert((collection, id.to_string()), Stored { seq, data });
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: Collection) -> StoreResult<Vec<(String, Document)>> {
        let mut rows: Vec<(u64, String, Document)> = self
            .documents
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .map(|entry| (entry.seq, entry.key().1.clone(), entry.data.clone()))
            .collect();
        rows.sort_by_key(|(seq, _, _)| *seq);
        Ok(rows.into_iter().map(|(_, id, data)| (id, data)).collect())
    }

    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        Ok(self
            .documents
            .get(&(collection, id.to_string()))
            .map(|stored| stored.data.clone()))
    }

    async fn add(&self, collection: Collection, data: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.insert_with_id(collection, &id, data);
        Ok(id)
    }

    async fn replace(&self, collection: Collection, id: &str, data: Document) -> StoreResult<()> {
        match self.documents.get_mut(&(collection, id.to_string())) {
            Some(mut stored) => {
                stored.data = data;
                Ok(())
            }
            None => Err(StoreError::not_found(collection, id)),
        }
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        self.documents
            .remove(&(collection, id.to_string()))
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection, id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;
    use tokio_test::{assert_err, assert_ok};

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_add_and_get() -> Result<()> {
        let store = MemoryStore::new();
        let id = store
            .add(Collection::Inventory, doc(json!({"code": "E-01"})))
            .await?;
        let fetched = store.get(Collection::Inventory, &id).await?.unwrap();
        assert_eq!(fetched["code"], "E-01");
        assert!(store.get(Collection::Products, &id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_keeps_insertion_order() -> Result<()> {
        let store = MemoryStore::new();
        for code in ["c", "a", "b"] {
            store
                .add(Collection::Inventory, doc(json!({ "code": code })))
                .await?;
        }
        store
            .add(Collection::Agents, doc(json!({"nom": "Karim"})))
            .await?;

        let codes: Vec<_> = store
            .list(Collection::Inventory)
            .await?
            .into_iter()
            .map(|(_, d)| d["code"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(codes, ["c", "a", "b"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_overwrites_whole_body() -> Result<()> {
        let store = MemoryStore::new();
        let id = store
            .add(
                Collection::Inventory,
                doc(json!({"code": "M-01", "pompe": "P1"})),
            )
            .await?;
        store
            .replace(Collection::Inventory, &id, doc(json!({"code": "M-02"})))
            .await?;
        let fetched = store.get(Collection::Inventory, &id).await?.unwrap();
        assert_eq!(fetched["code"], "M-02");
        assert!(!fetched.contains_key("pompe"));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_ids_are_errors() -> Result<()> {
        let store = MemoryStore::new();
        let id = store.add(Collection::Sorties, Document::new()).await?;
        assert_ok!(store.delete(Collection::Sorties, &id).await);

        let err = assert_err!(store.delete(Collection::Sorties, &id).await);
        assert!(err.is_not_found());
        let err = assert_err!(
            store
                .replace(Collection::Sorties, &id, Document::new())
                .await
        );
        assert!(err.is_not_found());
        Ok(())
    }

    #[tokio::test]
    async fn test_clones_share_documents() -> Result<()> {
        let store = MemoryStore::new();
        let other = store.clone();
        let id = store.add(Collection::Users, Document::new()).await?;
        assert!(other.get(Collection::Users, &id).await?.is_some());
        Ok(())
    }
}
