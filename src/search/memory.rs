use crate::entities::inventory::InventoryItem;
use crate::search::{require_id, searchable_fields, SearchIndex};
use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// Case-insensitive substring matching over the searchable fields.
#[derive(Clone, Default)]
pub struct MemoryIndex {
    documents: Arc<DashMap<String, String>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    fn haystack(item: &InventoryItem) -> String {
        searchable_fields(item).join("\n").to_lowercase()
    }
}

#[async_trait]
impl SearchIndex for MemoryIndex {
    async fn index_item(&self, item: &InventoryItem) -> Result<()> {
        let id = require_id(item)?;
        self.documents.insert(id.to_string(), Self::haystack(item));
        Ok(())
    }

    async fn remove_item(&self, id: &str) -> Result<()> {
        self.documents.remove(id);
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<(String, f32)>> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let mut results: Vec<(String, f32)> = self
            .documents
            .iter()
            .filter(|entry| entry.value().contains(&query))
            .map(|entry| (entry.key().clone(), 1.0))
            .collect();
        results.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(results)
    }

    async fn rebuild(&self, items: &[InventoryItem]) -> Result<()> {
        self.documents.clear();
        for item in items {
            self.index_item(item).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::inventory::{Category, CategoryDetails};

    fn item(id: &str, piece: &str, reference: &str) -> InventoryItem {
        InventoryItem {
            id: Some(id.into()),
            code: format!("C-{id}"),
            piece: piece.into(),
            marque: "Schneider".into(),
            reference: reference.into(),
            quantite: 1,
            emplacement: "Rayon A".into(),
            observation: Some("ne pas indexer".into()),
            stock_initial: None,
            stock_actuel: None,
            seuil_alerte: None,
            details: CategoryDetails::empty(Category::Electrical),
        }
    }

    #[tokio::test]
    async fn test_index_and_search() -> Result<()> {
        let index = MemoryIndex::new();
        index.index_item(&item("1", "Disjoncteur 20A", "C60N")).await?;
        index.index_item(&item("2", "Câble 2.5mm", "U-1000")).await?;

        let results = index.search("disjonct").await?;
        assert_eq!(results, [("1".to_string(), 1.0)]);
        assert_eq!(index.search("c60n").await?.len(), 1);
        assert_eq!(index.search("schneider").await?.len(), 2);
        assert!(index.search("indexer").await?.is_empty());
        assert!(index.search("  ").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_reindex_replaces_and_remove_deletes() -> Result<()> {
        let index = MemoryIndex::new();
        index.index_item(&item("1", "Disjoncteur", "C60N")).await?;
        index.index_item(&item("1", "Contacteur", "LC1D")).await?;
        assert!(index.search("disjoncteur").await?.is_empty());
        assert_eq!(index.search("contacteur").await?.len(), 1);

        index.remove_item("1").await?;
        assert!(index.search("contacteur").await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_rebuild_and_missing_id() -> Result<()> {
        let index = MemoryIndex::new();
        index.index_item(&item("old", "Fusible", "F-1")).await?;
        index
            .rebuild(&[item("a", "Câble", "U-1"), item("b", "Gaine", "G-1")])
            .await?;
        assert!(index.search("fusible").await?.is_empty());
        assert_eq!(index.search("rayon").await?.len(), 2);

        let mut orphan = item("x", "Relais", "R-1");
        orphan.id = None;
        assert!(index.index_item(&orphan).await.is_err());
        Ok(())
    }
}
