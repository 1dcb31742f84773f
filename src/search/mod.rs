use crate::entities::inventory::InventoryItem;
use anyhow::Result;
use async_trait::async_trait;

/// Lookup of inventory items by free text. Implementations hold only what they need
/// to answer a query and hand back item ids; the records themselves stay in the store.
#[async_trait]
pub trait SearchIndex: Clone + Send + Sync + 'static {
    /// Adds the item, replacing whatever was indexed under the same id.
    async fn index_item(&self, item: &InventoryItem) -> Result<()>;
    async fn remove_item(&self, id: &str) -> Result<()>;
    /// Matching ids with a relevance score, best first.
    async fn search(&self, query: &str) -> Result<Vec<(String, f32)>>;
    /// Drops everything and indexes `items` instead.
    async fn rebuild(&self, items: &[InventoryItem]) -> Result<()>;
}

/// Fields a query is matched against.
pub(crate) fn searchable_fields(item: &InventoryItem) -> [&str; 5] {
    [
        item.code.as_str(),
        item.piece.as_str(),
        item.reference.as_str(),
        item.marque.as_str(),
        item.emplacement.as_str(),
    ]
}

pub(crate) fn require_id(item: &InventoryItem) -> Result<&str> {
    item.id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("cannot index an item without id (code {})", item.code))
}

pub mod memory;
pub mod tantivy_index;

pub use memory::MemoryIndex;
pub use tantivy_index::TantivyIndex;
