use crate::error::StoreResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A schemaless document body. The id lives outside the body.
pub type Document = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Inventory,
    Entrees,
    Sorties,
    Products,
    Categories,
    Suppliers,
    Pieces,
    Agents,
    Users,
}

impl Collection {
    pub const ALL: [Collection; 9] = [
        Collection::Inventory,
        Collection::Entrees,
        Collection::Sorties,
        Collection::Products,
        Collection::Categories,
        Collection::Suppliers,
        Collection::Pieces,
        Collection::Agents,
        Collection::Users,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Inventory => "inventory",
            Collection::Entrees => "entrees",
            Collection::Sorties => "sorties",
            Collection::Products => "products",
            Collection::Categories => "categories",
            Collection::Suppliers => "suppliers",
            Collection::Pieces => "pieces",
            Collection::Agents => "agents",
            Collection::Users => "users",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Get-all / get-one / add / replace / delete over named collections.
///
/// `list` returns documents in the backend's fetch order; callers must not rely on
/// any particular sort. `replace` overwrites the whole body and fails on an unknown id,
/// `delete` fails on an unknown id. Nothing here is transactional.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn list(&self, collection: Collection) -> StoreResult<Vec<(String, Document)>>;
    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>>;
    async fn add(&self, collection: Collection, data: Document) -> StoreResult<String>;
    async fn replace(&self, collection: Collection, id: &str, data: Document) -> StoreResult<()>;
    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()>;
}

pub mod database;
pub mod memory;
pub mod migrate;
