use crate::entities::directory::{Agent, CategoryRecord, Piece, Product, Supplier, User};
use crate::entities::inventory::InventoryItem;
use crate::entities::vouchers::{EntryVoucher, ExitVoucher};
use crate::error::{StoreError, StoreResult};
use crate::storage::{Collection, Document, DocumentStore};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

/// A typed row of one collection. The id is assigned by the store and stripped from
/// the body before every write.
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    const COLLECTION: Collection;

    fn id(&self) -> Option<&str>;
    fn set_id(&mut self, id: String);

    /// Adjusts a raw document before decoding.
    fn prepare(_doc: &mut Document) {}
}

macro_rules! record {
    ($ty:ty => $collection:expr) => {
        impl Record for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> Option<&str> {
                self.id.as_deref()
            }

            fn set_id(&mut self, id: String) {
                self.id = Some(id);
            }
        }
    };
}

record!(EntryVoucher => Collection::Entrees);
record!(ExitVoucher => Collection::Sorties);
record!(Product => Collection::Products);
record!(CategoryRecord => Collection::Categories);
record!(Supplier => Collection::Suppliers);
record!(Piece => Collection::Pieces);
record!(Agent => Collection::Agents);
record!(User => Collection::Users);

impl Record for InventoryItem {
    const COLLECTION: Collection = Collection::Inventory;

    fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn set_id(&mut self, id: String) {
        self.id = Some(id);
    }

    fn prepare(doc: &mut Document) {
        let category = match doc.get("categorie") {
            Some(Value::String(raw)) => raw.trim().to_lowercase(),
            _ => "electrical".to_string(),
        };
        doc.insert("categorie".into(), Value::String(category));
    }
}

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _record: PhantomData,
        }
    }
}

impl<T: Record> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _record: PhantomData,
        }
    }

    fn encode(record: &T) -> StoreResult<Document> {
        let encode_err = |source| StoreError::Encode {
            collection: T::COLLECTION,
            source,
        };
        match serde_json::to_value(record).map_err(encode_err)? {
            Value::Object(mut map) => {
                map.remove("id");
                Ok(map)
            }
            _ => Err(encode_err(serde::ser::Error::custom(
                "record did not serialize to an object",
            ))),
        }
    }

    fn decode(id: String, mut doc: Document) -> StoreResult<T> {
        T::prepare(&mut doc);
        let mut record: T =
            serde_json::from_value(Value::Object(doc)).map_err(|source| StoreError::Malformed {
                collection: T::COLLECTION,
                id: id.clone(),
                source,
            })?;
        record.set_id(id);
        Ok(record)
    }

    /// Every decodable record, in store order. Documents that do not fit `T` are
    /// logged and skipped.
    pub async fn list(&self) -> StoreResult<Vec<T>> {
        let rows = self.store.list(T::COLLECTION).await?;
        let mut records = Vec::with_capacity(rows.len());
        for (id, doc) in rows {
            match Self::decode(id, doc) {
                Ok(record) => records.push(record),
                Err(err) => warn!(error = %err, "skipping undecodable document"),
            }
        }
        Ok(records)
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<T>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(|doc| Self::decode(id.to_string(), doc))
            .transpose()
    }

    pub async fn create(&self, record: &T) -> StoreResult<String> {
        self.store.add(T::COLLECTION, Self::encode(record)?).await
    }

    pub async fn replace(&self, id: &str, record: &T) -> StoreResult<()> {
        self.store
            .replace(T::COLLECTION, id, Self::encode(record)?)
            .await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        self.store.delete(T::COLLECTION, id).await
    }
}

/// One repository per collection, built once at startup and handed to whoever needs
/// them.
#[derive(Clone)]
pub struct Repositories {
    store: Arc<dyn DocumentStore>,
    pub inventory: Repository<InventoryItem>,
    pub entries: Repository<EntryVoucher>,
    pub exits: Repository<ExitVoucher>,
    pub products: Repository<Product>,
    pub categories: Repository<CategoryRecord>,
    pub suppliers: Repository<Supplier>,
    pub pieces: Repository<Piece>,
    pub agents: Repository<Agent>,
    pub users: Repository<User>,
}

impl Repositories {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inventory: Repository::new(Arc::clone(&store)),
            entries: Repository::new(Arc::clone(&store)),
            exits: Repository::new(Arc::clone(&store)),
            products: Repository::new(Arc::clone(&store)),
            categories: Repository::new(Arc::clone(&store)),
            suppliers: Repository::new(Arc::clone(&store)),
            pieces: Repository::new(Arc::clone(&store)),
            agents: Repository::new(Arc::clone(&store)),
            users: Repository::new(Arc::clone(&store)),
            store,
        }
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }
}
