use crate::entities::documents::{self, Entity as Records};
use crate::error::{StoreError, StoreResult};
use crate::storage::{Collection, Document, DocumentStore};
use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveValue::Set, ColumnTrait, ConnectOptions, ConnectionTrait, Database,
    DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Schema,
};
use tracing::{debug, info};
use uuid::Uuid;

/// Document store over a single `records` table, reachable through any sea-orm backend.
pub struct DatabaseStore {
    db: DatabaseConnection,
}

impl DatabaseStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let mut options = ConnectOptions::new(database_url.to_owned());
        options.max_connections(5).sqlx_logging(false);
        if database_url.starts_with("sqlite") {
            // in-memory SQLite is per connection
            options.max_connections(1).min_connections(1);
        }
        let db = Database::connect(options).await?;
        Self::from_connection(db).await
    }

    pub async fn from_connection(db: DatabaseConnection) -> StoreResult<Self> {
        Self::init_database(&db).await?;
        info!(backend = ?db.get_database_backend(), "document table ready");
        Ok(Self { db })
    }

    async fn init_database(db: &DatabaseConnection) -> StoreResult<()> {
        let backend = db.get_database_backend();
        let schema = Schema::new(backend);
        let mut create = schema.create_table_from_entity(Records);
        create.if_not_exists();
        db.execute(backend.build(&create)).await?;
        Ok(())
    }

    fn decode(collection: Collection, model: documents::Model) -> StoreResult<(String, Document)> {
        let data = serde_json::from_str(&model.data).map_err(|source| StoreError::Malformed {
            collection,
            id: model.id.clone(),
            source,
        })?;
        Ok((model.id, data))
    }

    fn encode(collection: Collection, data: &Document) -> StoreResult<String> {
        serde_json::to_string(data).map_err(|source| StoreError::Encode { collection, source })
    }
}

#[async_trait]
impl DocumentStore for DatabaseStore {
    async fn list(&self, collection: Collection) -> StoreResult<Vec<(String, Document)>> {
        let models = Records::find()
            .filter(documents::Column::Collection.eq(collection.as_str()))
            .order_by_asc(documents::Column::CreatedAt)
            .all(&self.db)
            .await?;
        debug!(%collection, count = models.len(), "listed documents");
        models
            .into_iter()
            .map(|model| Self::decode(collection, model))
            .collect()
    }

    async fn get(&self, collection: Collection, id: &str) -> StoreResult<Option<Document>> {
        let model = Records::find_by_id((collection.as_str().to_owned(), id.to_owned()))
            .one(&self.db)
            .await?;
        model
            .map(|model| Self::decode(collection, model).map(|(_, data)| data))
            .transpose()
    }

    async fn add(&self, collection: Collection, data: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        let record = documents::ActiveModel {
            collection: Set(collection.as_str().to_owned()),
            id: Set(id.clone()),
            data: Set(Self::encode(collection, &data)?),
            created_at: Set(chrono::Utc::now()),
        };
        Records::insert(record).exec_without_returning(&self.db).await?;
        Ok(id)
    }

    async fn replace(&self, collection: Collection, id: &str, data: Document) -> StoreResult<()> {
        let result = Records::update_many()
            .col_expr(
                documents::Column::Data,
                Expr::value(Self::encode(collection, &data)?),
            )
            .filter(documents::Column::Collection.eq(collection.as_str()))
            .filter(documents::Column::Id.eq(id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let result = Records::delete_by_id((collection.as_str().to_owned(), id.to_owned()))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Err(StoreError::not_found(collection, id));
        }
        Ok(())
    }
}
