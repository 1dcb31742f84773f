use anyhow::{Context, Result};
use dotenvy::dotenv;
use onee_stock::config::AppConfig;
use onee_stock::notifications::{self, NotificationHub};
use onee_stock::repository::Repositories;
use onee_stock::search::TantivyIndex;
use onee_stock::storage::database::DatabaseStore;
use onee_stock::storage::memory::MemoryStore;
use onee_stock::storage::{migrate, DocumentStore};
use onee_stock::{api, InventoryService};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

async fn open_store(config: &AppConfig) -> Result<Arc<dyn DocumentStore>> {
    Ok(match config.database_url() {
        Some(url) => {
            let store = DatabaseStore::connect(url)
                .await
                .context("failed to open the document database")?;
            Arc::new(store)
        }
        None => {
            warn!("DATABASE_URL not set, records live in memory only");
            Arc::new(MemoryStore::new())
        }
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // a missing .env is fine
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let store = open_store(&config).await?;

    if *config.migrate_on_start() {
        for (collection, report) in migrate::migrate_all(store.as_ref()).await? {
            info!(%collection, scanned = report.scanned, rewritten = report.rewritten, "migrated");
        }
    }

    let index = TantivyIndex::with_path(config.index_path().clone())
        .context("failed to open the search index")?;
    let hub = NotificationHub::new();
    let service = InventoryService::new(Repositories::new(store), index)
        .with_notifications(hub.sender())
        .with_statuses(config.statuses().clone())
        .with_page_size(*config.page_size());
    service.rebuild_index().await?;

    tokio::spawn(notifications::log_events(service.subscribe()));

    let app = api::router(Arc::new(service));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %config.bind_addr(), "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
