pub mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod inventory;
mod models;
pub mod notifications;
pub mod reports;
pub mod repository;
pub mod search;
pub mod storage;
pub mod vouchers;

pub use models::{InventoryEvent, Notice, NoticeLevel, SubmitOutcome};

use anyhow::Result;
use chrono::NaiveDate;
use entities::inventory::InventoryItem;
use entities::vouchers::{EntryVoucher, ExitVoucher};
use error::{PageError, StoreResult};
use inventory::listing::DEFAULT_PAGE_SIZE;
use inventory::{export_csv, Confirm, CsvExport, DeleteOutcome, FormMode, InventoryList, ItemForm};
use repository::Repositories;
use search::SearchIndex;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info, warn};
use vouchers::{EntryVoucherForm, ExitFilter, ExitVoucherForm, StatusCatalog};

/// Everything a screen or handler needs: the repositories, the search index kept in
/// step with inventory writes, and the event channel those writes are announced on.
pub struct InventoryService<I: SearchIndex> {
    repos: Repositories,
    index: I,
    notification_tx: broadcast::Sender<InventoryEvent>,
    statuses: StatusCatalog,
    page_size: usize,
}

impl<I: SearchIndex> InventoryService<I> {
    pub fn new(repos: Repositories, index: I) -> Self {
        let (notification_tx, _) = broadcast::channel(100);
        Self {
            repos,
            index,
            notification_tx,
            statuses: StatusCatalog::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Publishes on an existing channel, e.g. the one a `NotificationHub` serves.
    pub fn with_notifications(mut self, sender: broadcast::Sender<InventoryEvent>) -> Self {
        self.notification_tx = sender;
        self
    }

    pub fn with_statuses(mut self, statuses: StatusCatalog) -> Self {
        self.statuses = statuses;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn repos(&self) -> &Repositories {
        &self.repos
    }

    pub fn statuses(&self) -> &StatusCatalog {
        &self.statuses
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn subscribe(&self) -> BroadcastStream<InventoryEvent> {
        BroadcastStream::new(self.notification_tx.subscribe())
    }

    pub fn sender(&self) -> broadcast::Sender<InventoryEvent> {
        self.notification_tx.clone()
    }

    fn publish(&self, event: InventoryEvent) {
        // no subscribers is not an error
        let _ = self.notification_tx.send(event);
    }

    async fn reindex(&self, item: &InventoryItem) {
        if let Err(err) = self.index.index_item(item).await {
            warn!(error = %err, code = %item.code, "failed to index inventory item");
        }
    }

    pub async fn load_inventory(&self) -> Result<InventoryList, PageError> {
        InventoryList::load(&self.repos.inventory, self.page_size).await
    }

    /// `Ok(None)` means the caller should fall back to the list.
    pub async fn item(&self, id: &str) -> StoreResult<Option<InventoryItem>> {
        self.repos.inventory.get(id).await
    }

    /// Creates or replaces the record behind `form`, depending on its mode.
    pub async fn submit_item(&self, form: &ItemForm) -> SubmitOutcome {
        let mut item = match form.to_item() {
            Ok(item) => item,
            Err(err) => return SubmitOutcome::rejected(err),
        };

        match form.mode() {
            FormMode::Create => match self.repos.inventory.create(&item).await {
                Ok(id) => {
                    info!(%id, code = %item.code, "created inventory item");
                    item.id = Some(id.clone());
                    self.reindex(&item).await;
                    self.publish(InventoryEvent::Created(item));
                    SubmitOutcome::Saved {
                        id,
                        notice: Notice::success("Le produit a été ajouté avec succès"),
                    }
                }
                Err(err) => {
                    error!(error = %err, "failed to create inventory item");
                    SubmitOutcome::Failed {
                        notice: Notice::error(
                            "Une erreur s'est produite lors de l'ajout du produit",
                        ),
                    }
                }
            },
            FormMode::Edit { id } => match self.repos.inventory.replace(id, &item).await {
                Ok(()) => {
                    info!(%id, "updated inventory item");
                    self.reindex(&item).await;
                    self.publish(InventoryEvent::Updated(item));
                    SubmitOutcome::Saved {
                        id: id.clone(),
                        notice: Notice::success("Le produit a été mis à jour avec succès"),
                    }
                }
                Err(err) => {
                    error!(%id, error = %err, "failed to update inventory item");
                    SubmitOutcome::Failed {
                        notice: Notice::error("Une erreur s'est produite lors de la mise à jour"),
                    }
                }
            },
        }
    }

    pub async fn delete_item(
        &self,
        list: &mut InventoryList,
        id: &str,
        confirm: &impl Confirm,
    ) -> DeleteOutcome {
        let outcome = list.delete(&self.repos.inventory, id, confirm).await;
        if let DeleteOutcome::Deleted(_) = outcome {
            if let Err(err) = self.index.remove_item(id).await {
                warn!(%id, error = %err, "failed to remove item from index");
            }
            self.publish(InventoryEvent::Deleted(id.to_string()));
        }
        outcome
    }

    pub async fn export(&self, today: NaiveDate) -> Result<CsvExport, PageError> {
        let list = self.load_inventory().await?;
        let export = export_csv(list.items(), today);
        info!(rows = list.items().len(), filename = %export.filename, "exported inventory");
        Ok(export)
    }

    /// Items matching `query`, best match first. Ids the store no longer knows are
    /// dropped.
    pub async fn search(&self, query: &str) -> Result<Vec<InventoryItem>> {
        let hits = self.index.search(query).await?;
        let mut items = Vec::with_capacity(hits.len());
        for (id, _score) in hits {
            match self.repos.inventory.get(&id).await {
                Ok(Some(item)) => items.push(item),
                Ok(None) => warn!(%id, "search hit for a missing item"),
                Err(err) => warn!(%id, error = %err, "skipping unreadable search hit"),
            }
        }
        Ok(items)
    }

    pub async fn rebuild_index(&self) -> Result<usize> {
        let items = self.repos.inventory.list().await?;
        self.index.rebuild(&items).await?;
        info!(count = items.len(), "rebuilt search index");
        Ok(items.len())
    }

    /// Submits a bon d'entrée. The inventory record it creates is indexed and
    /// announced even when the voucher write fails afterwards.
    pub async fn submit_entry(&self, form: &EntryVoucherForm) -> SubmitOutcome {
        let submission = form.submit(&self.repos, &self.statuses).await;
        if let Some(item) = submission.item {
            self.reindex(&item).await;
            self.publish(InventoryEvent::Created(item));
        }
        submission.outcome
    }

    pub async fn submit_exit(&self, form: &ExitVoucherForm) -> SubmitOutcome {
        form.submit(&self.repos.exits, &self.statuses).await
    }

    pub async fn entries(
        &self,
        category: Option<entities::inventory::Category>,
    ) -> Result<Vec<EntryVoucher>, PageError> {
        let entries = vouchers::entry::load_entries(&self.repos.entries).await?;
        Ok(vouchers::filter_entries(&entries, category)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn exits(&self, filter: &ExitFilter) -> Result<Vec<ExitVoucher>, PageError> {
        let exits = vouchers::exit::load_exits(&self.repos.exits).await?;
        Ok(filter
            .apply(&exits, &self.statuses)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn set_exit_status(&self, id: &str, statut: &str) -> StoreResult<ExitVoucher> {
        vouchers::exit::set_status(&self.repos.exits, id, statut).await
    }

    pub async fn stock_stats(&self) -> Result<reports::StockStats, PageError> {
        reports::load_stock_stats(&self.repos).await
    }

    pub async fn inventory_report(&self) -> Result<reports::InventoryReport, PageError> {
        reports::load_inventory_report(&self.repos).await
    }

    pub async fn movement_report(&self) -> Result<reports::MovementReport, PageError> {
        reports::load_movement_report(&self.repos).await
    }

    pub async fn agent_activity(&self) -> Result<Vec<reports::AgentActivity>, PageError> {
        reports::load_agent_activity(&self.repos).await
    }

    pub async fn recent_activities(&self) -> Result<Vec<reports::Activity>, PageError> {
        reports::load_recent_activities(&self.repos).await
    }
}
