use crate::entities::inventory::{Category, InventoryItem};
use crate::error::PageError;
use crate::models::Notice;
use crate::repository::Repository;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

pub const DEFAULT_PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    pub category: Option<Category>,
    #[serde(default)]
    pub low_stock: bool,
}

impl ItemFilter {
    pub fn matches(&self, item: &InventoryItem) -> bool {
        if let Some(category) = self.category {
            if item.category() != category {
                return false;
            }
        }
        !self.low_stock || item.is_low_stock()
    }
}

/// In-memory pagination with 1-based page numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    page_size: usize,
    current: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            current: 1,
        }
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total_pages(&self, total_items: usize) -> usize {
        total_items.div_ceil(self.page_size)
    }

    /// Moves to `page`, clamped to `[1, total_pages]`. An empty listing stays on 1.
    pub fn go_to(&mut self, page: usize, total_items: usize) -> usize {
        let last = self.total_pages(total_items).max(1);
        self.current = page.clamp(1, last);
        self.current
    }

    pub fn next(&mut self, total_items: usize) -> usize {
        self.go_to(self.current.saturating_add(1), total_items)
    }

    pub fn previous(&mut self, total_items: usize) -> usize {
        self.go_to(self.current.saturating_sub(1), total_items)
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        let start = (self.current - 1).saturating_mul(self.page_size).min(items.len());
        let end = start.saturating_add(self.page_size).min(items.len());
        &items[start..end]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub total_pages: usize,
    pub total_items: usize,
}

/// Anything that can answer a yes/no confirmation prompt.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

/// A decision already taken elsewhere, e.g. a `confirm=true` query flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmed(pub bool);

impl Confirm for Confirmed {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

impl<F: Fn(&str) -> bool> Confirm for F {
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Cancelled,
    Deleted(Notice),
    Failed(Notice),
}

/// The inventory table: everything fetched once, filtered and paged in memory.
#[derive(Debug, Clone)]
pub struct InventoryList {
    items: Vec<InventoryItem>,
    filter: ItemFilter,
    pager: Pager,
}

impl InventoryList {
    pub fn new(items: Vec<InventoryItem>, page_size: usize) -> Self {
        Self {
            items,
            filter: ItemFilter::default(),
            pager: Pager::new(page_size),
        }
    }

    pub async fn load(
        repo: &Repository<InventoryItem>,
        page_size: usize,
    ) -> Result<Self, PageError> {
        let items = repo
            .list()
            .await
            .map_err(|err| PageError::new("Erreur lors du chargement des produits.", err))?;
        info!(count = items.len(), "fetched inventory");
        Ok(Self::new(items, page_size))
    }

    /// Everything loaded, unfiltered, in fetch order.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn filter(&self) -> ItemFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: ItemFilter) {
        self.filter = filter;
        let total = self.visible().len();
        self.pager.go_to(1, total);
    }

    pub fn visible(&self) -> Vec<&InventoryItem> {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .collect()
    }

    pub fn total_pages(&self) -> usize {
        self.pager.total_pages(self.visible().len())
    }

    pub fn go_to(&mut self, page: usize) -> usize {
        let total = self.visible().len();
        self.pager.go_to(page, total)
    }

    pub fn next_page(&mut self) -> usize {
        let total = self.visible().len();
        self.pager.next(total)
    }

    pub fn previous_page(&mut self) -> usize {
        let total = self.visible().len();
        self.pager.previous(total)
    }

    pub fn current_page(&self) -> Page<InventoryItem> {
        let visible = self.visible();
        Page {
            items: self
                .pager
                .slice(&visible)
                .iter()
                .map(|item| (*item).clone())
                .collect(),
            page: self.pager.current(),
            total_pages: self.pager.total_pages(visible.len()),
            total_items: visible.len(),
        }
    }

    pub fn upsert(&mut self, item: InventoryItem) {
        match self.items.iter_mut().find(|i| i.id.is_some() && i.id == item.id) {
            Some(existing) => *existing = item,
            None => self.items.push(item),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.iter().any(|item| item.id.as_deref() == Some(id))
    }

    /// The question asked before deleting `id`, naming the item by reference.
    pub fn delete_prompt(&self, id: &str) -> String {
        let reference = self
            .items
            .iter()
            .find(|item| item.id.as_deref() == Some(id))
            .map(|item| item.reference.as_str())
            .unwrap_or(id);
        format!("Voulez-vous vraiment supprimer cette pièce: {reference}?")
    }

    /// Removes `id` from the store after confirmation, then from this list.
    ///
    /// A store-side "not found" still drops the stale row locally, since the record is
    /// gone either way, but is reported as an error.
    pub async fn delete(
        &mut self,
        repo: &Repository<InventoryItem>,
        id: &str,
        confirm: &impl Confirm,
    ) -> DeleteOutcome {
        if !confirm.confirm(&self.delete_prompt(id)) {
            return DeleteOutcome::Cancelled;
        }

        let result = repo.delete(id).await;
        if result.is_ok() || result.as_ref().is_err_and(|err| err.is_not_found()) {
            self.items.retain(|item| item.id.as_deref() != Some(id));
            self.go_to(self.pager.current());
        }
        match result {
            Ok(()) => {
                info!(%id, "deleted inventory item");
                DeleteOutcome::Deleted(Notice::success("Le produit a été supprimé avec succès"))
            }
            Err(err) => {
                error!(%id, error = %err, "failed to delete inventory item");
                DeleteOutcome::Failed(Notice::error(
                    "Une erreur s'est produite lors de la suppression",
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::inventory::CategoryDetails;
    use crate::repository::Repositories;
    use crate::storage::memory::MemoryStore;
    use anyhow::Result;
    use std::sync::Arc;

    fn item(n: usize, category: Category) -> InventoryItem {
        InventoryItem {
            id: Some(format!("id-{n}")),
            code: format!("C-{n}"),
            piece: format!("Pièce {n}"),
            marque: "ONEE".into(),
            reference: format!("REF-{n}"),
            quantite: n as u32,
            emplacement: "A-1".into(),
            observation: None,
            stock_initial: None,
            stock_actuel: None,
            seuil_alerte: None,
            details: CategoryDetails::empty(category),
        }
    }

    fn list_of(n: usize) -> InventoryList {
        InventoryList::new(
            (0..n).map(|i| item(i, Category::Electrical)).collect(),
            DEFAULT_PAGE_SIZE,
        )
    }

    #[test]
    fn test_total_pages_is_ceiling() {
        let pager = Pager::default();
        assert_eq!(pager.total_pages(0), 0);
        assert_eq!(pager.total_pages(1), 1);
        assert_eq!(pager.total_pages(5), 1);
        assert_eq!(pager.total_pages(6), 2);
        assert_eq!(pager.total_pages(23), 5);
    }

    #[test]
    fn test_first_page_ends_at_fifth_item_or_last() {
        let list = list_of(12);
        let page = list.current_page();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.items.last().unwrap().code, "C-4");

        let short = list_of(3);
        assert_eq!(short.current_page().items.last().unwrap().code, "C-2");
    }

    #[test]
    fn test_navigation_clamps() {
        let mut list = list_of(12);
        assert_eq!(list.previous_page(), 1);
        assert_eq!(list.next_page(), 2);
        assert_eq!(list.next_page(), 3);
        assert_eq!(list.next_page(), 3);
        assert_eq!(list.current_page().items.len(), 2);
        assert_eq!(list.go_to(0), 1);
        assert_eq!(list.go_to(99), 3);

        let mut empty = list_of(0);
        assert_eq!(empty.next_page(), 1);
        assert!(empty.current_page().items.is_empty());
    }

    #[test]
    fn test_category_filter() {
        let mut list = InventoryList::new(
            vec![
                item(0, Category::Electrical),
                item(1, Category::Mechanical),
                item(2, Category::Mechanical),
            ],
            DEFAULT_PAGE_SIZE,
        );
        list.set_filter(ItemFilter {
            category: Some(Category::Mechanical),
            low_stock: false,
        });
        let codes: Vec<_> = list.visible().iter().map(|i| i.code.clone()).collect();
        assert_eq!(codes, ["C-1", "C-2"]);
        assert_eq!(list.items().len(), 3);
    }

    #[test]
    fn test_low_stock_filter_is_inclusive() {
        let mut at = item(0, Category::Electrical);
        at.stock_actuel = Some(10);
        at.seuil_alerte = Some(10);
        let mut above = item(1, Category::Electrical);
        above.stock_actuel = Some(11);
        above.seuil_alerte = Some(10);
        let untracked = item(2, Category::Electrical);

        let filter = ItemFilter {
            category: None,
            low_stock: true,
        };
        assert!(filter.matches(&at));
        assert!(!filter.matches(&above));
        assert!(!filter.matches(&untracked));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation_and_is_repeatable() -> Result<()> {
        let repos = Repositories::new(Arc::new(MemoryStore::new()));
        let mut stored = item(0, Category::Electrical);
        stored.id = None;
        let id = repos.inventory.create(&stored).await?;
        let mut list = InventoryList::load(&repos.inventory, DEFAULT_PAGE_SIZE).await?;
        assert_eq!(list.items().len(), 1);

        let outcome = list.delete(&repos.inventory, &id, &Confirmed(false)).await;
        assert_eq!(outcome, DeleteOutcome::Cancelled);
        assert!(repos.inventory.get(&id).await?.is_some());

        let asked = |prompt: &str| prompt.contains("REF-0");
        let outcome = list.delete(&repos.inventory, &id, &asked).await;
        assert!(matches!(outcome, DeleteOutcome::Deleted(_)));
        assert!(list.items().is_empty());
        assert!(repos.inventory.get(&id).await?.is_none());

        let outcome = list.delete(&repos.inventory, &id, &Confirmed(true)).await;
        match outcome {
            DeleteOutcome::Failed(notice) => assert!(notice.is_error()),
            other => panic!("expected failure, got {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_deleting_last_item_on_page_steps_back() -> Result<()> {
        let repos = Repositories::new(Arc::new(MemoryStore::new()));
        for n in 0..6 {
            let mut it = item(n, Category::Electrical);
            it.id = None;
            repos.inventory.create(&it).await?;
        }
        let mut list = InventoryList::load(&repos.inventory, DEFAULT_PAGE_SIZE).await?;
        assert_eq!(list.go_to(2), 2);
        let last_id = list.items()[5].id.clone().unwrap();

        list.delete(&repos.inventory, &last_id, &Confirmed(true)).await;
        assert_eq!(list.current_page().page, 1);
        assert_eq!(list.total_pages(), 1);
        Ok(())
    }
}
