//! Dashboard aggregates computed from whole collections.
//!
//! Everything here works on already-fetched records; the `load_*` functions only add
//! the fetching and map store failures to a page-level message.

use crate::entities::directory::{Agent, Product};
use crate::entities::vouchers::{initials, EntryVoucher, ExitVoucher};
use crate::error::PageError;
use crate::repository::Repositories;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::info;

pub const MONTHS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Juin", "Juil", "Août", "Sep", "Oct", "Nov", "Déc",
];

pub const TOP_PRODUCTS: usize = 5;
pub const RECENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockStats {
    pub total_products: usize,
    pub total_categories: usize,
    pub total_suppliers: usize,
    pub out_of_stock: usize,
    pub low_stock: usize,
    pub total_entries: u64,
    pub total_exits: u64,
    pub stock_value: f64,
}

fn stock_value(products: &[Product]) -> f64 {
    products
        .iter()
        .filter_map(|p| Some(f64::from(p.stock_actuel?) * p.prix_unitaire?))
        .sum()
}

pub fn stock_stats(
    products: &[Product],
    total_categories: usize,
    total_suppliers: usize,
    entries: &[EntryVoucher],
    exits: &[ExitVoucher],
) -> StockStats {
    let current = |p: &Product| p.stock_actuel.unwrap_or(0);
    StockStats {
        total_products: products.len(),
        total_categories,
        total_suppliers,
        out_of_stock: products.iter().filter(|p| current(p) == 0).count(),
        low_stock: products
            .iter()
            .filter(|p| current(p) > 0 && current(p) <= p.seuil_alerte.unwrap_or(0))
            .count(),
        total_entries: entries.iter().map(|e| u64::from(e.quantite)).sum(),
        total_exits: exits.iter().map(|s| u64::from(s.quantite)).sum(),
        stock_value: stock_value(products),
    }
}

/// Label for products filed without a category.
pub const UNCATEGORIZED: &str = "Autre";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryShare {
    pub category: String,
    pub count: usize,
    /// Rounded share of all products, 0 when there are none.
    pub percentage: u32,
}

/// A product strictly below its alert threshold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockAlert {
    pub name: String,
    pub reference: String,
    pub current_stock: u32,
    pub min_stock: u32,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryReport {
    pub by_category: Vec<CategoryShare>,
    pub alerts: Vec<StockAlert>,
    pub total_products: usize,
    pub total_categories: usize,
    pub total_value: f64,
    pub alert_count: usize,
}

/// Categories appear in the order their first product was found.
pub fn inventory_report(products: &[Product], total_categories: usize) -> InventoryReport {
    let mut by_category: Vec<CategoryShare> = Vec::new();
    for product in products {
        let category = match product.categorie.trim() {
            "" => UNCATEGORIZED,
            name => name,
        };
        match by_category.iter_mut().find(|share| share.category == category) {
            Some(share) => share.count += 1,
            None => by_category.push(CategoryShare {
                category: category.to_string(),
                count: 1,
                percentage: 0,
            }),
        }
    }
    let total = products.len();
    for share in &mut by_category {
        share.percentage = (share.count as f64 / total as f64 * 100.0).round() as u32;
    }

    let alerts: Vec<StockAlert> = products
        .iter()
        .filter_map(|p| match (p.stock_actuel, p.seuil_alerte) {
            (Some(current), Some(min)) if current < min => Some(StockAlert {
                name: p.piece.clone(),
                reference: p.reference.clone(),
                current_stock: current,
                min_stock: min,
                category: p.categorie.clone(),
            }),
            _ => None,
        })
        .collect();

    InventoryReport {
        alert_count: alerts.len(),
        by_category,
        alerts,
        total_products: total,
        total_categories,
        total_value: stock_value(products),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyMovement {
    pub month: &'static str,
    pub entries: u64,
    pub exits: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductMovement {
    pub product: String,
    pub reference: String,
    pub entries: u64,
    pub exits: u64,
    pub balance: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementReport {
    pub monthly: Vec<MonthlyMovement>,
    pub top_products: Vec<ProductMovement>,
    pub total_entries: u64,
    pub total_exits: u64,
    pub balance: i64,
    pub turnover: f64,
}

/// Entries over exits, rounded to two decimals; 0 when nothing left the store.
pub fn turnover(entries: u64, exits: u64) -> f64 {
    if exits == 0 {
        return 0.0;
    }
    (entries as f64 / exits as f64 * 100.0).round() / 100.0
}

/// Index of the product a voucher line refers to: same reference first, same name
/// otherwise.
fn product_for(products: &[Product], piece: &str, reference: &str) -> Option<usize> {
    let by_reference = || {
        products
            .iter()
            .position(|p| !reference.is_empty() && p.reference == reference)
    };
    by_reference().or_else(|| {
        products
            .iter()
            .position(|p| !piece.is_empty() && p.piece == piece)
    })
}

pub fn movement_report(
    entries: &[EntryVoucher],
    exits: &[ExitVoucher],
    products: &[Product],
) -> MovementReport {
    let mut monthly: Vec<MonthlyMovement> = MONTHS
        .iter()
        .map(|&month| MonthlyMovement {
            month,
            entries: 0,
            exits: 0,
        })
        .collect();
    let mut per_product: Vec<(u64, u64)> = vec![(0, 0); products.len()];

    for entry in entries {
        let quantity = u64::from(entry.quantite);
        monthly[entry.date.month0() as usize].entries += quantity;
        if let Some(i) = product_for(products, &entry.piece, &entry.reference) {
            per_product[i].0 += quantity;
        }
    }
    for exit in exits {
        let quantity = u64::from(exit.quantite);
        monthly[exit.date.month0() as usize].exits += quantity;
        if let Some(i) = product_for(products, &exit.piece, &exit.reference) {
            per_product[i].1 += quantity;
        }
    }

    let mut top_products: Vec<ProductMovement> = products
        .iter()
        .zip(per_product)
        .map(|(product, (entries, exits))| ProductMovement {
            product: product.piece.clone(),
            reference: product.reference.clone(),
            entries,
            exits,
            balance: entries as i64 - exits as i64,
        })
        .collect();
    top_products.sort_by(|a, b| (b.entries + b.exits).cmp(&(a.entries + a.exits)));
    top_products.truncate(TOP_PRODUCTS);

    let total_entries = entries.iter().map(|e| u64::from(e.quantite)).sum();
    let total_exits = exits.iter().map(|s| u64::from(s.quantite)).sum();
    MovementReport {
        monthly,
        top_products,
        total_entries,
        total_exits,
        balance: total_entries as i64 - total_exits as i64,
        turnover: turnover(total_entries, total_exits),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductQuantity {
    pub name: String,
    pub quantity: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentActivity {
    pub name: String,
    pub departement: String,
    pub initials: String,
    pub vouchers: usize,
    pub products: Vec<ProductQuantity>,
}

/// One row per named agent, in directory order. Exits issued to someone outside the
/// directory are ignored.
pub fn agent_activity(agents: &[Agent], exits: &[ExitVoucher]) -> Vec<AgentActivity> {
    let mut rows: Vec<AgentActivity> = Vec::with_capacity(agents.len());
    for agent in agents.iter().filter(|a| !a.nom.trim().is_empty()) {
        if rows.iter().any(|row| row.name == agent.nom) {
            continue;
        }
        rows.push(AgentActivity {
            name: agent.nom.clone(),
            departement: agent.departement.clone(),
            initials: initials(&agent.nom),
            vouchers: 0,
            products: Vec::new(),
        });
    }

    for exit in exits {
        let Some(row) = rows.iter_mut().find(|row| row.name == exit.agent) else {
            continue;
        };
        row.vouchers += 1;
        if exit.piece.is_empty() {
            continue;
        }
        match row.products.iter_mut().find(|p| p.name == exit.piece) {
            Some(product) => product.quantity += u64::from(exit.quantite),
            None => row.products.push(ProductQuantity {
                name: exit.piece.clone(),
                quantity: u64::from(exit.quantite),
            }),
        }
    }
    rows
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Entry,
    Exit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub date: NaiveDate,
    pub user: String,
    pub initials: String,
    pub product: String,
    pub quantity: u32,
    pub reference: String,
}

fn activity(
    kind: ActivityKind,
    id: Option<&str>,
    date: NaiveDate,
    user: &str,
    product: &str,
    quantity: u32,
    reference: &str,
) -> Activity {
    let initials = match initials(user) {
        i if i.is_empty() => "U".to_string(),
        i => i,
    };
    Activity {
        id: id.unwrap_or_default().to_string(),
        kind,
        date,
        user: user.to_string(),
        initials,
        product: product.to_string(),
        quantity,
        reference: reference.to_string(),
    }
}

/// Entries and exits merged, newest first. Ties keep entries before exits.
pub fn recent_activities(
    entries: &[EntryVoucher],
    exits: &[ExitVoucher],
    limit: usize,
) -> Vec<Activity> {
    let mut all: Vec<Activity> = entries
        .iter()
        .map(|e| {
            activity(
                ActivityKind::Entry,
                e.id.as_deref(),
                e.date,
                &e.agent,
                &e.piece,
                e.quantite,
                &e.reference,
            )
        })
        .chain(exits.iter().map(|s| {
            activity(
                ActivityKind::Exit,
                s.id.as_deref(),
                s.date,
                &s.agent,
                &s.piece,
                s.quantite,
                &s.reference,
            )
        }))
        .collect();
    all.sort_by(|a, b| b.date.cmp(&a.date));
    all.truncate(limit);
    all
}

pub async fn load_stock_stats(repos: &Repositories) -> Result<StockStats, PageError> {
    let fail = |err| PageError::new("Erreur lors du chargement des statistiques.", err);
    let products = repos.products.list().await.map_err(fail)?;
    let categories = repos.categories.list().await.map_err(fail)?;
    let suppliers = repos.suppliers.list().await.map_err(fail)?;
    let exits = repos.exits.list().await.map_err(fail)?;
    let entries = repos.entries.list().await.map_err(fail)?;
    Ok(stock_stats(
        &products,
        categories.len(),
        suppliers.len(),
        &entries,
        &exits,
    ))
}

pub async fn load_inventory_report(repos: &Repositories) -> Result<InventoryReport, PageError> {
    let fail = |err| PageError::new("Erreur lors du chargement des données d'inventaire.", err);
    let products = repos.products.list().await.map_err(fail)?;
    let categories = repos.categories.list().await.map_err(fail)?;
    Ok(inventory_report(&products, categories.len()))
}

pub async fn load_movement_report(repos: &Repositories) -> Result<MovementReport, PageError> {
    let fail = |err| PageError::new("Erreur lors du chargement des mouvements.", err);
    let entries = repos.entries.list().await.map_err(fail)?;
    let exits = repos.exits.list().await.map_err(fail)?;
    let products = repos.products.list().await.map_err(fail)?;
    info!(
        entries = entries.len(),
        exits = exits.len(),
        "computing movement report"
    );
    Ok(movement_report(&entries, &exits, &products))
}

pub async fn load_agent_activity(repos: &Repositories) -> Result<Vec<AgentActivity>, PageError> {
    let fail = |err| PageError::new("Erreur lors du chargement des données des agents.", err);
    let agents = repos.agents.list().await.map_err(fail)?;
    let exits = repos.exits.list().await.map_err(fail)?;
    Ok(agent_activity(&agents, &exits))
}

pub async fn load_recent_activities(repos: &Repositories) -> Result<Vec<Activity>, PageError> {
    let fail = |err| PageError::new("Erreur lors du chargement des activités récentes.", err);
    let entries = repos.entries.list().await.map_err(fail)?;
    let exits = repos.exits.list().await.map_err(fail)?;
    Ok(recent_activities(&entries, &exits, RECENT_LIMIT))
}
