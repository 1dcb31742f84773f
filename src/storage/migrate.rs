//! One-off rewrite of historical field names.
//!
//! Older documents spell the same concept several ways (`piece`, `name`, `nom`,
//! `produit`...). Readers in this crate only understand the canonical spelling.

use crate::error::StoreResult;
use crate::inventory::form::coerce_quantity;
use crate::storage::{Collection, Document, DocumentStore};
use chrono::{DateTime, NaiveDate};
use serde_json::Value;
use tracing::{info, warn};

/// Canonical name followed by the legacy aliases it absorbs, in precedence order.
type Renames = &'static [(&'static str, &'static [&'static str])];

const MOVEMENT_RENAMES: Renames = &[
    ("piece", &["name", "nom", "product", "produit", "nomProduit"]),
    ("reference", &["ref"]),
    ("quantite", &["quantity"]),
    ("categorie", &["category"]),
    ("statut", &["status"]),
];

const EXIT_RENAMES: Renames = &[
    ("reference", &["referenceCommande"]),
    ("agent", &["utilisateur"]),
    ("motif", &["observations", "reason"]),
    ("departement", &["agentDepartment", "department"]),
];

const ENTRY_RENAMES: Renames = &[("fournisseur", &["supplier"]), ("agent", &["utilisateur"])];

const DIRECTORY_RENAMES: Renames = &[
    ("nom", &["name"]),
    ("departement", &["department"]),
    ("categorie", &["category"]),
];

const USER_RENAMES: Renames = &[("displayName", &["name", "nom"])];

fn renames_for(collection: Collection) -> Vec<Renames> {
    match collection {
        Collection::Inventory | Collection::Products => vec![MOVEMENT_RENAMES],
        Collection::Entrees => vec![MOVEMENT_RENAMES, ENTRY_RENAMES],
        Collection::Sorties => vec![EXIT_RENAMES, MOVEMENT_RENAMES],
        Collection::Categories
        | Collection::Suppliers
        | Collection::Pieces
        | Collection::Agents => vec![DIRECTORY_RENAMES],
        Collection::Users => vec![USER_RENAMES],
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn apply_renames(doc: &mut Document, renames: Renames) -> bool {
    let mut changed = false;
    for (canonical, aliases) in renames {
        for alias in aliases.iter() {
            let Some(value) = doc.remove(*alias) else {
                continue;
            };
            changed = true;
            let keep_existing = doc.get(*canonical).is_some_and(|v| !is_blank(v));
            if !keep_existing && !is_blank(&value) {
                doc.insert((*canonical).to_string(), value);
            }
        }
    }
    changed
}

/// Same coercion as the item form.
fn numeric_quantity(doc: &mut Document) -> bool {
    let Some(Value::String(raw)) = doc.get("quantite") else {
        return false;
    };
    let number = coerce_quantity(raw);
    doc.insert("quantite".into(), Value::from(number));
    true
}

fn normalize_date(doc: &mut Document) -> bool {
    let Some(Value::String(raw)) = doc.get("date") else {
        return false;
    };
    if NaiveDate::parse_from_str(raw, "%Y-%m-%d").is_ok() {
        return false;
    }
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => {
            let day = parsed.date_naive().format("%Y-%m-%d").to_string();
            doc.insert("date".into(), Value::String(day));
            true
        }
        Err(_) => false,
    }
}

fn normalize_category(collection: Collection, doc: &mut Document) -> bool {
    match doc.get("categorie") {
        Some(Value::String(raw)) => {
            let lowered = raw.trim().to_lowercase();
            if lowered == *raw {
                return false;
            }
            doc.insert("categorie".into(), Value::String(lowered));
            true
        }
        None if collection == Collection::Inventory => {
            doc.insert("categorie".into(), Value::String("electrical".into()));
            true
        }
        _ => false,
    }
}

/// Rewrites `doc` in place to canonical field names. Returns whether anything changed.
pub fn normalize(collection: Collection, doc: &mut Document) -> bool {
    let mut changed = false;
    for renames in renames_for(collection) {
        changed |= apply_renames(doc, renames);
    }
    changed |= numeric_quantity(doc);
    changed |= normalize_date(doc);
    changed |= normalize_category(collection, doc);
    changed
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MigrationReport {
    pub scanned: usize,
    pub rewritten: usize,
}

pub async fn migrate_collection(
    store: &dyn DocumentStore,
    collection: Collection,
) -> StoreResult<MigrationReport> {
    let mut report = MigrationReport::default();
    for (id, mut doc) in store.list(collection).await? {
        report.scanned += 1;
        if !normalize(collection, &mut doc) {
            continue;
        }
        match store.replace(collection, &id, doc).await {
            Ok(()) => report.rewritten += 1,
            // deleted between list and replace
            Err(err) if err.is_not_found() => warn!(%collection, %id, "document vanished during migration"),
            Err(err) => return Err(err),
        }
    }
    info!(%collection, scanned = report.scanned, rewritten = report.rewritten, "migration done");
    Ok(report)
}

pub async fn migrate_all(store: &dyn DocumentStore) -> StoreResult<Vec<(Collection, MigrationReport)>> {
    let mut reports = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        reports.push((collection, migrate_collection(store, collection).await?));
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStore;
    use anyhow::Result;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_aliases_move_to_canonical_names() {
        let mut d = doc(json!({
            "product": "Disjoncteur 20A",
            "quantity": "12",
            "status": "Pending",
            "reason": "remplacement",
            "agentDepartment": "Maintenance",
        }));
        assert!(normalize(Collection::Sorties, &mut d));
        assert_eq!(
            Value::Object(d),
            json!({
                "piece": "Disjoncteur 20A",
                "quantite": 12,
                "statut": "Pending",
                "motif": "remplacement",
                "departement": "Maintenance",
            })
        );
    }

    #[test]
    fn test_quantity_strings_coerce_like_the_form() {
        for (raw, expected) in [("3.5", 3u32), (" 12 ", 12), ("-4", 0), ("beaucoup", 0)] {
            let mut d = doc(json!({"quantite": raw}));
            assert!(normalize(Collection::Sorties, &mut d));
            assert_eq!(d["quantite"], expected, "quantite {raw:?}");
            assert_eq!(coerce_quantity(raw), expected);
        }
    }

    #[test]
    fn test_canonical_value_wins() {
        let mut d = doc(json!({"piece": "Valve", "nom": "Ancien nom", "categorie": "mechanical"}));
        assert!(normalize(Collection::Inventory, &mut d));
        assert_eq!(d["piece"], "Valve");
        assert!(!d.contains_key("nom"));
    }

    #[test]
    fn test_blank_canonical_is_filled_from_alias() {
        let mut d = doc(json!({"piece": "", "produit": "Joint", "categorie": "mechanical"}));
        normalize(Collection::Inventory, &mut d);
        assert_eq!(d["piece"], "Joint");
    }

    #[test]
    fn test_inventory_category_defaults_and_lowercases() {
        let mut missing = doc(json!({"code": "X"}));
        assert!(normalize(Collection::Inventory, &mut missing));
        assert_eq!(missing["categorie"], "electrical");

        let mut upper = doc(json!({"code": "X", "categorie": "Mechanical"}));
        assert!(normalize(Collection::Inventory, &mut upper));
        assert_eq!(upper["categorie"], "mechanical");
    }

    #[test]
    fn test_rfc3339_dates_become_days() {
        let mut d = doc(json!({"date": "2024-03-05T10:30:00Z"}));
        assert!(normalize(Collection::Entrees, &mut d));
        assert_eq!(d["date"], "2024-03-05");

        let mut already = doc(json!({"date": "2024-03-05"}));
        assert!(!normalize(Collection::Entrees, &mut already));
    }

    #[test]
    fn test_canonical_documents_are_untouched() {
        let mut d = doc(json!({
            "code": "E-1", "piece": "Câble", "quantite": 3, "categorie": "electrical"
        }));
        assert!(!normalize(Collection::Inventory, &mut d));
    }

    #[tokio::test]
    async fn test_migrate_collection_rewrites_only_changed() -> Result<()> {
        let store = MemoryStore::new();
        store
            .add(Collection::Agents, doc(json!({"name": "Ahmed", "department": "Réseau"})))
            .await?;
        store
            .add(Collection::Agents, doc(json!({"nom": "Fatima", "departement": "Station"})))
            .await?;

        let report = migrate_collection(&store, Collection::Agents).await?;
        assert_eq!(report, MigrationReport { scanned: 2, rewritten: 1 });

        let agents = store.list(Collection::Agents).await?;
        assert_eq!(agents[0].1["nom"], "Ahmed");
        assert_eq!(agents[0].1["departement"], "Réseau");

        let again = migrate_collection(&store, Collection::Agents).await?;
        assert_eq!(again.rewritten, 0);
        Ok(())
    }
}
