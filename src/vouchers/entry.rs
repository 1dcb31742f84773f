use crate::entities::inventory::{Category, InventoryItem};
use crate::entities::vouchers::EntryVoucher;
use crate::error::{FormError, PageError};
use crate::inventory::form::{field, FieldKind, FieldSpec, FormProfile, ItemForm};
use crate::models::{Notice, SubmitOutcome};
use crate::repository::{Repositories, Repository};
use crate::vouchers::StatusCatalog;
use chrono::NaiveDate;
use tracing::{error, info};

const METADATA_FIELDS: &[FieldSpec] = &[
    field("numeroMarche", "N° marche", FieldKind::Text, true),
    field("date", "Date", FieldKind::Date, true),
    field("fournisseur", "Fournisseur", FieldKind::Select, true),
];

const CREATED: &str = "Bon d'entrée créé avec succès";
const FAILED: &str = "Erreur lors de la création du bon d'entrée";

/// Bon d'entrée form: voucher metadata on top of a full item form whose category
/// fields are all required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryVoucherForm {
    numero_marche: String,
    date: String,
    fournisseur: String,
    item: ItemForm,
    today: NaiveDate,
}

/// What a submit produced. `item` is set as soon as the inventory record exists, even
/// when writing the voucher itself failed afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct EntrySubmission {
    pub outcome: SubmitOutcome,
    pub item: Option<InventoryItem>,
}

impl EntryVoucherForm {
    pub fn new(category: Category, today: NaiveDate) -> Self {
        Self {
            numero_marche: String::new(),
            date: today.format("%Y-%m-%d").to_string(),
            fournisseur: String::new(),
            item: ItemForm::new(FormProfile::EntryVoucher, category),
            today,
        }
    }

    pub fn category(&self) -> Category {
        self.item.category()
    }

    pub fn item(&self) -> &ItemForm {
        &self.item
    }

    pub fn metadata_fields() -> &'static [FieldSpec] {
        METADATA_FIELDS
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        let mut fields = METADATA_FIELDS.to_vec();
        fields.extend(self.item.fields());
        fields
    }

    pub fn value(&self, name: &str) -> &str {
        match name {
            "numeroMarche" => self.numero_marche.as_str(),
            "date" => self.date.as_str(),
            "fournisseur" => self.fournisseur.as_str(),
            other => self.item.value(other),
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        match name {
            "numeroMarche" => self.numero_marche = value.into(),
            "date" => self.date = value.into(),
            "fournisseur" => self.fournisseur = value.into(),
            other => self.item.set(other, value)?,
        }
        Ok(())
    }

    /// Picking another category starts the voucher over.
    pub fn switch_category(&mut self, category: Category) -> bool {
        if category == self.category() {
            return false;
        }
        *self = Self::new(category, self.today);
        true
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing: Vec<_> = METADATA_FIELDS
            .iter()
            .filter(|spec| self.value(spec.name).trim().is_empty())
            .map(|spec| spec.name)
            .collect();
        missing.extend(self.item.missing_fields());
        missing
    }

    /// The inventory record and the voucher to write, the latter still without its
    /// `inventoryId`.
    pub fn build(&self, statut: &str) -> Result<(InventoryItem, EntryVoucher), FormError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").map_err(|_| {
            FormError::Invalid {
                field: "date",
                reason: "format attendu AAAA-MM-JJ",
            }
        })?;
        let item = self.item.to_item()?;
        if item.quantite == 0 {
            return Err(FormError::Invalid {
                field: "quantite",
                reason: "doit être au moins 1",
            });
        }
        let voucher = EntryVoucher {
            id: None,
            numero_marche: self.numero_marche.trim().to_string(),
            date,
            fournisseur: self.fournisseur.trim().to_string(),
            agent: String::new(),
            code: item.code.clone(),
            piece: item.piece.clone(),
            marque: item.marque.clone(),
            reference: item.reference.clone(),
            quantite: item.quantite,
            emplacement: item.emplacement.clone(),
            categorie: item.category(),
            inventory_id: None,
            statut: statut.to_string(),
        };
        Ok((item, voucher))
    }

    /// Writes the inventory record, then the voucher pointing at it. The two writes
    /// are independent: a failure on the second leaves the first in place.
    pub async fn submit(&self, repos: &Repositories, catalog: &StatusCatalog) -> EntrySubmission {
        let (mut item, mut voucher) = match self.build(catalog.entry_default()) {
            Ok(built) => built,
            Err(err) => {
                return EntrySubmission {
                    outcome: SubmitOutcome::rejected(err),
                    item: None,
                }
            }
        };

        let item_id = match repos.inventory.create(&item).await {
            Ok(id) => id,
            Err(err) => {
                error!(error = %err, "failed to create inventory record for entry voucher");
                return EntrySubmission {
                    outcome: SubmitOutcome::Failed {
                        notice: Notice::error(FAILED),
                    },
                    item: None,
                };
            }
        };
        item.id = Some(item_id.clone());
        voucher.inventory_id = Some(item_id.clone());

        let outcome = match repos.entries.create(&voucher).await {
            Ok(id) => {
                info!(%id, inventory_id = %item_id, "created entry voucher");
                SubmitOutcome::Saved {
                    id,
                    notice: Notice::success(CREATED),
                }
            }
            Err(err) => {
                error!(inventory_id = %item_id, error = %err, "failed to create entry voucher");
                SubmitOutcome::Failed {
                    notice: Notice::error(FAILED),
                }
            }
        };
        EntrySubmission {
            outcome,
            item: Some(item),
        }
    }
}

pub async fn load_entries(repo: &Repository<EntryVoucher>) -> Result<Vec<EntryVoucher>, PageError> {
    let entries = repo
        .list()
        .await
        .map_err(|err| PageError::new("Erreur lors du chargement des bons d'entrée.", err))?;
    info!(count = entries.len(), "fetched entry vouchers");
    Ok(entries)
}

pub fn filter_entries(entries: &[EntryVoucher], category: Option<Category>) -> Vec<&EntryVoucher> {
    entries
        .iter()
        .filter(|entry| category.map_or(true, |c| entry.categorie == c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::inventory::CategoryDetails;
    use crate::storage::memory::MemoryStore;
    use anyhow::Result;
    use std::sync::Arc;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()
    }

    fn filled_mechanical() -> EntryVoucherForm {
        let mut form = EntryVoucherForm::new(Category::Mechanical, today());
        for (name, value) in [
            ("numeroMarche", "M-2024-17"),
            ("fournisseur", "KSB Maroc"),
            ("code", "M-044"),
            ("piece", "Garniture mécanique"),
            ("reference", "GM-35"),
            ("marque", "KSB"),
            ("quantite", "4"),
            ("pompe", "Etanorm 65"),
            ("referencePompe", "ETN-65-200"),
            ("marquePompe", "KSB"),
            ("emplacement", "Magasin C-2"),
        ] {
            form.set(name, value).unwrap();
        }
        form
    }

    #[test]
    fn test_date_defaults_to_today() {
        let form = EntryVoucherForm::new(Category::Electrical, today());
        assert_eq!(form.value("date"), "2024-06-14");
    }

    #[test]
    fn test_category_fields_are_required() {
        let mut form = filled_mechanical();
        form.set("pompe", "").unwrap();
        assert_eq!(form.missing_fields(), ["pompe"]);
        assert!(form.fields().iter().any(|f| f.name == "fournisseur"));
    }

    #[test]
    fn test_switch_category_clears_and_reseeds_date() {
        let mut form = filled_mechanical();
        form.set("date", "2024-01-01").unwrap();
        assert!(form.switch_category(Category::Electrical));
        assert_eq!(form.value("numeroMarche"), "");
        assert_eq!(form.value("code"), "");
        assert_eq!(form.value("date"), "2024-06-14");
        assert!(!form.switch_category(Category::Electrical));
    }

    #[test]
    fn test_build_rejects_bad_date_and_zero_quantity() {
        let mut form = filled_mechanical();
        form.set("date", "14/06/2024").unwrap();
        assert!(matches!(
            form.build("Complété"),
            Err(FormError::Invalid { field: "date", .. })
        ));

        let mut form = filled_mechanical();
        form.set("quantite", "0").unwrap();
        assert!(matches!(
            form.build("Complété"),
            Err(FormError::Invalid { field: "quantite", .. })
        ));
    }

    #[tokio::test]
    async fn test_submit_creates_item_then_voucher() -> Result<()> {
        let repos = Repositories::new(Arc::new(MemoryStore::new()));
        let catalog = StatusCatalog::default();

        let submission = filled_mechanical().submit(&repos, &catalog).await;
        let voucher_id = submission.outcome.saved_id().unwrap().to_string();
        assert_eq!(submission.outcome.notice().message, CREATED);

        let item = submission.item.unwrap();
        let item_id = item.id.clone().unwrap();
        let stored = repos.inventory.get(&item_id).await?.unwrap();
        assert_eq!(stored.quantite, 4);
        assert_eq!(
            stored.details,
            CategoryDetails::Mechanical {
                pompe: "Etanorm 65".into(),
                reference_pompe: "ETN-65-200".into(),
                marque_pompe: "KSB".into(),
            }
        );

        let voucher = repos.entries.get(&voucher_id).await?.unwrap();
        assert_eq!(voucher.inventory_id.as_deref(), Some(item_id.as_str()));
        assert_eq!(voucher.statut, "Complété");
        assert_eq!(voucher.date, today());
        assert_eq!(voucher.categorie, Category::Mechanical);
        Ok(())
    }

    #[tokio::test]
    async fn test_submit_with_missing_fields_writes_nothing() -> Result<()> {
        let repos = Repositories::new(Arc::new(MemoryStore::new()));
        let form = EntryVoucherForm::new(Category::Electrical, today());

        let submission = form.submit(&repos, &StatusCatalog::default()).await;
        match submission.outcome {
            SubmitOutcome::Rejected { missing, notice } => {
                assert!(missing.contains(&"numeroMarche"));
                assert!(missing.contains(&"caracteristique"));
                assert!(notice.is_error());
            }
            other => panic!("expected rejection, got {other:?}"),
        }
        assert!(repos.inventory.list().await?.is_empty());
        assert!(load_entries(&repos.entries).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_filter_entries_by_category() -> Result<()> {
        let repos = Repositories::new(Arc::new(MemoryStore::new()));
        let catalog = StatusCatalog::default();
        filled_mechanical().submit(&repos, &catalog).await;

        let entries = load_entries(&repos.entries).await?;
        assert_eq!(filter_entries(&entries, None).len(), 1);
        assert_eq!(filter_entries(&entries, Some(Category::Mechanical)).len(), 1);
        assert!(filter_entries(&entries, Some(Category::Electrical)).is_empty());
        Ok(())
    }
}
