use crate::entities::vouchers::ExitVoucher;
use crate::error::{FormError, PageError, StoreError, StoreResult};
use crate::inventory::form::{coerce_quantity, field, FieldKind, FieldSpec};
use crate::models::{Notice, SubmitOutcome};
use crate::repository::Repository;
use crate::storage::Collection;
use crate::vouchers::StatusCatalog;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{error, info};

const FIELDS: &[FieldSpec] = &[
    field("date", "Date", FieldKind::Date, true),
    field("agent", "Agent", FieldKind::Select, true),
    field("departement", "Département", FieldKind::Text, false),
    field("piece", "Produit", FieldKind::Select, true),
    field("reference", "Référence", FieldKind::Text, false),
    field("quantite", "Quantité", FieldKind::Number, true),
    field("motif", "Motif", FieldKind::TextArea, false),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitVoucherForm {
    date: String,
    agent: String,
    departement: String,
    piece: String,
    reference: String,
    quantite: String,
    motif: String,
}

impl ExitVoucherForm {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            agent: String::new(),
            departement: String::new(),
            piece: String::new(),
            reference: String::new(),
            quantite: "1".to_string(),
            motif: String::new(),
        }
    }

    pub fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn slot(&mut self, name: &str) -> Option<&mut String> {
        Some(match name {
            "date" => &mut self.date,
            "agent" => &mut self.agent,
            "departement" => &mut self.departement,
            "piece" => &mut self.piece,
            "reference" => &mut self.reference,
            "quantite" => &mut self.quantite,
            "motif" => &mut self.motif,
            _ => return None,
        })
    }

    pub fn value(&self, name: &str) -> &str {
        match name {
            "date" => self.date.as_str(),
            "agent" => self.agent.as_str(),
            "departement" => self.departement.as_str(),
            "piece" => self.piece.as_str(),
            "reference" => self.reference.as_str(),
            "quantite" => self.quantite.as_str(),
            "motif" => self.motif.as_str(),
            _ => "",
        }
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let slot = self
            .slot(name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        *slot = value.into();
        Ok(())
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        FIELDS
            .iter()
            .filter(|spec| spec.required && self.value(spec.name).trim().is_empty())
            .map(|spec| spec.name)
            .collect()
    }

    pub fn build(&self, statut: &str) -> Result<ExitVoucher, FormError> {
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
        let quantite = coerce_quantity(&self.quantite);
        if quantite == 0 {
            return Err(FormError::Invalid {
                field: "quantite",
                reason: "doit être au moins 1",
            });
        }
        Ok(ExitVoucher {
            id: None,
            date,
            agent: self.agent.trim().to_string(),
            departement: self.departement.trim().to_string(),
            piece: self.piece.trim().to_string(),
            reference: self.reference.trim().to_string(),
            quantite,
            motif: self.motif.trim().to_string(),
            statut: statut.to_string(),
        })
    }

    pub async fn submit(
        &self,
        repo: &Repository<ExitVoucher>,
        catalog: &StatusCatalog,
    ) -> SubmitOutcome {
        let voucher = match self.build(catalog.exit_default()) {
            Ok(voucher) => voucher,
            Err(err) => return SubmitOutcome::rejected(err),
        };
        match repo.create(&voucher).await {
            Ok(id) => {
                info!(%id, agent = %voucher.agent, "created exit voucher");
                SubmitOutcome::Saved {
                    id,
                    notice: Notice::success("Bon de sortie créé avec succès"),
                }
            }
            Err(err) => {
                error!(error = %err, "failed to create exit voucher");
                SubmitOutcome::Failed {
                    notice: Notice::error("Erreur lors de la création du bon de sortie"),
                }
            }
        }
    }
}

/// Exit voucher table filter. `status` of `None`, empty or `all` shows everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExitFilter {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub status: Option<String>,
}

impl ExitFilter {
    pub fn matches(&self, voucher: &ExitVoucher, catalog: &StatusCatalog) -> bool {
        let needle = self.search.trim().to_lowercase();
        let hit = needle.is_empty()
            || voucher.reference.to_lowercase().contains(&needle)
            || voucher.agent.to_lowercase().contains(&needle);
        let status_ok = match self.status.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(all) if all.eq_ignore_ascii_case("all") => true,
            Some(wanted) => catalog.matches(&voucher.statut, wanted),
        };
        hit && status_ok
    }

    pub fn apply<'a>(
        &self,
        vouchers: &'a [ExitVoucher],
        catalog: &StatusCatalog,
    ) -> Vec<&'a ExitVoucher> {
        vouchers
            .iter()
            .filter(|voucher| self.matches(voucher, catalog))
            .collect()
    }
}

pub async fn load_exits(repo: &Repository<ExitVoucher>) -> Result<Vec<ExitVoucher>, PageError> {
    let exits = repo
        .list()
        .await
        .map_err(|err| PageError::new("Erreur lors du chargement des bons de sortie.", err))?;
    info!(count = exits.len(), "fetched exit vouchers");
    Ok(exits)
}

/// Stores `statut` exactly as given. No transition rules apply.
pub async fn set_status(
    repo: &Repository<ExitVoucher>,
    id: &str,
    statut: &str,
) -> StoreResult<ExitVoucher> {
    let mut voucher = repo
        .get(id)
        .await?
        .ok_or_else(|| StoreError::not_found(Collection::Sorties, id))?;
    voucher.statut = statut.to_string();
    repo.replace(id, &voucher).await?;
    info!(%id, %statut, "updated exit voucher status");
    Ok(voucher)
}
