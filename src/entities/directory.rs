//! Reference collections the dashboard reads but barely edits.

use crate::entities::vouchers::initials;
use serde::{Deserialize, Serialize};

/// Catalogue entry with stock tracking, as read by the reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub piece: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub categorie: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_initial: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_actuel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seuil_alerte: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prix_unitaire: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nom: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categorie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub nom: String,
    #[serde(default)]
    pub departement: String,
}

/// Profile of a signed-in user. Authentication itself happens elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub email: String,
}

impl User {
    pub fn initials(&self) -> String {
        if self.display_name.trim().is_empty() {
            return self
                .email
                .chars()
                .next()
                .map(|c| c.to_uppercase().collect())
                .unwrap_or_else(|| "U".to_string());
        }
        initials(&self.display_name).to_uppercase()
    }
}
