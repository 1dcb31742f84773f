use crate::entities::inventory::Category;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Bon d'entrée: a receipt from a supplier. The inventory record it created is
/// referenced by id only; nothing keeps the two in step afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryVoucher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub numero_marche: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub fournisseur: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub agent: String,
    #[serde(default)]
    pub code: String,
    pub piece: String,
    #[serde(default)]
    pub marque: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub quantite: u32,
    #[serde(default)]
    pub emplacement: String,
    pub categorie: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inventory_id: Option<String>,
    pub statut: String,
}

/// Bon de sortie: stock issued to an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitVoucher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub agent: String,
    #[serde(default)]
    pub departement: String,
    pub piece: String,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub quantite: u32,
    #[serde(default)]
    pub motif: String,
    pub statut: String,
}

/// Initials shown in place of an avatar: first letter of each word.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exit_voucher_wire_names() {
        let voucher: ExitVoucher = serde_json::from_value(json!({
            "date": "2024-05-02",
            "agent": "Karim Benali",
            "piece": "Gants isolants",
            "quantite": 2,
            "statut": "En attente",
        }))
        .unwrap();
        assert_eq!(voucher.date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(voucher.departement, "");
        let value = serde_json::to_value(&voucher).unwrap();
        assert_eq!(value["date"], "2024-05-02");
        assert!(value.get("id").is_none());
    }

    #[test]
    fn test_initials() {
        assert_eq!(initials("Karim Benali"), "KB");
        assert_eq!(initials("  fatima "), "f");
        assert_eq!(initials(""), "");
    }
}
