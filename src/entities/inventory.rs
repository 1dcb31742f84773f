use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Electrical,
    Mechanical,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Electrical => "electrical",
            Category::Mechanical => "mechanical",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::Electrical => "Électrique",
            Category::Mechanical => "Mécanique",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "electrical" => Ok(Category::Electrical),
            "mechanical" => Ok(Category::Mechanical),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The category-specific part of an item. `categorie` is the tag, so a stored item
/// carries the fields of exactly one variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "categorie", rename_all = "lowercase")]
pub enum CategoryDetails {
    Electrical {
        #[serde(default)]
        caracteristique: String,
    },
    Mechanical {
        #[serde(default)]
        pompe: String,
        #[serde(default, rename = "referencePompe")]
        reference_pompe: String,
        #[serde(default, rename = "marquePompe")]
        marque_pompe: String,
    },
}

impl CategoryDetails {
    pub fn empty(category: Category) -> Self {
        match category {
            Category::Electrical => CategoryDetails::Electrical {
                caracteristique: String::new(),
            },
            Category::Mechanical => CategoryDetails::Mechanical {
                pompe: String::new(),
                reference_pompe: String::new(),
                marque_pompe: String::new(),
            },
        }
    }

    pub fn category(&self) -> Category {
        match self {
            CategoryDetails::Electrical { .. } => Category::Electrical,
            CategoryDetails::Mechanical { .. } => Category::Mechanical,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub code: String,
    pub piece: String,
    pub marque: String,
    pub reference: String,
    #[serde(default)]
    pub quantite: u32,
    pub emplacement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_initial: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock_actuel: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seuil_alerte: Option<u32>,
    #[serde(flatten)]
    pub details: CategoryDetails,
}

impl InventoryItem {
    pub fn category(&self) -> Category {
        self.details.category()
    }

    /// At or below the alert threshold. Items without both numbers never qualify.
    pub fn is_low_stock(&self) -> bool {
        matches!(
            (self.stock_actuel, self.seuil_alerte),
            (Some(current), Some(threshold)) if current <= threshold
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn mechanical() -> InventoryItem {
        InventoryItem {
            id: Some("abc".into()),
            code: "M-001".into(),
            piece: "Roulement".into(),
            marque: "SKF".into(),
            reference: "6205".into(),
            quantite: 4,
            emplacement: "Rayon B-03".into(),
            observation: None,
            stock_initial: None,
            stock_actuel: None,
            seuil_alerte: None,
            details: CategoryDetails::Mechanical {
                pompe: "Pompe 1".into(),
                reference_pompe: "KSB-50".into(),
                marque_pompe: "KSB".into(),
            },
        }
    }

    #[test]
    fn test_serializes_flat_with_only_active_fields() {
        let value = serde_json::to_value(mechanical()).unwrap();
        assert_eq!(
            value,
            json!({
                "id": "abc",
                "code": "M-001",
                "piece": "Roulement",
                "marque": "SKF",
                "reference": "6205",
                "quantite": 4,
                "emplacement": "Rayon B-03",
                "categorie": "mechanical",
                "pompe": "Pompe 1",
                "referencePompe": "KSB-50",
                "marquePompe": "KSB",
            })
        );
    }

    #[test]
    fn test_deserialize_ignores_inactive_fields() {
        let item: InventoryItem = serde_json::from_value(json!({
            "code": "E-1",
            "piece": "Disjoncteur",
            "marque": "Schneider",
            "reference": "C20",
            "quantite": 9,
            "emplacement": "A-1",
            "categorie": "electrical",
            "caracteristique": "20A",
            "pompe": "stale",
        }))
        .unwrap();
        assert_eq!(
            item.details,
            CategoryDetails::Electrical {
                caracteristique: "20A".into()
            }
        );
        let back = serde_json::to_value(&item).unwrap();
        assert!(back.get("pompe").is_none());
    }

    #[test]
    fn test_low_stock_boundary_is_inclusive() {
        let mut item = mechanical();
        assert!(!item.is_low_stock());
        item.stock_actuel = Some(5);
        item.seuil_alerte = Some(5);
        assert!(item.is_low_stock());
        item.stock_actuel = Some(6);
        assert!(!item.is_low_stock());
        item.seuil_alerte = None;
        item.stock_actuel = Some(0);
        assert!(!item.is_low_stock());
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!("Mechanical".parse::<Category>(), Ok(Category::Mechanical));
        assert_eq!(" ELECTRICAL ".parse::<Category>(), Ok(Category::Electrical));
        assert!("plumbing".parse::<Category>().is_err());
        assert_eq!(
            serde_json::to_value(Category::Electrical).unwrap(),
            Value::String("electrical".into())
        );
    }
}
