//! Category-dependent item form.
//!
//! The form holds raw strings exactly as typed. Only `to_item` turns them into an
//! [`InventoryItem`], keeping the common fields plus those of the selected category.

use crate::entities::inventory::{Category, CategoryDetails, InventoryItem};
use crate::error::FormError;
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Number,
    TextArea,
    Select,
    Date,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

pub(crate) const fn field(
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required,
    }
}

const ELECTRICAL_FIELDS: &[FieldSpec] = &[
    field("code", "Code", FieldKind::Text, true),
    field("piece", "Piece", FieldKind::Select, true),
    field("marque", "Marque", FieldKind::Text, true),
    field("reference", "Reference", FieldKind::Text, true),
    field("caracteristique", "Caracteristique", FieldKind::TextArea, true),
    field("quantite", "Quantité", FieldKind::Number, true),
    field("emplacement", "Emplacement", FieldKind::Text, true),
    field("observation", "Observation", FieldKind::TextArea, false),
];

const MECHANICAL_FIELDS: &[FieldSpec] = &[
    field("code", "Code", FieldKind::Text, true),
    field("piece", "Piece", FieldKind::Select, true),
    field("reference", "Reference", FieldKind::Text, true),
    field("marque", "Marque", FieldKind::Text, true),
    field("quantite", "Quantité", FieldKind::Number, true),
    field("pompe", "Pompe", FieldKind::Text, true),
    field("referencePompe", "Reference Pompe", FieldKind::Text, true),
    field("marquePompe", "Marque Pompe", FieldKind::Text, true),
    field("emplacement", "Emplacement", FieldKind::Text, true),
    field("observation", "Observation", FieldKind::TextArea, false),
];

const COMMON_FIELDS: &[&str] = &[
    "code",
    "piece",
    "marque",
    "reference",
    "quantite",
    "emplacement",
    "observation",
];

/// Which screen the form belongs to. Entry vouchers insist on the category fields,
/// the plain inventory editor does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormProfile {
    Inventory,
    EntryVoucher,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit { id: String },
}

pub fn field_specs(profile: FormProfile, category: Category) -> Vec<FieldSpec> {
    let base = match category {
        Category::Electrical => ELECTRICAL_FIELDS,
        Category::Mechanical => MECHANICAL_FIELDS,
    };
    base.iter()
        .map(|spec| match profile {
            FormProfile::Inventory if !COMMON_FIELDS.contains(&spec.name) => FieldSpec {
                required: false,
                ..*spec
            },
            _ => *spec,
        })
        .collect()
}

/// Numeric coercion for `quantite`: anything unparsable, negative or non-finite is 0,
/// fractions are truncated.
pub fn coerce_quantity(raw: &str) -> u32 {
    let raw = raw.trim();
    if let Ok(n) = raw.parse::<u32>() {
        return n;
    }
    match raw.parse::<f64>() {
        Ok(n) if n.is_finite() && n > 0.0 => n.min(u32::MAX as f64) as u32,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StockFields {
    initial: Option<u32>,
    current: Option<u32>,
    threshold: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    mode: FormMode,
    profile: FormProfile,
    category: Category,
    values: HashMap<&'static str, String>,
    stock: StockFields,
}

impl ItemForm {
    pub fn new(profile: FormProfile, category: Category) -> Self {
        Self {
            mode: FormMode::Create,
            profile,
            category,
            values: HashMap::new(),
            stock: StockFields::default(),
        }
    }

    /// Pre-filled edit form for a stored item. An item without id opens in create mode.
    pub fn edit(item: &InventoryItem) -> Self {
        let mode = match &item.id {
            Some(id) => FormMode::Edit { id: id.clone() },
            None => FormMode::Create,
        };
        let mut values = HashMap::new();
        values.insert("code", item.code.clone());
        values.insert("piece", item.piece.clone());
        values.insert("marque", item.marque.clone());
        values.insert("reference", item.reference.clone());
        values.insert("quantite", item.quantite.to_string());
        values.insert("emplacement", item.emplacement.clone());
        if let Some(observation) = &item.observation {
            values.insert("observation", observation.clone());
        }
        match &item.details {
            CategoryDetails::Electrical { caracteristique } => {
                values.insert("caracteristique", caracteristique.clone());
            }
            CategoryDetails::Mechanical {
                pompe,
                reference_pompe,
                marque_pompe,
            } => {
                values.insert("pompe", pompe.clone());
                values.insert("referencePompe", reference_pompe.clone());
                values.insert("marquePompe", marque_pompe.clone());
            }
        }
        Self {
            mode,
            profile: FormProfile::Inventory,
            category: item.category(),
            values,
            stock: StockFields {
                initial: item.stock_initial,
                current: item.stock_actuel,
                threshold: item.seuil_alerte,
            },
        }
    }

    /// Blank edit form for `existing` in `category`. The values submitted into it form
    /// the whole new record; only the id and stock tracking numbers carry over.
    pub fn replacing(existing: &InventoryItem, category: Category) -> Self {
        let mut form = Self::edit(existing);
        form.category = category;
        form.values.clear();
        form
    }

    pub fn mode(&self) -> &FormMode {
        &self.mode
    }

    pub fn profile(&self) -> FormProfile {
        self.profile
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        field_specs(self.profile, self.category)
    }

    pub fn value(&self, name: &str) -> &str {
        self.values.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), FormError> {
        let spec = self
            .fields()
            .into_iter()
            .find(|spec| spec.name == name)
            .ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        self.values.insert(spec.name, value.into());
        Ok(())
    }

    /// A field of the other category: known to the editor, but not part of this form.
    pub fn is_inactive_field(&self, name: &str) -> bool {
        let known = |specs: &[FieldSpec]| specs.iter().any(|spec| spec.name == name);
        !known(&self.fields()) && (known(ELECTRICAL_FIELDS) || known(MECHANICAL_FIELDS))
    }

    /// Selects another category and clears every entered value, in either mode. The
    /// edited id and stock tracking numbers are not form values and survive.
    /// Returns whether the category actually changed.
    pub fn switch_category(&mut self, category: Category) -> bool {
        if category == self.category {
            return false;
        }
        self.category = category;
        self.values.clear();
        true
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        self.fields()
            .into_iter()
            .filter(|spec| spec.required && self.value(spec.name).trim().is_empty())
            .map(|spec| spec.name)
            .collect()
    }

    fn text(&self, name: &str) -> String {
        self.value(name).to_string()
    }

    /// Builds the record to persist: common fields plus the active category's fields.
    pub fn to_item(&self) -> Result<InventoryItem, FormError> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(FormError::MissingFields(missing));
        }
        let details = match self.category {
            Category::Electrical => CategoryDetails::Electrical {
                caracteristique: self.text("caracteristique"),
            },
            Category::Mechanical => CategoryDetails::Mechanical {
                pompe: self.text("pompe"),
                reference_pompe: self.text("referencePompe"),
                marque_pompe: self.text("marquePompe"),
            },
        };
        let observation = Some(self.text("observation")).filter(|o| !o.trim().is_empty());
        Ok(InventoryItem {
            id: match &self.mode {
                FormMode::Edit { id } => Some(id.clone()),
                FormMode::Create => None,
            },
            code: self.text("code"),
            piece: self.text("piece"),
            marque: self.text("marque"),
            reference: self.text("reference"),
            quantite: coerce_quantity(self.value("quantite")),
            emplacement: self.text("emplacement"),
            observation,
            stock_initial: self.stock.initial,
            stock_actuel: self.stock.current,
            seuil_alerte: self.stock.threshold,
            details,
        })
    }
}
