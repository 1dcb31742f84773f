use crate::entities::inventory::{Category, InventoryItem};
use serde::Serialize;

/// What a label's QR code carries. Rendering the image is left to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QrPayload<'a> {
    pub id: &'a str,
    pub reference: &'a str,
    pub piece: &'a str,
    pub categorie: Category,
    pub emplacement: &'a str,
}

impl<'a> QrPayload<'a> {
    pub fn for_item(item: &'a InventoryItem) -> Self {
        Self {
            id: item.id.as_deref().unwrap_or_default(),
            reference: &item.reference,
            piece: &item.piece,
            categorie: item.category(),
            emplacement: &item.emplacement,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
