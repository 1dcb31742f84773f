//! CSV export of the loaded inventory.
//!
//! Quoting is minimal: a text cell containing a comma is wrapped in double
//! quotes and nothing else is escaped. Cells with embedded quotes or line breaks will
//! produce a file that strict CSV readers split differently.

use crate::entities::inventory::InventoryItem;
use chrono::NaiveDate;

pub const HEADERS: [&str; 8] = [
    "Référence",
    "Nom du Produit",
    "Catégorie",
    "Stock Initial",
    "Stock Actuel",
    "Seuil Minimal",
    "Emplacement",
    "Statut",
];

const BOM: char = '\u{feff}';

enum Cell<'a> {
    Text(&'a str),
    Number(u32),
}

impl Cell<'_> {
    fn render(&self) -> String {
        match self {
            Cell::Text(text) if text.contains(',') => format!("\"{text}\""),
            Cell::Text(text) => (*text).to_string(),
            Cell::Number(n) => n.to_string(),
        }
    }
}

/// "Stock bas" only when both numbers are present and non-zero.
fn stock_status(item: &InventoryItem) -> &'static str {
    match (item.stock_actuel, item.seuil_alerte) {
        (Some(current), Some(threshold)) if current > 0 && threshold > 0 && current <= threshold => {
            "Stock bas"
        }
        _ => "Normal",
    }
}

fn row(item: &InventoryItem) -> String {
    let cells = [
        Cell::Text(&item.reference),
        Cell::Text(&item.piece),
        Cell::Text(item.category().as_str()),
        Cell::Number(item.stock_initial.unwrap_or(0)),
        Cell::Number(item.stock_actuel.unwrap_or(0)),
        Cell::Number(item.seuil_alerte.unwrap_or(0)),
        Cell::Text(&item.emplacement),
        Cell::Text(stock_status(item)),
    ];
    cells
        .iter()
        .map(Cell::render)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub filename: String,
    pub content: String,
}

impl CsvExport {
    pub fn bytes(&self) -> &[u8] {
        self.content.as_bytes()
    }
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("inventaire_{}.csv", date.format("%d-%m-%Y"))
}

pub fn export_csv(items: &[InventoryItem], date: NaiveDate) -> CsvExport {
    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(HEADERS.join(","));
    lines.extend(items.iter().map(row));
    CsvExport {
        filename: export_filename(date),
        content: format!("{BOM}{}", lines.join("\n")),
    }
}
