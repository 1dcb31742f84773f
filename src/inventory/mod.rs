pub mod export;
pub mod form;
pub mod listing;
pub mod qr;

pub use export::{export_csv, CsvExport};
pub use form::{FieldKind, FieldSpec, FormMode, FormProfile, ItemForm};
pub use listing::{Confirm, Confirmed, DeleteOutcome, InventoryList, ItemFilter, Page, Pager};
pub use qr::QrPayload;
