pub mod directory;
pub mod documents;
pub mod inventory;
pub mod vouchers;
