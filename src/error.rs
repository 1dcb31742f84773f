use crate::storage::Collection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("malformed document {collection}/{id}: {source}")]
    Malformed {
        collection: Collection,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record for {collection}: {source}")]
    Encode {
        collection: Collection,
        #[source]
        source: serde_json::Error,
    },

    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
}

impl StoreError {
    pub fn not_found(collection: Collection, id: impl Into<String>) -> Self {
        Self::NotFound {
            collection,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Rejections raised while editing a form, before anything reaches the store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("champs obligatoires manquants: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("champ inconnu pour ce formulaire: {0}")]
    UnknownField(String),

    #[error("valeur invalide pour {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
}

/// A fetch failure surfaced as a single page-level message.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct PageError {
    pub message: &'static str,
    #[source]
    pub source: StoreError,
}

impl PageError {
    pub fn new(message: &'static str, source: StoreError) -> Self {
        Self { message, source }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
