use crate::entities::inventory::InventoryItem;
use crate::error::FormError;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum InventoryEvent {
    Created(InventoryItem),
    Updated(InventoryItem),
    Deleted(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A user-facing toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: &'static str,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            title: "Succès",
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            title: "Erreur",
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Result of submitting a form. On anything but `Saved` the caller keeps its form
/// state so the user can resubmit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SubmitOutcome {
    Saved { id: String, notice: Notice },
    Rejected { missing: Vec<&'static str>, notice: Notice },
    Failed { notice: Notice },
}

impl SubmitOutcome {
    /// A form that never reached the store. Invalid values are reported alongside the
    /// missing ones so the caller can highlight them.
    pub fn rejected(err: FormError) -> Self {
        let missing = match &err {
            FormError::MissingFields(missing) => missing.clone(),
            FormError::Invalid { field, .. } => vec![*field],
            FormError::UnknownField(_) => Vec::new(),
        };
        SubmitOutcome::Rejected {
            missing,
            notice: Notice::error(err.to_string()),
        }
    }

    pub fn notice(&self) -> &Notice {
        match self {
            SubmitOutcome::Saved { notice, .. }
            | SubmitOutcome::Rejected { notice, .. }
            | SubmitOutcome::Failed { notice } => notice,
        }
    }

    pub fn saved_id(&self) -> Option<&str> {
        match self {
            SubmitOutcome::Saved { id, .. } => Some(id),
            _ => None,
        }
    }
}
