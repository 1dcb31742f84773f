use crate::error::{FormError, PageError, StoreError};
use crate::models::SubmitOutcome;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Page(#[from] PageError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Form(#[from] FormError),

    #[error("{message}")]
    Rejected {
        message: String,
        missing: Vec<&'static str>,
    },

    #[error("{0}")]
    WriteFailed(String),

    #[error("{0}")]
    ConfirmationRequired(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("recherche indisponible: {0}")]
    Search(anyhow::Error),
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<&'static str>,
}

impl ApiError {
    /// Maps a non-`Saved` submit result onto an error; `Saved` yields `None`.
    pub fn from_outcome(outcome: &SubmitOutcome) -> Option<Self> {
        match outcome {
            SubmitOutcome::Saved { .. } => None,
            SubmitOutcome::Rejected { missing, notice } => Some(ApiError::Rejected {
                message: notice.message.clone(),
                missing: missing.clone(),
            }),
            SubmitOutcome::Failed { notice } => Some(ApiError::WriteFailed(notice.message.clone())),
        }
    }

    fn parts(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Page(_) => (StatusCode::INTERNAL_SERVER_ERROR, "load_failed"),
            ApiError::Store(err) if err.is_not_found() => (StatusCode::NOT_FOUND, "not_found"),
            ApiError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
            ApiError::Form(_) | ApiError::Rejected { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "invalid_form")
            }
            ApiError::WriteFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "write_failed"),
            ApiError::ConfirmationRequired(_) => (StatusCode::CONFLICT, "confirmation_required"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ApiError::Search(_) => (StatusCode::INTERNAL_SERVER_ERROR, "search_failed"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.parts();
        if status.is_server_error() {
            error!(error = ?self, "request failed");
        }
        let missing = match &self {
            ApiError::Rejected { missing, .. } => missing.clone(),
            ApiError::Form(FormError::MissingFields(missing)) => missing.clone(),
            _ => Vec::new(),
        };
        let body = ErrorResponse {
            error: code,
            message: self.to_string(),
            missing,
        };
        (status, Json(body)).into_response()
    }
}
