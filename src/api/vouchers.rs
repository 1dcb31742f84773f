use super::{category_param, field_text, ApiError, AppState, FieldMap};
use crate::entities::inventory::Category;
use crate::entities::vouchers::{EntryVoucher, ExitVoucher};
use crate::search::SearchIndex;
use crate::vouchers::{EntryVoucherForm, ExitFilter, ExitVoucherForm, StatusCatalog};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct EntryQuery {
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub statut: String,
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

pub async fn list_entries<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<Vec<EntryVoucher>>, ApiError> {
    let category = category_param(query.category.as_deref())?;
    Ok(Json(state.entries(category).await?))
}

pub async fn create_entry<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Json(body): Json<FieldMap>,
) -> Result<Response, ApiError> {
    let category = category_param(body.get("categorie").and_then(|v| v.as_str()))?
        .unwrap_or(Category::Electrical);
    let mut form = EntryVoucherForm::new(category, today());
    for (key, value) in body.iter().filter(|(key, _)| key.as_str() != "categorie") {
        if form.item().is_inactive_field(key) {
            continue;
        }
        form.set(key, field_text(value))?;
    }
    let outcome = state.submit_entry(&form).await;
    match ApiError::from_outcome(&outcome) {
        Some(err) => Err(err),
        None => Ok((StatusCode::CREATED, Json(outcome)).into_response()),
    }
}

pub async fn list_exits<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Query(filter): Query<ExitFilter>,
) -> Result<Json<Vec<ExitVoucher>>, ApiError> {
    Ok(Json(state.exits(&filter).await?))
}

pub async fn create_exit<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Json(body): Json<FieldMap>,
) -> Result<Response, ApiError> {
    let mut form = ExitVoucherForm::new(today());
    for (key, value) in &body {
        form.set(key, field_text(value))?;
    }
    let outcome = state.submit_exit(&form).await;
    match ApiError::from_outcome(&outcome) {
        Some(err) => Err(err),
        None => Ok((StatusCode::CREATED, Json(outcome)).into_response()),
    }
}

pub async fn set_exit_status<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<ExitVoucher>, ApiError> {
    if update.statut.trim().is_empty() {
        return Err(ApiError::BadRequest("statut vide".to_string()));
    }
    Ok(Json(state.set_exit_status(&id, &update.statut).await?))
}

pub async fn statuses<I: SearchIndex>(State(state): State<AppState<I>>) -> Json<StatusCatalog> {
    Json(state.statuses().clone())
}
