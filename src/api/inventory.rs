use super::{category_param, field_text, ApiError, AppState, FieldMap};
use crate::entities::inventory::{Category, InventoryItem};
use crate::error::{FormError, StoreError};
use crate::inventory::{Confirmed, DeleteOutcome, FormProfile, ItemFilter, ItemForm, Page, QrPayload};
use crate::models::{Notice, SubmitOutcome};
use crate::search::SearchIndex;
use crate::storage::Collection;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::Deserialize;

/// Keys a client may echo back from a fetched item that are not form fields.
const PASSTHROUGH_KEYS: [&str; 5] = ["id", "categorie", "stockInitial", "stockActuel", "seuilAlerte"];

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub low_stock: bool,
    pub page: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Copies the body into the form. Fields of the other category are dropped; names
/// that belong to neither category are rejected.
fn fill(form: &mut ItemForm, body: &FieldMap) -> Result<(), FormError> {
    for (key, value) in body {
        if PASSTHROUGH_KEYS.contains(&key.as_str()) || form.is_inactive_field(key) {
            continue;
        }
        form.set(key, field_text(value))?;
    }
    Ok(())
}

fn saved(status: StatusCode, outcome: SubmitOutcome) -> Result<Response, ApiError> {
    match ApiError::from_outcome(&outcome) {
        Some(err) => Err(err),
        None => Ok((status, Json(outcome)).into_response()),
    }
}

pub async fn list_items<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Page<InventoryItem>>, ApiError> {
    let mut list = state.load_inventory().await?;
    list.set_filter(ItemFilter {
        category: category_param(query.category.as_deref())?,
        low_stock: query.low_stock,
    });
    if let Some(page) = query.page {
        list.go_to(page);
    }
    Ok(Json(list.current_page()))
}

pub async fn get_item<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    Ok(match state.item(&id).await? {
        Some(item) => Json(item).into_response(),
        None => Redirect::to("/api/inventory").into_response(),
    })
}

pub async fn create_item<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Json(body): Json<FieldMap>,
) -> Result<Response, ApiError> {
    let category = category_param(body.get("categorie").and_then(|v| v.as_str()))?
        .unwrap_or(Category::Electrical);
    let mut form = ItemForm::new(FormProfile::Inventory, category);
    fill(&mut form, &body)?;
    saved(StatusCode::CREATED, state.submit_item(&form).await)
}

pub async fn update_item<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Path(id): Path<String>,
    Json(body): Json<FieldMap>,
) -> Result<Response, ApiError> {
    let existing = state
        .item(&id)
        .await?
        .ok_or_else(|| StoreError::not_found(Collection::Inventory, &id))?;
    let category = category_param(body.get("categorie").and_then(|v| v.as_str()))?
        .unwrap_or_else(|| existing.category());
    let mut form = ItemForm::replacing(&existing, category);
    fill(&mut form, &body)?;
    saved(StatusCode::OK, state.submit_item(&form).await)
}

pub async fn delete_item<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<Json<Notice>, ApiError> {
    let mut list = state.load_inventory().await?;
    if !list.contains(&id) {
        return Err(StoreError::not_found(Collection::Inventory, id).into());
    }
    match state
        .delete_item(&mut list, &id, &Confirmed(query.confirm))
        .await
    {
        DeleteOutcome::Deleted(notice) => Ok(Json(notice)),
        DeleteOutcome::Cancelled => Err(ApiError::ConfirmationRequired(list.delete_prompt(&id))),
        DeleteOutcome::Failed(notice) => Err(ApiError::WriteFailed(notice.message)),
    }
}

pub async fn export_items<I: SearchIndex>(
    State(state): State<AppState<I>>,
) -> Result<Response, ApiError> {
    let export = state.export(chrono::Local::now().date_naive()).await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.content,
    )
        .into_response())
}

/// The exact string to encode in the item's QR label.
pub async fn item_qr<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let item = state
        .item(&id)
        .await?
        .ok_or_else(|| StoreError::not_found(Collection::Inventory, &id))?;
    let payload = QrPayload::for_item(&item)
        .to_json()
        .map_err(|source| StoreError::Encode {
            collection: Collection::Inventory,
            source,
        })?;
    Ok(([(header::CONTENT_TYPE, "application/json")], payload).into_response())
}

pub async fn search_items<I: SearchIndex>(
    State(state): State<AppState<I>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<InventoryItem>>, ApiError> {
    let items = state.search(&query.q).await.map_err(ApiError::Search)?;
    Ok(Json(items))
}
