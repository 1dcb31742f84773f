//! JSON-over-HTTP surface and the event WebSocket.

mod error;
pub mod inventory;
pub mod reports;
pub mod vouchers;

pub use error::ApiError;

use crate::entities::inventory::Category;
use crate::notifications::NotificationHub;
use crate::search::SearchIndex;
use crate::InventoryService;
use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::Response,
    routing::{get, put},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub type AppState<I> = Arc<InventoryService<I>>;

/// Request bodies for form submissions: field name to typed-in value.
pub type FieldMap = serde_json::Map<String, Value>;

/// Form values arrive as JSON but forms hold raw text.
pub(crate) fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Empty and `all` mean no category filter.
pub(crate) fn category_param(raw: Option<&str>) -> Result<Option<Category>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(all) if all.eq_ignore_ascii_case("all") => Ok(None),
        Some(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("catégorie inconnue: {raw}"))),
    }
}

async fn ws_handler<I: SearchIndex>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<I>>,
) -> Response {
    let sender = state.sender();
    ws.on_upgrade(move |socket| NotificationHub::handle_socket(socket, sender))
}

pub fn router<I: SearchIndex>(state: AppState<I>) -> Router {
    Router::new()
        .route(
            "/api/inventory",
            get(inventory::list_items::<I>).post(inventory::create_item::<I>),
        )
        .route("/api/inventory/export", get(inventory::export_items::<I>))
        .route(
            "/api/inventory/:id",
            get(inventory::get_item::<I>)
                .put(inventory::update_item::<I>)
                .delete(inventory::delete_item::<I>),
        )
        .route("/api/inventory/:id/qr", get(inventory::item_qr::<I>))
        .route("/api/search", get(inventory::search_items::<I>))
        .route(
            "/api/entrees",
            get(vouchers::list_entries::<I>).post(vouchers::create_entry::<I>),
        )
        .route(
            "/api/sorties",
            get(vouchers::list_exits::<I>).post(vouchers::create_exit::<I>),
        )
        .route("/api/sorties/:id/statut", put(vouchers::set_exit_status::<I>))
        .route("/api/statuts", get(vouchers::statuses::<I>))
        .route("/api/reports/stock", get(reports::stock::<I>))
        .route("/api/reports/inventory", get(reports::inventory::<I>))
        .route("/api/reports/movements", get(reports::movements::<I>))
        .route("/api/reports/agents", get(reports::agents::<I>))
        .route("/api/reports/recent", get(reports::recent::<I>))
        .route("/ws", get(ws_handler::<I>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}
