use super::{ApiError, AppState};
use crate::reports::{Activity, AgentActivity, InventoryReport, MovementReport, StockStats};
use crate::search::SearchIndex;
use axum::{extract::State, Json};

pub async fn stock<I: SearchIndex>(
    State(state): State<AppState<I>>,
) -> Result<Json<StockStats>, ApiError> {
    Ok(Json(state.stock_stats().await?))
}

pub async fn inventory<I: SearchIndex>(
    State(state): State<AppState<I>>,
) -> Result<Json<InventoryReport>, ApiError> {
    Ok(Json(state.inventory_report().await?))
}

pub async fn movements<I: SearchIndex>(
    State(state): State<AppState<I>>,
) -> Result<Json<MovementReport>, ApiError> {
    Ok(Json(state.movement_report().await?))
}

pub async fn agents<I: SearchIndex>(
    State(state): State<AppState<I>>,
) -> Result<Json<Vec<AgentActivity>>, ApiError> {
    Ok(Json(state.agent_activity().await?))
}

pub async fn recent<I: SearchIndex>(
    State(state): State<AppState<I>>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    Ok(Json(state.recent_activities().await?))
}
