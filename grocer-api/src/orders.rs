use axum::{
    extract::{Path, Query, State},
    routing::{get, patch},
    Json, Router,
};
use grocer_order::{tracker, Order, OrderStatus, Timeline};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct OrderHistoryResponse {
    pub orders: Vec<Order>,
    pub total_points: u64,
}

#[derive(Debug, Serialize)]
pub struct TimelineResponse {
    pub order_id: Uuid,
    pub reference: String,
    pub progress: f64,
    #[serde(flatten)]
    pub timeline: Timeline,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/orders", get(list_orders))
        .route("/v1/orders/{id}", get(get_order))
        .route("/v1/orders/{id}/timeline", get(get_timeline))
        .route("/v1/admin/orders/{id}/status", patch(update_status))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/orders?email=
/// Order history with accumulated loyalty points
pub async fn list_orders(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<OrderHistoryResponse>, AppError> {
    let orders = state.orders.list_for_customer(&query.email).await?;
    let total_points = orders
        .iter()
        .map(|order| order.points_earned)
        .fold(0u64, u64::saturating_add);

    Ok(Json(OrderHistoryResponse { orders, total_points }))
}

/// GET /v1/orders/{id}
pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = fetch(&state, order_id).await?;
    Ok(Json(order))
}

/// GET /v1/orders/{id}/timeline
/// Status stages for the tracking screen
pub async fn get_timeline(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<TimelineResponse>, AppError> {
    let order = fetch(&state, order_id).await?;
    let timeline = tracker::timeline_for(&order);

    Ok(Json(TimelineResponse {
        order_id: order.id,
        reference: order.reference,
        progress: timeline.progress(),
        timeline,
    }))
}

/// PATCH /v1/admin/orders/{id}/status
/// Administrative status channel; only forward moves are accepted
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<Order>, AppError> {
    let order = state.orders.update_status(order_id, req.status).await?;
    Ok(Json(order))
}

async fn fetch(state: &AppState, order_id: Uuid) -> Result<Order, AppError> {
    state
        .orders
        .get(order_id)
        .await?
        .ok_or_else(|| AppError::NotFoundError(format!("Order not found: {}", order_id)))
}
