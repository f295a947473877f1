use axum::{
    extract::{Path, State},
    routing::{get, patch, post},
    Json, Router,
};
use grocer_cart::{CartLine, CheckoutSnapshot};
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::error::AppError;
use crate::session::SessionId;
use crate::state::AppState;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub unit: Option<String>,
    pub image_ref: Option<String>,
}

fn default_quantity() -> u32 { 1 }

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: i64,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/cart", get(get_cart).delete(clear_cart))
        .route("/v1/cart/lines", post(add_line))
        .route("/v1/cart/lines/{product_id}", patch(set_quantity).delete(remove_line))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/cart
/// Current lines and totals
pub async fn get_cart(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> Json<CheckoutSnapshot> {
    let session = state.session(&session_id);
    let session = session.lock().await;
    Json(session.cart.snapshot())
}

/// POST /v1/cart/lines
pub async fn add_line(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(req): Json<AddLineRequest>,
) -> Result<Json<CheckoutSnapshot>, AppError> {
    let mut line = CartLine::new(req.product_id, req.name, req.unit_price).with_quantity(req.quantity);
    if let Some(unit) = req.unit {
        line = line.with_unit(unit);
    }
    if let Some(image_ref) = req.image_ref {
        line = line.with_image(image_ref);
    }

    let session = state.session(&session_id);
    let mut session = session.lock().await;
    session.cart.add_line(line)?;
    Ok(Json(session.cart.snapshot()))
}

/// PATCH /v1/cart/lines/{product_id}
/// Zero or below removes the line
pub async fn set_quantity(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Path(product_id): Path<String>,
    Json(req): Json<SetQuantityRequest>,
) -> Result<Json<CheckoutSnapshot>, AppError> {
    let session = state.session(&session_id);
    let mut session = session.lock().await;
    session.cart.set_quantity(&product_id, req.quantity)?;
    Ok(Json(session.cart.snapshot()))
}

/// DELETE /v1/cart/lines/{product_id}
pub async fn remove_line(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Path(product_id): Path<String>,
) -> Result<Json<CheckoutSnapshot>, AppError> {
    let session = state.session(&session_id);
    let mut session = session.lock().await;
    session.cart.remove(&product_id)?;
    Ok(Json(session.cart.snapshot()))
}

/// DELETE /v1/cart
/// Explicit cancellation: empties the cart
pub async fn clear_cart(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> Json<CheckoutSnapshot> {
    let session = state.session(&session_id);
    let mut session = session.lock().await;
    session.cart.clear();
    Json(session.cart.snapshot())
}
