use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use grocer_cart::{CartTotals, PaymentMethod};
use grocer_core::CustomerProfile;
use grocer_order::{Order, SubmissionState};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::session::SessionId;
use crate::state::{AppState, ShopperSession};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SelectPaymentRequest {
    pub method: PaymentMethod,
    pub wallet_phone: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutView {
    pub submission: SubmissionState,
    pub payment_method: PaymentMethod,
    pub has_wallet_phone: bool,
    pub totals: CartTotals,
}

impl CheckoutView {
    fn of(session: &ShopperSession) -> Self {
        Self {
            submission: session.orchestrator.state().clone(),
            payment_method: session.selector.method(),
            has_wallet_phone: session
                .selector
                .wallet_phone()
                .is_some_and(|p| !p.trim().is_empty()),
            totals: session.cart.totals(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub submission: SubmissionState,
    pub order: Order,
    /// Present for wallet payments; the client navigates here.
    pub redirect_url: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/checkout", get(get_checkout).post(submit_checkout))
        .route("/v1/checkout/payment-method", put(select_payment_method))
        .route("/v1/checkout/finish", post(finish_checkout))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/checkout
pub async fn get_checkout(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> Json<CheckoutView> {
    let session = state.session(&session_id);
    let session = session.lock().await;
    Json(CheckoutView::of(&session))
}

/// PUT /v1/checkout/payment-method
pub async fn select_payment_method(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(req): Json<SelectPaymentRequest>,
) -> Json<CheckoutView> {
    let session = state.session(&session_id);
    let mut session = session.lock().await;
    session.selector.select(req.method);
    if req.wallet_phone.is_some() {
        session.selector.set_wallet_phone(req.wallet_phone);
    }
    Json(CheckoutView::of(&session))
}

/// POST /v1/checkout
/// Place the order. Wallet orders answer with the payment page to navigate to.
pub async fn submit_checkout(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
    Json(customer): Json<CustomerProfile>,
) -> Result<(StatusCode, Json<SubmitResponse>), AppError> {
    let session = state.session(&session_id);
    let _submitting = session.begin_submission().ok_or_else(|| {
        AppError::ConflictError("A checkout submission is already in flight".to_string())
    })?;
    let mut guard = session.lock().await;
    let ShopperSession { cart, selector, orchestrator } = &mut *guard;

    let outcome = orchestrator.submit(cart, selector, &customer).await?;
    let (order, redirect_url, _notification) = outcome.into_parts();

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            submission: orchestrator.state().clone(),
            order,
            redirect_url,
        }),
    ))
}

/// POST /v1/checkout/finish
/// After the acknowledgment (or on return from the payment page): clear the cart and re-arm checkout
pub async fn finish_checkout(
    State(state): State<AppState>,
    SessionId(session_id): SessionId,
) -> Json<CheckoutView> {
    let session = state.session(&session_id);
    let mut guard = session.lock().await;
    let ShopperSession { cart, orchestrator, .. } = &mut *guard;
    orchestrator.finish(cart);
    Json(CheckoutView::of(&guard))
}
