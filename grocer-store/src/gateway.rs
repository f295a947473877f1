//! HTTP adapters for the storefront's hosted edge functions.
//!
//! The payment (Paymob) and email (Resend) providers sit behind two functions;
//! this module only speaks their JSON contracts.

use async_trait::async_trait;
use grocer_core::{
    CheckoutSession, CustomerContact, NotificationAdapter, NotificationError, NotificationReceipt,
    PaymentAdapter, PaymentError, PaymentRequest,
};
use grocer_shared::models::events::OrderPlacedEvent;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

use crate::app_config::ServicesConfig;

pub const PAYMENT_FUNCTION: &str = "paymob-checkout";
pub const NOTIFY_FUNCTION: &str = "send-order-email";

#[derive(Debug, thiserror::Error)]
pub enum FunctionCallError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Function error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Shared client for `POST {functions_url}/{name}` calls
#[derive(Clone)]
pub struct FunctionsClient {
    client: reqwest::Client,
    base_url: String,
}

impl FunctionsClient {
    pub fn new(config: &ServicesConfig) -> Result<Self, FunctionCallError> {
        let mut headers = HeaderMap::new();

        let bearer = format!("Bearer {}", config.anon_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&bearer)
                .map_err(|e| FunctionCallError::Parse(format!("Invalid anon key format: {e}")))?,
        );
        headers.insert(
            "apikey",
            HeaderValue::from_str(&config.anon_key)
                .map_err(|e| FunctionCallError::Parse(format!("Invalid anon key format: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.functions_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn invoke<B, R>(&self, function: &str, body: &B) -> Result<R, FunctionCallError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, function);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(FunctionCallError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| FunctionCallError::Parse(e.to_string()))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckoutBody<'a> {
    amount: Decimal,
    amount_cents: i64,
    order_id: Uuid,
    reference: &'a str,
    customer: &'a CustomerContact,
}

fn to_cents(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Wallet checkout through the Paymob edge function
pub struct PaymobCheckout {
    functions: FunctionsClient,
}

impl PaymobCheckout {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }
}

#[async_trait]
impl PaymentAdapter for PaymobCheckout {
    async fn create_intent(&self, request: &PaymentRequest) -> Result<CheckoutSession, PaymentError> {
        let amount_cents = to_cents(request.amount).ok_or_else(|| PaymentError::Rejected {
            status: 0,
            message: format!("amount out of range: {}", request.amount),
        })?;

        let body = CheckoutBody {
            amount: request.amount,
            amount_cents,
            order_id: request.order_id,
            reference: &request.reference,
            customer: &request.customer,
        };

        self.functions
            .invoke(PAYMENT_FUNCTION, &body)
            .await
            .map_err(|e| match e {
                FunctionCallError::Api { status, message } => PaymentError::Rejected { status, message },
                other => PaymentError::Transport(other.to_string()),
            })
    }
}

/// Admin order email through the Resend edge function
pub struct OrderEmailNotifier {
    functions: FunctionsClient,
}

impl OrderEmailNotifier {
    pub fn new(functions: FunctionsClient) -> Self {
        Self { functions }
    }
}

#[async_trait]
impl NotificationAdapter for OrderEmailNotifier {
    async fn notify(&self, event: &OrderPlacedEvent) -> Result<NotificationReceipt, NotificationError> {
        self.functions
            .invoke(NOTIFY_FUNCTION, event)
            .await
            .map_err(|e| match e {
                FunctionCallError::Api { status, .. } => NotificationError::Rejected { status },
                other => NotificationError::Delivery(other.to_string()),
            })
    }
}
