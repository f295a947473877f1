use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use std::time::Duration;

use crate::customer::{non_blank, CustomerContact};

/// Request for an electronic-wallet checkout session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Decimal,
    pub order_id: Uuid,
    pub reference: String,
    pub customer: CustomerContact,
}

/// What the gateway answered. The URL may be missing even on a 2xx.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub checkout_url: Option<String>,
}

impl CheckoutSession {
    pub fn redirect_url(&self) -> Option<&str> {
        non_blank(self.checkout_url.as_deref())
    }
}

#[async_trait]
pub trait PaymentAdapter: Send + Sync {
    /// Ask the payment provider for a hosted checkout URL
    async fn create_intent(&self, request: &PaymentRequest) -> Result<CheckoutSession, PaymentError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("Payment gateway unreachable: {0}")]
    Transport(String),

    #[error("Payment gateway rejected the request ({status}): {message}")]
    Rejected {
        status: u16,
        message: String,
    },

    #[error("Payment gateway returned no checkout URL")]
    MissingCheckoutUrl,

    #[error("Payment gateway timed out after {0:?}")]
    Timeout(Duration),
}
