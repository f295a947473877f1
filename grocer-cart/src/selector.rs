use grocer_core::CustomerProfile;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::cart::Cart;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    #[default]
    Cash,
    Wallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Wallet => "wallet",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "wallet" => Ok(PaymentMethod::Wallet),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Validated outcome of the selector, ready for submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentPlan {
    Cash,
    Wallet { phone: String },
}

impl PaymentPlan {
    pub fn method(&self) -> PaymentMethod {
        match self {
            PaymentPlan::Cash => PaymentMethod::Cash,
            PaymentPlan::Wallet { .. } => PaymentMethod::Wallet,
        }
    }
}

/// Cash vs. electronic wallet. One active selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentSelector {
    method: PaymentMethod,
    wallet_phone: Option<String>,
}

impl PaymentSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(&self) -> PaymentMethod {
        self.method
    }

    pub fn select(&mut self, method: PaymentMethod) {
        self.method = method;
    }

    pub fn wallet_phone(&self) -> Option<&str> {
        self.wallet_phone.as_deref()
    }

    pub fn set_wallet_phone(&mut self, phone: Option<String>) {
        self.wallet_phone = phone;
    }

    /// The selector's own input wins over the profile phone.
    pub fn validate(&self, cart: &Cart, customer: &CustomerProfile) -> Result<PaymentPlan, ValidationError> {
        if cart.is_empty() {
            return Err(ValidationError::EmptyCart);
        }

        match self.method {
            PaymentMethod::Cash => Ok(PaymentPlan::Cash),
            PaymentMethod::Wallet => {
                let input = self
                    .wallet_phone
                    .as_deref()
                    .map(str::trim)
                    .filter(|phone| !phone.is_empty());

                input
                    .or_else(|| customer.phone())
                    .map(|phone| PaymentPlan::Wallet { phone: phone.to_string() })
                    .ok_or(ValidationError::MissingPhone)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("empty_cart")]
    EmptyCart,

    #[error("missing_phone")]
    MissingPhone,
}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::EmptyCart => "empty_cart",
            ValidationError::MissingPhone => "missing_phone",
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            ValidationError::EmptyCart => "Your cart is empty.",
            ValidationError::MissingPhone => "Enter the phone number linked to your wallet.",
        }
    }
}
