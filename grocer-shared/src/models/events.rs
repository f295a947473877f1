use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::pii::Masked;

/// Payload of the admin "new order" notification.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedEvent {
    pub order_id: Uuid,
    pub reference: String,
    pub customer_name: String,
    pub customer_email: Option<Masked<String>>,
    pub customer_phone: Option<Masked<String>>,
    pub payment_method: String,
    pub lines: Vec<OrderLineSummary>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub grand_total: Decimal,
    pub points_earned: u64,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineSummary {
    pub name: String,
    pub quantity: u32,
    pub unit: String,
    pub unit_price: Decimal,
    pub line_total: Decimal,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusChangedEvent {
    pub order_id: Uuid,
    pub from: String,
    pub to: String,
    pub timestamp: i64,
}
