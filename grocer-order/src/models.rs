use chrono::{DateTime, Utc};
use grocer_cart::{CartLine, CheckoutSnapshot, PaymentMethod, PaymentPlan};
use grocer_cart::pricing;
use grocer_core::CustomerProfile;
use grocer_shared::models::events::{OrderLineSummary, OrderPlacedEvent, OrderStatusChangedEvent};
use grocer_shared::Masked;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::manager::OrderError;

/// Order status in the lifecycle. Declaration order is the rank order.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Preparing,
    Shipping,
    Delivered,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Shipping,
        OrderStatus::Delivered,
    ];

    pub fn rank(&self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Preparing => 1,
            OrderStatus::Shipping => 2,
            OrderStatus::Delivered => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivered => "delivered",
        }
    }

    /// Missing or unrecognised values read as `Pending`.
    pub fn parse_lenient(raw: Option<&str>) -> Self {
        raw.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "preparing" => Ok(OrderStatus::Preparing),
            "shipping" => Ok(OrderStatus::Shipping),
            "delivered" => Ok(OrderStatus::Delivered),
            other => Err(format!("unknown order status: {}", other)),
        }
    }
}

/// A checkout submission. Only `status` and `updated_at` change after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    /// Short display reference, e.g. `ORD-4821`. Not unique.
    pub reference: String,
    pub customer_name: String,
    pub customer_email: Option<Masked<String>>,
    pub customer_phone: Option<Masked<String>>,
    pub lines: Vec<CartLine>,
    pub subtotal: Decimal,
    pub delivery_fee: Decimal,
    pub grand_total: Decimal,
    pub points_earned: u64,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Freeze a checkout snapshot into a pending order
    pub fn place(snapshot: &CheckoutSnapshot, plan: &PaymentPlan, customer: &CustomerProfile) -> Self {
        let now = Utc::now();
        let phone = match plan {
            PaymentPlan::Wallet { phone } => Some(phone.as_str()),
            PaymentPlan::Cash => customer.phone(),
        };

        Self {
            id: Uuid::new_v4(),
            reference: generate_reference(),
            customer_name: customer.display_name().to_string(),
            customer_email: customer.email().map(|e| Masked::new(e.to_string())),
            customer_phone: phone.map(|p| Masked::new(p.to_string())),
            lines: snapshot.lines.clone(),
            subtotal: snapshot.totals.subtotal,
            delivery_fee: snapshot.totals.delivery_fee,
            grand_total: snapshot.totals.grand_total,
            points_earned: pricing::points_for(&snapshot.lines),
            payment_method: plan.method(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move forward in the lifecycle. Rank must strictly increase.
    pub fn advance_to(&mut self, next: OrderStatus) -> Result<OrderStatusChangedEvent, OrderError> {
        if next.rank() <= self.status.rank() {
            return Err(OrderError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }

        let from = self.status;
        self.update_status(next);

        Ok(OrderStatusChangedEvent {
            order_id: self.id,
            from: from.to_string(),
            to: next.to_string(),
            timestamp: self.updated_at.timestamp(),
        })
    }

    fn update_status(&mut self, new_status: OrderStatus) {
        self.status = new_status;
        self.updated_at = Utc::now();
    }

    pub fn belongs_to(&self, email: &str) -> bool {
        self.customer_email
            .as_ref()
            .is_some_and(|e| e.expose().eq_ignore_ascii_case(email.trim()))
    }

    /// Admin notification payload
    pub fn to_placed_event(&self) -> OrderPlacedEvent {
        OrderPlacedEvent {
            order_id: self.id,
            reference: self.reference.clone(),
            customer_name: self.customer_name.clone(),
            customer_email: self.customer_email.clone(),
            customer_phone: self.customer_phone.clone(),
            payment_method: self.payment_method.to_string(),
            lines: self
                .lines
                .iter()
                .map(|line| OrderLineSummary {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    unit: line.unit.clone(),
                    unit_price: line.unit_price,
                    line_total: line.line_total(),
                })
                .collect(),
            subtotal: self.subtotal,
            delivery_fee: self.delivery_fee,
            grand_total: self.grand_total,
            points_earned: self.points_earned,
            placed_at: self.created_at,
        }
    }
}

/// `ORD-` followed by a uniform draw from 1000..=9999
pub fn generate_reference() -> String {
    let token: u16 = rand::thread_rng().gen_range(1000..=9999);
    format!("ORD-{}", token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use grocer_cart::Cart;
    use rust_decimal_macros::dec;

    fn snapshot() -> CheckoutSnapshot {
        let mut cart = Cart::new();
        cart.add_line(CartLine::new("beef", "Beef", dec!(100)).with_quantity(2).with_unit("kg"))
            .unwrap();
        cart.snapshot()
    }

    #[test]
    fn test_place_copies_snapshot() {
        let customer = CustomerProfile::new("Salma").with_email("salma@example.com");
        let order = Order::place(&snapshot(), &PaymentPlan::Cash, &customer);

        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, PaymentMethod::Cash);
        assert_eq!(order.subtotal, dec!(200));
        assert_eq!(order.grand_total, dec!(205));
        assert_eq!(order.points_earned, 2000);
        assert_eq!(order.lines.len(), 1);
        assert!(order.belongs_to("SALMA@example.com"));
        assert!(order.customer_phone.is_none());
    }

    #[test]
    fn test_wallet_order_keeps_wallet_phone() {
        let customer = CustomerProfile::new("Salma").with_phone("01099999999");
        let plan = PaymentPlan::Wallet { phone: "01011111111".to_string() };
        let order = Order::place(&snapshot(), &plan, &customer);

        assert_eq!(order.payment_method, PaymentMethod::Wallet);
        assert_eq!(order.customer_phone.unwrap().into_inner(), "01011111111");
    }

    #[test]
    fn test_reference_format() {
        for _ in 0..200 {
            let reference = generate_reference();
            let digits = reference.strip_prefix("ORD-").unwrap();
            let token: u16 = digits.parse().unwrap();
            assert!((1000..=9999).contains(&token));
        }
    }

    #[test]
    fn test_status_advances_forward_only() {
        let mut order = Order::place(&snapshot(), &PaymentPlan::Cash, &CustomerProfile::default());

        let event = order.advance_to(OrderStatus::Shipping).unwrap();
        assert_eq!(event.from, "pending");
        assert_eq!(event.to, "shipping");

        assert!(order.advance_to(OrderStatus::Preparing).is_err());
        assert!(order.advance_to(OrderStatus::Shipping).is_err());
        assert_eq!(order.status, OrderStatus::Shipping);
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(OrderStatus::parse_lenient(Some("Delivered")), OrderStatus::Delivered);
        assert_eq!(OrderStatus::parse_lenient(Some("lost")), OrderStatus::Pending);
        assert_eq!(OrderStatus::parse_lenient(None), OrderStatus::Pending);
        assert!(OrderStatus::Pending < OrderStatus::Delivered);
    }

    #[test]
    fn test_placed_event_payload() {
        let customer = CustomerProfile::new("Salma").with_email("salma@example.com");
        let order = Order::place(&snapshot(), &PaymentPlan::Cash, &customer);
        let event = order.to_placed_event();

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["reference"], order.reference.as_str());
        assert_eq!(json["customerEmail"], "salma@example.com");
        assert_eq!(json["paymentMethod"], "cash");
        assert_eq!(json["grandTotal"], "205");
        assert_eq!(json["lines"][0]["lineTotal"], "200");
        assert_eq!(json["pointsEarned"], 2000);
    }
}
