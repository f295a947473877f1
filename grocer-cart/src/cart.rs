use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::pricing::{self, CartTotals, CheckoutSnapshot, DEFAULT_DELIVERY_FEE};

const DEFAULT_UNIT: &str = "piece";

/// One product and its selected quantity awaiting checkout
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    pub unit: String,
    pub image_ref: Option<String>,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, name: impl Into<String>, unit_price: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            name: name.into(),
            unit_price,
            quantity: 1,
            unit: DEFAULT_UNIT.to_string(),
            image_ref: None,
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_image(mut self, image_ref: impl Into<String>) -> Self {
        self.image_ref = Some(image_ref.into());
        self
    }

    /// Saturates at `Decimal::MAX`; lines held by a `Cart` never get there.
    pub fn line_total(&self) -> Decimal {
        self.unit_price.saturating_mul(Decimal::from(self.quantity))
    }

    pub fn checked_total(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Cart aggregator. Lines keep insertion order; a line never holds quantity 0
/// and the totals always fit their types.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    delivery_fee: Decimal,
}

impl Cart {
    pub fn new() -> Self {
        Self::with_delivery_fee(DEFAULT_DELIVERY_FEE)
    }

    pub fn with_delivery_fee(delivery_fee: Decimal) -> Self {
        Self {
            lines: Vec::new(),
            delivery_fee,
        }
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn delivery_fee(&self) -> Decimal {
        self.delivery_fee
    }

    pub fn line(&self, product_id: &str) -> Option<&CartLine> {
        self.lines.iter().find(|line| line.product_id == product_id)
    }

    /// Add to cart. Merges into an existing line for the same product.
    pub fn add_line(&mut self, line: CartLine) -> Result<(), CartError> {
        if line.unit_price < Decimal::ZERO {
            return Err(CartError::NegativePrice(line.product_id));
        }
        if line.quantity == 0 {
            return Ok(());
        }

        let product_id = line.product_id.clone();
        let mut lines = self.lines.clone();
        match lines.iter().position(|l| l.product_id == product_id) {
            Some(index) => {
                lines[index].quantity = lines[index]
                    .quantity
                    .checked_add(line.quantity)
                    .ok_or_else(|| CartError::QuantityOverflow(product_id.clone()))?;
            }
            None => lines.push(line),
        }

        self.commit(lines, &product_id)
    }

    /// Zero or negative removes the line.
    pub fn set_quantity(&mut self, product_id: &str, new_quantity: i64) -> Result<(), CartError> {
        let index = self
            .lines
            .iter()
            .position(|line| line.product_id == product_id)
            .ok_or_else(|| CartError::LineNotFound(product_id.to_string()))?;

        if new_quantity <= 0 {
            self.lines.remove(index);
            return Ok(());
        }

        let quantity = u32::try_from(new_quantity)
            .map_err(|_| CartError::QuantityOverflow(product_id.to_string()))?;
        let mut lines = self.lines.clone();
        lines[index].quantity = quantity;

        self.commit(lines, product_id)
    }

    pub fn increment(&mut self, product_id: &str) -> Result<(), CartError> {
        let current = self.current_quantity(product_id)?;
        self.set_quantity(product_id, current + 1)
    }

    pub fn decrement(&mut self, product_id: &str) -> Result<(), CartError> {
        let current = self.current_quantity(product_id)?;
        self.set_quantity(product_id, current - 1)
    }

    pub fn remove(&mut self, product_id: &str) -> Result<(), CartError> {
        self.set_quantity(product_id, 0)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn totals(&self) -> CartTotals {
        pricing::totals_for(&self.lines, self.delivery_fee)
    }

    pub fn snapshot(&self) -> CheckoutSnapshot {
        CheckoutSnapshot {
            lines: self.lines.clone(),
            totals: self.totals(),
        }
    }

    /// Swap in `lines` only if their totals stay representable
    fn commit(&mut self, lines: Vec<CartLine>, product_id: &str) -> Result<(), CartError> {
        if pricing::checked_count(&lines).is_none() {
            return Err(CartError::QuantityOverflow(product_id.to_string()));
        }
        if pricing::checked_grand_total(&lines, self.delivery_fee).is_none() {
            return Err(CartError::AmountOutOfRange(product_id.to_string()));
        }

        self.lines = lines;
        Ok(())
    }

    fn current_quantity(&self, product_id: &str) -> Result<i64, CartError> {
        self.line(product_id)
            .map(|line| i64::from(line.quantity))
            .ok_or_else(|| CartError::LineNotFound(product_id.to_string()))
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CartError {
    #[error("Cart line not found: {0}")]
    LineNotFound(String),

    #[error("Negative unit price for product {0}")]
    NegativePrice(String),

    #[error("Quantity out of range for product {0}")]
    QuantityOverflow(String),

    #[error("Cart total out of range after adding product {0}")]
    AmountOutOfRange(String),
}
