use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{Order, OrderStatus};
use crate::repository::OrderRepository;

/// In-memory order history. Appended to by checkout, read by tracking.
pub struct OrderHistory {
    orders: RwLock<Vec<Order>>,
}

impl OrderHistory {
    pub fn new() -> Self {
        Self {
            orders: RwLock::new(Vec::new()),
        }
    }

    pub async fn len(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.read().await.is_empty()
    }

    pub async fn all(&self) -> Vec<Order> {
        self.orders.read().await.clone()
    }

    /// Loyalty points accumulated across a customer's orders
    pub async fn total_points(&self, email: &str) -> u64 {
        self.orders
            .read()
            .await
            .iter()
            .filter(|order| order.belongs_to(email))
            .map(|order| order.points_earned)
            .fold(0u64, u64::saturating_add)
    }
}

impl Default for OrderHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl OrderRepository for OrderHistory {
    async fn append(&self, order: &Order) -> Result<(), OrderError> {
        let mut orders = self.orders.write().await;
        if orders.iter().any(|existing| existing.id == order.id) {
            return Err(OrderError::Duplicate(order.id));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Order>, OrderError> {
        Ok(self.orders.read().await.iter().find(|o| o.id == id).cloned())
    }

    async fn list_for_customer(&self, email: &str) -> Result<Vec<Order>, OrderError> {
        Ok(self
            .orders
            .read()
            .await
            .iter()
            .filter(|order| order.belongs_to(email))
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError> {
        let mut orders = self.orders.write().await;
        let order = orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or(OrderError::NotFound(id))?;

        let event = order.advance_to(status)?;
        tracing::info!(order_id = %event.order_id, from = %event.from, to = %event.to, "Order status advanced");
        Ok(order.clone())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Order already recorded: {0}")]
    Duplicate(Uuid),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: String,
        to: String,
    },

    #[error("Order storage failed: {0}")]
    Storage(String),
}
