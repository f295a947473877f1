use async_trait::async_trait;
use uuid::Uuid;

use crate::manager::OrderError;
use crate::models::{Order, OrderStatus};

/// Repository trait for order data access
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Append a freshly placed order to the history
    async fn append(&self, order: &Order) -> Result<(), OrderError>;

    async fn get(&self, id: Uuid) -> Result<Option<Order>, OrderError>;

    /// Orders placed with this email, oldest first
    async fn list_for_customer(&self, email: &str) -> Result<Vec<Order>, OrderError>;

    /// Administrative status change. Implementations reject non-forward moves.
    async fn update_status(&self, id: Uuid, status: OrderStatus) -> Result<Order, OrderError>;
}
