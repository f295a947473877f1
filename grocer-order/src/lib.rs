pub mod models;
pub mod manager;
pub mod repository;
pub mod orchestrator;
pub mod tracker;

pub use models::{Order, OrderStatus};
pub use manager::{OrderError, OrderHistory};
pub use repository::OrderRepository;
pub use orchestrator::{
    CheckoutError, CheckoutOrchestrator, CheckoutTimeouts, NotificationHandle, SubmissionOutcome,
    SubmissionState,
};
pub use tracker::{StatusStage, Timeline};
