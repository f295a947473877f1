pub mod app_config;
pub mod order_repo;
pub mod gateway;

pub use app_config::Config;
pub use order_repo::PgOrderRepository;
pub use gateway::{FunctionsClient, OrderEmailNotifier, PaymobCheckout};
