pub mod customer;
pub mod payment;
pub mod notification;

pub use customer::{CustomerContact, CustomerProfile};
pub use payment::{CheckoutSession, PaymentAdapter, PaymentError, PaymentRequest};
pub use notification::{NotificationAdapter, NotificationError, NotificationReceipt};
