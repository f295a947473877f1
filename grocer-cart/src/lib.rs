pub mod cart;
pub mod pricing;
pub mod selector;

pub use cart::{Cart, CartError, CartLine};
pub use pricing::{CartTotals, CheckoutSnapshot, DEFAULT_DELIVERY_FEE};
pub use selector::{PaymentMethod, PaymentPlan, PaymentSelector, ValidationError};
