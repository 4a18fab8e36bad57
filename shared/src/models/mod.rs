//! Domain models shared across crates

pub mod order;
pub mod payment;
pub mod product;

pub use order::{Order, OrderDetail, OrderItem, OrderItemInput, OrderStatus, PaymentStatus};
pub use payment::Payment;
pub use product::Product;
