//! Aggregates module
pub mod product;
pub mod cart;
pub mod coupon;
pub mod loyalty;
pub mod payment;

pub use product::{effective_price, Category, Product};
pub use cart::{Cart, CartError, CartItem, CartStatus, LinePrice};
pub use coupon::{Coupon, CouponDiscount};
pub use loyalty::{LoyaltyAccount, LoyaltyLevel, PurchaseHistory};
pub use payment::{Payment, PaymentError, PaymentStatus};
