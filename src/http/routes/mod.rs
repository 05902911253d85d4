pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod delivery;
pub mod loyalty;
pub mod payment;
pub mod users;
