//! Application services
pub mod cart;
pub mod catalog;
pub mod coupon;
pub mod delivery;
pub mod loyalty;
pub mod notify;
pub mod payment;
pub mod reminder;
pub mod users;

pub use cart::CartService;
pub use catalog::CatalogService;
pub use coupon::CouponService;
pub use delivery::DeliveryService;
pub use loyalty::LoyaltyService;
pub use payment::PaymentService;
pub use reminder::ReminderService;
pub use users::UserService;
