//! Aggregates module
pub mod blog;
pub mod cart;
pub mod category;
pub mod contact;
pub mod coupon;
pub mod guest;
pub mod order;
pub mod product;
pub mod question;
pub mod review;
pub mod settings;
pub mod wishlist;

pub use blog::{BlogPost, Comment, PostStatus};
pub use cart::{Cart, CartAdjustment, CartError, CartLine};
pub use category::Category;
pub use contact::{ContactMessage, MessageStatus};
pub use coupon::{Coupon, CouponError, Discount};
pub use guest::{GuestUser, Owner};
pub use order::{Address, LineItem, Order, OrderError, OrderStatus, PaymentMethod, PaymentStatus};
pub use product::{Product, ProductError, ProductStatus};
pub use question::Question;
pub use review::{RatingSummary, Review};
pub use settings::StoreSettings;
pub use wishlist::Wishlist;
