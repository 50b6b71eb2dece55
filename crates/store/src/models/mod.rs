//! Domain types for the store.

pub mod cart;
pub mod catalog;
pub mod order;
pub mod session;
pub mod user;

pub use cart::CartItem;
pub use catalog::{Album, Artist, Genre};
pub use order::{Order, OrderDetail, ShipTo};
pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
