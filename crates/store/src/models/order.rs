//! Order domain types.

use chrono::{DateTime, Utc};

use melodex_core::{AlbumId, OrderDetailId, OrderId, Price, UserId};

/// Shipping details captured on the checkout form.
#[derive(Debug, Clone)]
pub struct ShipTo {
    pub name: String,
    pub address: String,
    pub city: String,
    pub country: String,
    pub postal_code: String,
    pub phone: Option<String>,
    pub email: String,
}

/// A placed order.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub order_date: DateTime<Utc>,
    pub ship_to: ShipTo,
    pub total: Price,
}

/// A line item on a placed order.
///
/// `unit_price` is a snapshot of the album price at checkout time; later
/// catalog price changes do not affect existing orders.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub id: OrderDetailId,
    pub order_id: OrderId,
    pub album_id: AlbumId,
    pub album_title: String,
    pub quantity: i32,
    pub unit_price: Price,
}
