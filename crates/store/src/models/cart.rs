//! Shopping cart domain types.
//!
//! A cart is identified by an opaque ID issued per session. Items join
//! against the catalog so handlers can render titles and prices without a
//! second lookup.

use chrono::{DateTime, Utc};

use melodex_core::{AlbumId, CartItemId, Price};

/// A line in a shopping cart, joined with album display data.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub album_id: AlbumId,
    pub album_title: String,
    pub artist_name: String,
    pub unit_price: Price,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

impl CartItem {
    /// Price of this line (unit price times quantity).
    #[must_use]
    pub fn line_price(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}
