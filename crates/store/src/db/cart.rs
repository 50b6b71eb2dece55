//! Shopping cart repository.
//!
//! Cart rows are keyed by an opaque `cart_id` issued per session. Adding an
//! album that is already in the cart increments its quantity.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use melodex_core::{AlbumId, CartItemId, Price};

use super::RepositoryError;
use crate::models::cart::CartItem;

/// Cart item row joined with album display data.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i32,
    album_id: i32,
    album_title: String,
    artist_name: String,
    unit_price: Decimal,
    quantity: i32,
    created_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        Self {
            id: CartItemId::new(row.id),
            album_id: AlbumId::new(row.album_id),
            album_title: row.album_title,
            artist_name: row.artist_name,
            unit_price: Price::new(row.unit_price),
            quantity: row.quantity,
            created_at: row.created_at,
        }
    }
}

const ITEM_SELECT: &str = "SELECT c.id, c.album_id, a.title AS album_title, \
                                  ar.name AS artist_name, a.price AS unit_price, \
                                  c.quantity, c.created_at \
                           FROM cart_items c \
                           JOIN albums a ON a.id = c.album_id \
                           JOIN artists ar ON ar.id = a.artist_id";

/// Repository for shopping cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List the items in a cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, cart_id: &str) -> Result<Vec<CartItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRow>(&format!(
            "{ITEM_SELECT} WHERE c.cart_id = $1 ORDER BY c.created_at ASC, c.id ASC"
        ))
        .bind(cart_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add one copy of an album to a cart, creating the line or bumping its
    /// quantity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails (including
    /// foreign-key violations for unknown albums).
    pub async fn add_album(&self, cart_id: &str, album_id: AlbumId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (cart_id, album_id, quantity) VALUES ($1, $2, 1) \
             ON CONFLICT (cart_id, album_id) \
             DO UPDATE SET quantity = cart_items.quantity + 1",
        )
        .bind(cart_id)
        .bind(album_id.as_i32())
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Set the quantity of a cart line. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line doesn't belong to the cart.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_quantity(
        &self,
        cart_id: &str,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        let result = if quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
                .bind(item_id.as_i32())
                .bind(cart_id)
                .execute(self.pool)
                .await?
        } else {
            sqlx::query("UPDATE cart_items SET quantity = $1 WHERE id = $2 AND cart_id = $3")
                .bind(quantity)
                .bind(item_id.as_i32())
                .bind(cart_id)
                .execute(self.pool)
                .await?
        };

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove a line from a cart.
    ///
    /// Returns `true` if the line existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        cart_id: &str,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
            .bind(item_id.as_i32())
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Total number of copies across all lines in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, cart_id: &str) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0) FROM cart_items WHERE cart_id = $1",
        )
        .bind(cart_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }

    /// Remove every line in a cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear(&self, cart_id: &str) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
