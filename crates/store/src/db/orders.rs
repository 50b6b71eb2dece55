//! Order repository.
//!
//! Orders are written once at checkout inside a single transaction: the
//! order header, one detail line per cart item with the unit price copied
//! from the album at that moment, and the cart cleared.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use melodex_core::{AlbumId, OrderDetailId, OrderId, Price, UserId};

use super::RepositoryError;
use crate::models::cart::CartItem;
use crate::models::order::{Order, OrderDetail, ShipTo};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    order_date: DateTime<Utc>,
    ship_name: String,
    ship_address: String,
    ship_city: String,
    ship_country: String,
    ship_postal_code: String,
    ship_phone: Option<String>,
    ship_email: String,
    total: Decimal,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            order_date: row.order_date,
            ship_to: ShipTo {
                name: row.ship_name,
                address: row.ship_address,
                city: row.ship_city,
                country: row.ship_country,
                postal_code: row.ship_postal_code,
                phone: row.ship_phone,
                email: row.ship_email,
            },
            total: Price::new(row.total),
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderDetailRow {
    id: i32,
    order_id: i32,
    album_id: i32,
    album_title: String,
    quantity: i32,
    unit_price: Decimal,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        Self {
            id: OrderDetailId::new(row.id),
            order_id: OrderId::new(row.order_id),
            album_id: AlbumId::new(row.album_id),
            album_title: row.album_title,
            quantity: row.quantity,
            unit_price: Price::new(row.unit_price),
        }
    }
}

const ORDER_COLUMNS: &str = "id, user_id, order_date, ship_name, ship_address, ship_city, \
                             ship_country, ship_postal_code, ship_phone, ship_email, total";

/// SQL for the order header insert. One placeholder per bound value.
fn order_insert_sql() -> String {
    format!(
        "INSERT INTO orders (user_id, ship_name, ship_address, ship_city, ship_country, \
                             ship_postal_code, ship_phone, ship_email, total) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING {ORDER_COLUMNS}"
    )
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Place an order from the contents of a cart.
    ///
    /// Writes the order header and one detail line per cart item, then
    /// empties the cart. Everything happens in one transaction, so a
    /// failure leaves both the cart and the orders tables untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the cart is empty.
    /// Returns `RepositoryError::Database` for database errors.
    pub async fn create(
        &self,
        user_id: UserId,
        cart_id: &str,
        ship_to: &ShipTo,
        items: &[CartItem],
    ) -> Result<Order, RepositoryError> {
        if items.is_empty() {
            return Err(RepositoryError::Conflict("cart is empty".to_owned()));
        }

        let total: Price = items.iter().map(CartItem::line_price).sum();

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, OrderRow>(&order_insert_sql())
            .bind(user_id.as_i32())
            .bind(&ship_to.name)
            .bind(&ship_to.address)
            .bind(&ship_to.city)
            .bind(&ship_to.country)
            .bind(&ship_to.postal_code)
            .bind(ship_to.phone.as_deref())
            .bind(&ship_to.email)
            .bind(total.amount())
            .fetch_one(&mut *tx)
            .await?;

        let order: Order = row.into();

        for item in items {
            sqlx::query(
                "INSERT INTO order_details (order_id, album_id, album_title, quantity, unit_price) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(order.id.as_i32())
            .bind(item.album_id.as_i32())
            .bind(&item.album_title)
            .bind(item.quantity)
            .bind(item.unit_price.amount())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(order)
    }

    /// Get an order, scoped to its owner.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 AND user_id = $2"
        ))
        .bind(order_id.as_i32())
        .bind(user_id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List the detail lines of an order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn details(&self, order_id: OrderId) -> Result<Vec<OrderDetail>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderDetailRow>(
            "SELECT id, order_id, album_id, album_title, quantity, unit_price \
             FROM order_details WHERE order_id = $1 ORDER BY id ASC",
        )
        .bind(order_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sqlx::postgres::PgPoolOptions;

    use melodex_core::CartItemId;

    use super::*;

    /// Every placeholder in the order insert must have a bind in `create`.
    #[test]
    fn test_order_insert_placeholder_count_matches_binds() {
        let sql = order_insert_sql();
        let placeholders = sql.matches('$').count();
        // user_id, seven ship fields, total
        assert_eq!(placeholders, 9);
        assert!(sql.contains("$9"));
    }

    #[test]
    fn test_order_row_mapping() {
        let row = OrderRow {
            id: 12,
            user_id: 7,
            order_date: Utc::now(),
            ship_name: "Scott Guthrie".to_owned(),
            ship_address: "1 Microsoft Way".to_owned(),
            ship_city: "Redmond".to_owned(),
            ship_country: "USA".to_owned(),
            ship_postal_code: "98052".to_owned(),
            ship_phone: None,
            ship_email: "scott@example.com".to_owned(),
            total: Decimal::new(26_97, 2),
        };

        let order: Order = row.into();
        assert_eq!(order.id, OrderId::new(12));
        assert_eq!(order.user_id, UserId::new(7));
        assert_eq!(order.ship_to.name, "Scott Guthrie");
        assert_eq!(order.ship_to.email, "scott@example.com");
        assert_eq!(order.total.display(), "$26.97");
    }

    #[test]
    fn test_order_detail_row_mapping() {
        let row = OrderDetailRow {
            id: 3,
            order_id: 12,
            album_id: 42,
            album_title: "Kind of Blue".to_owned(),
            quantity: 2,
            unit_price: Decimal::new(8_99, 2),
        };

        let detail: OrderDetail = row.into();
        assert_eq!(detail.order_id, OrderId::new(12));
        assert_eq!(detail.album_id, AlbumId::new(42));
        assert_eq!(detail.quantity, 2);
        assert_eq!(detail.unit_price.display(), "$8.99");
    }

    /// Total on the order is the sum of line prices (unit price x quantity).
    #[test]
    fn test_total_sums_line_prices() {
        let items = [
            CartItem {
                id: CartItemId::new(1),
                album_id: AlbumId::new(10),
                album_title: "Discovery".to_owned(),
                artist_name: "Daft Punk".to_owned(),
                unit_price: Price::from_cents(8_99),
                quantity: 2,
                created_at: Utc::now(),
            },
            CartItem {
                id: CartItemId::new(2),
                album_id: AlbumId::new(11),
                album_title: "Paranoid".to_owned(),
                artist_name: "Black Sabbath".to_owned(),
                unit_price: Price::from_cents(10_00),
                quantity: 1,
                created_at: Utc::now(),
            },
        ];

        let total: Price = items.iter().map(CartItem::line_price).sum();
        assert_eq!(total.display(), "$27.98");
    }

    /// An empty cart is rejected before any statement reaches the database.
    #[tokio::test]
    async fn test_create_rejects_empty_cart() {
        // Lazy pool: never connects because the guard fires first
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unreachable")
            .expect("lazy pool");

        let ship_to = ShipTo {
            name: "Scott".to_owned(),
            address: "1 Main St".to_owned(),
            city: "Redmond".to_owned(),
            country: "USA".to_owned(),
            postal_code: "98052".to_owned(),
            phone: None,
            email: "scott@example.com".to_owned(),
        };

        let result = OrderRepository::new(&pool)
            .create(UserId::new(1), "cart-1", &ship_to, &[])
            .await;

        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }
}
