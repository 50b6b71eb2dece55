//! Database operations for the store `PostgreSQL` database.
//!
//! # Tables
//!
//! - `users` / `user_passwords` - Site authentication
//! - `account_tokens` - Email-confirmation and password-reset tokens
//! - `sessions` - Tower-sessions storage
//! - `genres`, `artists`, `albums` - Catalog
//! - `cart_items` - Session-scoped shopping carts
//! - `orders`, `order_details` - Placed orders
//!
//! # Migrations
//!
//! Migrations are stored in `crates/store/migrations/` and run via:
//! ```bash
//! cargo run -p melodex-cli -- migrate
//! ```
//!
//! Queries use runtime-checked `sqlx::query_as` binding so the workspace
//! builds without a live database.

pub mod cart;
pub mod catalog;
pub mod orders;
pub mod tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Errors from repository operations.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
