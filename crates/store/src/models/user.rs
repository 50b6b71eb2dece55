//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, NaiveDate, Utc};

use melodex_core::{Email, UserId};

/// A store user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name, unique across the store.
    pub username: String,
    /// User's email address.
    pub email: Email,
    /// Whether the email has been confirmed via the emailed callback link.
    pub email_confirmed: bool,
    /// Optional profile fields.
    pub birthdate: Option<NaiveDate>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
