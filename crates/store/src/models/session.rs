//! Session-related types.
//!
//! Types stored in the session for authentication and cart state.

use serde::{Deserialize, Serialize};

use melodex_core::{Email, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's login name.
    pub username: String,
    /// User's email address.
    pub email: Email,
}

/// Session keys for authentication and cart data.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for storing the shopping cart ID.
    pub const CART_ID: &str = "cart_id";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_current_user_serde_roundtrip() {
        let user = CurrentUser {
            id: UserId::new(5),
            username: "scott".to_owned(),
            email: Email::parse("scott@example.com").unwrap(),
        };

        let json = serde_json::to_string(&user).unwrap();
        let parsed: CurrentUser = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, user.id);
        assert_eq!(parsed.username, user.username);
        assert_eq!(parsed.email, user.email);
    }
}
