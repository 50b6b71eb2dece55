//! Account token repository.
//!
//! Stores single-use tokens for email confirmation and password reset.
//! Tokens are random opaque strings generated by the auth service; the
//! repository only enforces expiry and single use.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use melodex_core::UserId;

use super::RepositoryError;

/// What an account token authorizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    /// Confirms ownership of the registered email address.
    ConfirmEmail,
    /// Authorizes a password reset.
    ResetPassword,
}

impl TokenPurpose {
    /// Stable string form stored in the `purpose` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConfirmEmail => "confirm_email",
            Self::ResetPassword => "reset_password",
        }
    }
}

/// Repository for account token operations.
pub struct TokenRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> TokenRepository<'a> {
    /// Create a new token repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a freshly issued token.
    ///
    /// Any earlier unconsumed tokens for the same user and purpose are
    /// expired so only the most recent emailed link works.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn issue(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        token: &str,
        ttl: Duration,
    ) -> Result<(), RepositoryError> {
        let expires_at: DateTime<Utc> = Utc::now() + ttl;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE account_tokens SET expires_at = now() \
             WHERE user_id = $1 AND purpose = $2 AND consumed_at IS NULL AND expires_at > now()",
        )
        .bind(user_id.as_i32())
        .bind(purpose.as_str())
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO account_tokens (user_id, purpose, token, expires_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(user_id.as_i32())
        .bind(purpose.as_str())
        .bind(token)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Consume a token, marking it used.
    ///
    /// Returns `true` if a live matching token existed. Expired or already
    /// consumed tokens return `false`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn consume(
        &self,
        user_id: UserId,
        purpose: TokenPurpose,
        token: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE account_tokens SET consumed_at = now() \
             WHERE user_id = $1 AND purpose = $2 AND token = $3 \
               AND consumed_at IS NULL AND expires_at > now()",
        )
        .bind(user_id.as_i32())
        .bind(purpose.as_str())
        .bind(token)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purpose_strings_are_stable() {
        assert_eq!(TokenPurpose::ConfirmEmail.as_str(), "confirm_email");
        assert_eq!(TokenPurpose::ResetPassword.as_str(), "reset_password");
    }
}
