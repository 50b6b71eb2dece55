//! Authentication service.
//!
//! Handles registration, login, email confirmation, and password reset.
//! Confirmation and reset links carry opaque single-use tokens stored in
//! `account_tokens`; the service generates them and checks them off.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::Duration;
use rand::Rng;
use rand::distr::Alphanumeric;
use sqlx::PgPool;

use melodex_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::tokens::{TokenPurpose, TokenRepository};
use crate::db::users::UserRepository;
use crate::models::user::User;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Length of confirmation and reset tokens.
const TOKEN_LENGTH: usize = 48;

/// How long an email confirmation link stays valid.
const CONFIRMATION_TTL_DAYS: i64 = 3;

/// How long a password reset link stays valid.
const RESET_TTL_HOURS: i64 = 2;

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
        }
    }

    // =========================================================================
    // Registration and Login
    // =========================================================================

    /// Register a new user with username, email, and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_username(username)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(username, &email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username or password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let (user, password_hash) = self
            .users
            .get_password_hash(username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Get a user by their registered email, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address doesn't parse.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let email = Email::parse(email)?;
        Ok(self.users.get_by_email(&email).await?)
    }

    // =========================================================================
    // Email Confirmation
    // =========================================================================

    /// Issue a fresh email confirmation token for a user.
    ///
    /// Earlier confirmation tokens stop working.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn issue_confirmation_token(&self, user_id: UserId) -> Result<String, AuthError> {
        let token = generate_token();
        self.tokens
            .issue(
                user_id,
                TokenPurpose::ConfirmEmail,
                &token,
                Duration::days(CONFIRMATION_TTL_DAYS),
            )
            .await?;

        Ok(token)
    }

    /// Confirm a user's email address from an emailed link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    /// Returns `AuthError::InvalidToken` if the token is wrong, expired, or used.
    pub async fn confirm_email(&self, user_id: UserId, token: &str) -> Result<(), AuthError> {
        // Distinguish unknown users from bad tokens; the account routes map
        // them to different responses.
        let user = self.get_user(user_id).await?;

        let consumed = self
            .tokens
            .consume(user.id, TokenPurpose::ConfirmEmail, token)
            .await?;
        if !consumed {
            return Err(AuthError::InvalidToken);
        }

        self.users.confirm_email(user.id).await?;

        Ok(())
    }

    // =========================================================================
    // Password Reset
    // =========================================================================

    /// Issue a password reset token for a user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn issue_reset_token(&self, user_id: UserId) -> Result<String, AuthError> {
        let token = generate_token();
        self.tokens
            .issue(
                user_id,
                TokenPurpose::ResetPassword,
                &token,
                Duration::hours(RESET_TTL_HOURS),
            )
            .await?;

        Ok(token)
    }

    /// Reset a user's password from an emailed link.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the address doesn't parse.
    /// Returns `AuthError::UserNotFound` if no account matches the email.
    /// Returns `AuthError::WeakPassword` if the new password is too short.
    /// Returns `AuthError::InvalidToken` if the token is wrong, expired, or used.
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        validate_password(new_password)?;

        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let consumed = self
            .tokens
            .consume(user.id, TokenPurpose::ResetPassword, token)
            .await?;
        if !consumed {
            return Err(AuthError::InvalidToken);
        }

        let password_hash = hash_password(new_password)?;
        self.users.set_password_hash(user.id, &password_hash).await?;

        Ok(())
    }
}

/// Validate a login name.
fn validate_username(username: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::InvalidUsername("username is required".to_owned()));
    }
    if username.len() > 256 {
        return Err(AuthError::InvalidUsername(
            "username must be at most 256 characters".to_owned(),
        ));
    }
    Ok(())
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate an opaque URL-safe token for confirmation and reset links.
fn generate_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_rejects_short() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("1234567").is_err());
    }

    #[test]
    fn test_validate_password_accepts_min_length() {
        assert!(validate_password("12345678").is_ok());
        assert!(validate_password("a much longer passphrase").is_ok());
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("scott").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
    }

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").expect("hash");
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(verify_password("wrong password", &hash).is_err());
    }

    #[test]
    fn test_generate_token_charset_and_length() {
        let token = generate_token();
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));

        // Tokens should not repeat
        assert_ne!(generate_token(), generate_token());
    }
}
