//! Account route handlers.
//!
//! Handles login, registration, logout, email confirmation, and password
//! reset. Forgot-password deliberately responds identically whether or not
//! the email matches an account, so the form can't be used to enumerate
//! registered addresses. Email delivery failures are logged but never
//! surfaced to the visitor.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;

use melodex_core::UserId;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{OptionalAuth, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::models::user::User;
use crate::services::auth::{AuthError, AuthService};
use crate::state::AppState;

/// Message shown for any failed login attempt.
const LOGIN_FAILED_MESSAGE: &str = "Username or Password not found";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub return_url: Option<String>,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    pub email: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub code: String,
}

// =============================================================================
// Query Types
// =============================================================================

/// Query parameters for the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub return_url: Option<String>,
}

/// Query parameters for the email confirmation callback.
#[derive(Debug, Deserialize)]
pub struct ConfirmEmailQuery {
    pub user_id: Option<i32>,
    pub code: Option<String>,
}

/// Query parameters for the reset password page.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordQuery {
    pub code: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/login.html")]
pub struct LoginTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub return_url: Option<String>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/register.html")]
pub struct RegisterTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
}

/// Email confirmed page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/confirm_email.html")]
pub struct ConfirmEmailTemplate {
    pub current_user: Option<CurrentUser>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
}

/// "Check your email" page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/forgot_password_confirmation.html")]
pub struct ForgotPasswordConfirmationTemplate {
    pub current_user: Option<CurrentUser>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub current_user: Option<CurrentUser>,
    pub error: Option<String>,
    pub code: String,
}

/// Reset done page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/reset_password_confirmation.html")]
pub struct ResetPasswordConfirmationTemplate {
    pub current_user: Option<CurrentUser>,
}

/// Access denied page template.
#[derive(Template, WebTemplate)]
#[template(path = "account/access_denied.html")]
pub struct AccessDeniedTemplate {
    pub current_user: Option<CurrentUser>,
}

// =============================================================================
// Login / Logout
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    LoginTemplate {
        current_user,
        error: None,
        return_url: query.return_url,
    }
}

/// Handle login form submission.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    match auth.login(&form.username, &form.password).await {
        Ok(user) => {
            sign_in(&session, &user).await?;
            Ok(Redirect::to(safe_return_url(form.return_url.as_deref())).into_response())
        }
        Err(AuthError::InvalidCredentials) => Ok(LoginTemplate {
            current_user: None,
            error: Some(LOGIN_FAILED_MESSAGE.to_owned()),
            return_url: form.return_url,
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Handle logout form submission.
///
/// Flushes the whole session, so the cart ID goes with the login.
pub async fn logout(session: Session) -> Result<Response> {
    clear_current_user(&session).await?;
    session.flush().await?;
    clear_sentry_user();

    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Registration
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalAuth(current_user): OptionalAuth) -> impl IntoResponse {
    RegisterTemplate {
        current_user,
        error: None,
    }
}

/// Handle registration form submission.
///
/// On success the new user is signed in immediately and a confirmation link
/// is emailed to them.
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Result<Response> {
    if form.password != form.password_confirm {
        return Ok(RegisterTemplate {
            current_user: None,
            error: Some("The password and confirmation password do not match".to_owned()),
        }
        .into_response());
    }

    let auth = AuthService::new(state.pool());

    let user = match auth
        .register(&form.username, &form.email, &form.password)
        .await
    {
        Ok(user) => user,
        Err(
            e @ (AuthError::UserAlreadyExists
            | AuthError::InvalidEmail(_)
            | AuthError::InvalidUsername(_)
            | AuthError::WeakPassword(_)),
        ) => {
            return Ok(RegisterTemplate {
                current_user: None,
                error: Some(register_error_message(&e)),
            }
            .into_response());
        }
        Err(e) => return Err(e.into()),
    };

    // Email a confirmation link. Delivery problems must not block the
    // registration itself.
    match auth.issue_confirmation_token(user.id).await {
        Ok(token) => {
            let callback_url = confirm_email_url(state.config().base_url.as_str(), user.id, &token);
            if let Err(e) = state
                .mailer()
                .send_confirmation(user.email.as_str(), &user.username, &callback_url)
                .await
            {
                tracing::error!(error = %e, user_id = %user.id, "Failed to send confirmation email");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, user_id = %user.id, "Failed to issue confirmation token");
        }
    }

    sign_in(&session, &user).await?;

    Ok(Redirect::to("/").into_response())
}

// =============================================================================
// Email Confirmation
// =============================================================================

/// Handle the emailed confirmation link.
pub async fn confirm_email(
    State(state): State<AppState>,
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<ConfirmEmailQuery>,
) -> Result<Response> {
    // A link with either part missing is treated as a stray visit.
    let (Some(user_id), Some(code)) = (query.user_id, query.code) else {
        return Ok(Redirect::to("/").into_response());
    };

    let auth = AuthService::new(state.pool());

    match auth.confirm_email(UserId::new(user_id), &code).await {
        Ok(()) => Ok(ConfirmEmailTemplate { current_user }.into_response()),
        Err(AuthError::UserNotFound) => {
            Err(AppError::NotFound(format!("user {user_id}")))
        }
        Err(AuthError::InvalidToken) => {
            Err(AppError::Internal("email confirmation failed".to_owned()))
        }
        Err(e) => Err(e.into()),
    }
}

// =============================================================================
// Password Reset
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(OptionalAuth(current_user): OptionalAuth) -> impl IntoResponse {
    ForgotPasswordTemplate {
        current_user,
        error: None,
    }
}

/// Handle the forgot password form.
///
/// Always redirects to the confirmation page, whether or not the address
/// matched a confirmed account.
pub async fn forgot_password(
    State(state): State<AppState>,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.pool());

    let user = match auth.find_by_email(&form.email).await {
        Ok(user) => user,
        Err(AuthError::InvalidEmail(_)) => None,
        Err(e) => return Err(e.into()),
    };

    if let Some(user) = user.filter(|u| u.email_confirmed) {
        match auth.issue_reset_token(user.id).await {
            Ok(token) => {
                let callback_url = reset_password_url(state.config().base_url.as_str(), &token);
                if let Err(e) = state
                    .mailer()
                    .send_password_reset(user.email.as_str(), &callback_url)
                    .await
                {
                    tracing::error!(error = %e, user_id = %user.id, "Failed to send reset email");
                }
            }
            Err(e) => {
                tracing::error!(error = %e, user_id = %user.id, "Failed to issue reset token");
            }
        }
    }

    Ok(Redirect::to("/account/forgot-password-confirmation").into_response())
}

/// Display the "check your email" page.
pub async fn forgot_password_confirmation(
    OptionalAuth(current_user): OptionalAuth,
) -> impl IntoResponse {
    ForgotPasswordConfirmationTemplate { current_user }
}

/// Display the reset password form from an emailed link.
pub async fn reset_password_page(
    OptionalAuth(current_user): OptionalAuth,
    Query(query): Query<ResetPasswordQuery>,
) -> Result<Response> {
    // A reset form without a code can never succeed.
    let Some(code) = query.code else {
        return Err(AppError::BadRequest("a reset code is required".to_owned()));
    };

    Ok(ResetPasswordTemplate {
        current_user,
        error: None,
        code,
    }
    .into_response())
}

/// Handle the reset password form.
pub async fn reset_password(
    State(state): State<AppState>,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    if form.password != form.password_confirm {
        return Ok(ResetPasswordTemplate {
            current_user: None,
            error: Some("The password and confirmation password do not match".to_owned()),
            code: form.code,
        }
        .into_response());
    }

    let auth = AuthService::new(state.pool());

    match auth
        .reset_password(&form.email, &form.code, &form.password)
        .await
    {
        // An unknown email gets the same outcome as a successful reset.
        Ok(()) | Err(AuthError::UserNotFound | AuthError::InvalidEmail(_)) => {
            Ok(Redirect::to("/account/reset-password-confirmation").into_response())
        }
        Err(AuthError::InvalidToken) => Ok(ResetPasswordTemplate {
            current_user: None,
            error: Some("Invalid or expired reset link".to_owned()),
            code: form.code,
        }
        .into_response()),
        Err(AuthError::WeakPassword(msg)) => Ok(ResetPasswordTemplate {
            current_user: None,
            error: Some(msg),
            code: form.code,
        }
        .into_response()),
        Err(e) => Err(e.into()),
    }
}

/// Display the reset done page.
pub async fn reset_password_confirmation(
    OptionalAuth(current_user): OptionalAuth,
) -> impl IntoResponse {
    ResetPasswordConfirmationTemplate { current_user }
}

/// Display the access denied page.
pub async fn access_denied(OptionalAuth(current_user): OptionalAuth) -> impl IntoResponse {
    AccessDeniedTemplate { current_user }
}

// =============================================================================
// Helpers
// =============================================================================

/// Store the user in the session and tag Sentry events with them.
async fn sign_in(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
    };
    set_current_user(session, &current).await?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok(())
}

/// Form-friendly message for a rejected registration.
fn register_error_message(error: &AuthError) -> String {
    match error {
        AuthError::UserAlreadyExists => {
            "An account with this name or email already exists".to_owned()
        }
        AuthError::InvalidEmail(_) => "Please enter a valid email address".to_owned(),
        AuthError::InvalidUsername(msg) | AuthError::WeakPassword(msg) => msg.clone(),
        _ => "Registration failed".to_owned(),
    }
}

/// Only follow same-site return URLs; anything else goes home.
fn safe_return_url(return_url: Option<&str>) -> &str {
    match return_url {
        Some(url) if url.starts_with('/') && !url.starts_with("//") => url,
        _ => "/",
    }
}

/// Build the emailed confirmation callback URL.
fn confirm_email_url(base_url: &str, user_id: UserId, token: &str) -> String {
    format!(
        "{}/account/confirm-email?user_id={}&code={}",
        base_url.trim_end_matches('/'),
        user_id,
        urlencoding::encode(token)
    )
}

/// Build the emailed password reset callback URL.
fn reset_password_url(base_url: &str, token: &str) -> String {
    format!(
        "{}/account/reset-password?code={}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(token)
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use melodex_core::Email;
    use tower_sessions::MemoryStore;
    use uuid::Uuid;

    use crate::models::session_keys;

    use super::*;

    fn sample_user() -> CurrentUser {
        CurrentUser {
            id: UserId::new(5),
            username: "scott".to_owned(),
            email: Email::parse("scott@example.com").unwrap(),
        }
    }

    #[test]
    fn test_nav_shows_logout_for_signed_in_user() {
        let page = LoginTemplate {
            current_user: Some(sample_user()),
            error: None,
            return_url: None,
        }
        .render()
        .unwrap();

        assert!(page.contains("/account/logout"));
        assert!(page.contains("scott"));
        assert!(!page.contains(r#"<a href="/account/login">"#));
    }

    #[test]
    fn test_nav_shows_login_link_for_visitor() {
        let page = LoginTemplate {
            current_user: None,
            error: None,
            return_url: None,
        }
        .render()
        .unwrap();

        assert!(page.contains(r#"<a href="/account/login">"#));
        assert!(!page.contains("/account/logout"));
    }

    #[tokio::test]
    async fn test_logout_discards_user_and_cart() {
        let store = Arc::new(MemoryStore::default());
        let session = Session::new(None, store, None);

        set_current_user(&session, &sample_user()).await.unwrap();
        session
            .insert(session_keys::CART_ID, Uuid::new_v4())
            .await
            .unwrap();

        logout(session.clone()).await.unwrap();

        let user: Option<CurrentUser> =
            session.get(session_keys::CURRENT_USER).await.unwrap();
        assert!(user.is_none());

        let cart: Option<Uuid> = session.get(session_keys::CART_ID).await.unwrap();
        assert!(cart.is_none());
    }

    #[test]
    fn test_safe_return_url() {
        assert_eq!(safe_return_url(Some("/checkout")), "/checkout");
        assert_eq!(safe_return_url(Some("//evil.example.com")), "/");
        assert_eq!(safe_return_url(Some("https://evil.example.com")), "/");
        assert_eq!(safe_return_url(None), "/");
    }

    #[test]
    fn test_callback_urls() {
        let confirm = confirm_email_url("https://store.example.com/", UserId::new(7), "tok en");
        assert_eq!(
            confirm,
            "https://store.example.com/account/confirm-email?user_id=7&code=tok%20en"
        );

        let reset = reset_password_url("https://store.example.com", "abc123");
        assert_eq!(
            reset,
            "https://store.example.com/account/reset-password?code=abc123"
        );
    }
}
