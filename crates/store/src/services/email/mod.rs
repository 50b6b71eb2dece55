//! Transactional email delivery.
//!
//! Three interchangeable mailers sit behind the [`Mailer`] enum, selected by
//! `EMAIL_PROVIDER`: SMTP via lettre, the `SendGrid` HTTP API via reqwest, and
//! a log-only mailer for development. Message bodies are rendered from Askama
//! templates with both plain text and HTML parts.

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::{EmailConfig, EmailProvider, SmtpConfig};

/// `SendGrid` v3 send endpoint.
const SENDGRID_SEND_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// HTML template for the account confirmation email.
#[derive(Template)]
#[template(path = "email/confirm_account.html")]
struct ConfirmAccountHtml<'a> {
    username: &'a str,
    callback_url: &'a str,
}

/// Plain text template for the account confirmation email.
#[derive(Template)]
#[template(path = "email/confirm_account.txt")]
struct ConfirmAccountText<'a> {
    username: &'a str,
    callback_url: &'a str,
}

/// HTML template for the password reset email.
#[derive(Template)]
#[template(path = "email/reset_password.html")]
struct ResetPasswordHtml<'a> {
    callback_url: &'a str,
}

/// Plain text template for the password reset email.
#[derive(Template)]
#[template(path = "email/reset_password.txt")]
struct ResetPasswordText<'a> {
    callback_url: &'a str,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Provider selected without its required configuration.
    #[error("Missing configuration: {0}")]
    MissingConfig(&'static str),
}

/// A rendered email ready for any transport.
#[derive(Debug)]
struct Outgoing<'a> {
    to: &'a str,
    subject: &'a str,
    text: String,
    html: String,
}

/// Email delivery backend, selected by configuration.
#[derive(Clone)]
pub enum Mailer {
    /// SMTP relay via lettre.
    Smtp(SmtpMailer),
    /// `SendGrid` HTTP API.
    Sendgrid(SendgridMailer),
    /// Logs messages instead of sending them. For development.
    Log(LogMailer),
}

impl Mailer {
    /// Build the mailer named by the configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::MissingConfig` if the selected provider's
    /// settings are absent, or `EmailError::Smtp` if the SMTP relay cannot
    /// be constructed.
    pub fn from_config(config: &EmailConfig) -> Result<Self, EmailError> {
        match config.provider {
            EmailProvider::Smtp => {
                let smtp = config
                    .smtp
                    .as_ref()
                    .ok_or(EmailError::MissingConfig("SMTP_HOST"))?;
                Ok(Self::Smtp(SmtpMailer::new(smtp, &config.from_address)?))
            }
            EmailProvider::Sendgrid => {
                let api_key = config
                    .sendgrid_api_key
                    .as_ref()
                    .ok_or(EmailError::MissingConfig("SENDGRID_API_KEY"))?;
                Ok(Self::Sendgrid(SendgridMailer::new(
                    api_key.expose_secret(),
                    &config.from_address,
                )?))
            }
            EmailProvider::Log => Ok(Self::Log(LogMailer)),
        }
    }

    /// Send the account confirmation email.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or delivery fails.
    pub async fn send_confirmation(
        &self,
        to: &str,
        username: &str,
        callback_url: &str,
    ) -> Result<(), EmailError> {
        let html = ConfirmAccountHtml {
            username,
            callback_url,
        }
        .render()?;
        let text = ConfirmAccountText {
            username,
            callback_url,
        }
        .render()?;

        self.send(&Outgoing {
            to,
            subject: "Confirm your Melodex account",
            text,
            html,
        })
        .await
    }

    /// Send the password reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or delivery fails.
    pub async fn send_password_reset(
        &self,
        to: &str,
        callback_url: &str,
    ) -> Result<(), EmailError> {
        let html = ResetPasswordHtml { callback_url }.render()?;
        let text = ResetPasswordText { callback_url }.render()?;

        self.send(&Outgoing {
            to,
            subject: "Reset your Melodex password",
            text,
            html,
        })
        .await
    }

    async fn send(&self, message: &Outgoing<'_>) -> Result<(), EmailError> {
        match self {
            Self::Smtp(mailer) => mailer.send(message).await,
            Self::Sendgrid(mailer) => mailer.send(message).await,
            Self::Log(mailer) => {
                mailer.send(message);
                Ok(())
            }
        }
    }
}

// =============================================================================
// SMTP
// =============================================================================

/// SMTP mailer using lettre with STARTTLS.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpMailer {
    /// Create a new SMTP mailer from configuration.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Smtp` if the relay cannot be constructed.
    pub fn new(config: &SmtpConfig, from_address: &str) -> Result<Self, EmailError> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            transport,
            from_address: from_address.to_owned(),
        })
    }

    async fn send(&self, message: &Outgoing<'_>) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(message
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(message.to.to_owned()))?)
            .subject(message.subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(message.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(message.html.clone()),
                    ),
            )?;

        self.transport.send(email).await?;

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent successfully");
        Ok(())
    }
}

// =============================================================================
// SendGrid
// =============================================================================

/// Mailer using the `SendGrid` v3 HTTP API.
#[derive(Clone)]
pub struct SendgridMailer {
    client: reqwest::Client,
    from_address: String,
}

impl SendgridMailer {
    /// Create a new `SendGrid` mailer.
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Http` if the HTTP client fails to build.
    pub fn new(api_key: &str, from_address: &str) -> Result<Self, EmailError> {
        let mut headers = HeaderMap::new();

        let auth_value = format!("Bearer {api_key}");
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&auth_value)
                .map_err(|_| EmailError::MissingConfig("SENDGRID_API_KEY"))?,
        );
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            from_address: from_address.to_owned(),
        })
    }

    async fn send(&self, message: &Outgoing<'_>) -> Result<(), EmailError> {
        let body = sendgrid_payload(
            &self.from_address,
            message.to,
            message.subject,
            &message.text,
            &message.html,
        );

        let response = self.client.post(SENDGRID_SEND_URL).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmailError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(to = %message.to, subject = %message.subject, "Email sent successfully");
        Ok(())
    }
}

/// Build the `SendGrid` v3 `mail/send` request body.
fn sendgrid_payload(
    from: &str,
    to: &str,
    subject: &str,
    text: &str,
    html: &str,
) -> serde_json::Value {
    serde_json::json!({
        "personalizations": [{ "to": [{ "email": to }] }],
        "from": { "email": from },
        "subject": subject,
        "content": [
            { "type": "text/plain", "value": text },
            { "type": "text/html", "value": html },
        ],
    })
}

// =============================================================================
// Log
// =============================================================================

/// Development mailer that logs messages instead of delivering them.
#[derive(Clone, Copy)]
pub struct LogMailer;

impl LogMailer {
    fn send(self, message: &Outgoing<'_>) {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.text,
            "Email (log provider, not delivered)"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sendgrid_payload_shape() {
        let body = sendgrid_payload(
            "store@example.com",
            "scott@example.com",
            "Hello",
            "plain",
            "<p>html</p>",
        );

        assert_eq!(body["from"]["email"], "store@example.com");
        assert_eq!(
            body["personalizations"][0]["to"][0]["email"],
            "scott@example.com"
        );
        assert_eq!(body["subject"], "Hello");
        assert_eq!(body["content"][0]["type"], "text/plain");
        assert_eq!(body["content"][1]["type"], "text/html");
    }

    #[test]
    fn test_confirmation_templates_render() {
        let html = ConfirmAccountHtml {
            username: "scott",
            callback_url: "https://store.example.com/account/confirm-email?user_id=1&code=abc",
        }
        .render()
        .expect("html renders");
        assert!(html.contains("scott"));
        assert!(html.contains("confirm-email"));

        let text = ConfirmAccountText {
            username: "scott",
            callback_url: "https://store.example.com/account/confirm-email?user_id=1&code=abc",
        }
        .render()
        .expect("text renders");
        assert!(text.contains("confirm-email"));
    }

    #[test]
    fn test_reset_templates_render() {
        let url = "https://store.example.com/account/reset-password?code=abc";
        let html = ResetPasswordHtml { callback_url: url }.render().expect("html renders");
        assert!(html.contains("reset-password"));

        let text = ResetPasswordText { callback_url: url }.render().expect("text renders");
        assert!(text.contains("reset-password"));
    }
}
