//! Outbound email
//!
//! The only email the system sends today is the password-reset message.
//! Delivery sits behind the [`Mailer`] trait so the API can run with a
//! real SMTP relay in production and [`NullMailer`] everywhere else.

use async_trait::async_trait;
use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::info;

/// Error type for email delivery
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    /// Invalid sender or recipient address
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// Failed to build the message
    #[error("Failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// SMTP delivery failed
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Sends transactional email
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Delivers a password-reset link to a user
    async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError>;
}

/// SMTP configuration
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// From address, e.g. `LeadCRM <noreply@example.com>`
    pub from: String,
}

/// Production mailer backed by an async SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SmtpMailer {
    /// Builds a TLS transport from config
    ///
    /// # Errors
    ///
    /// Returns `EmailError::Transport` if the relay address is invalid.
    pub fn new(config: &SmtpConfig) -> Result<Self, EmailError> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .port(config.port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send_password_reset(
        &self,
        to_email: &str,
        to_name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        let body = format!(
            "Hi {to_name},\n\n\
             A password reset was requested for your account. Open the link\n\
             below within 30 minutes to choose a new password:\n\n\
             {reset_url}\n\n\
             If you did not request this, you can ignore this message."
        );

        let message = Message::builder()
            .from(self.from.parse()?)
            .to(format!("{} <{}>", to_name, to_email).parse()?)
            .subject("Reset your password")
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.transport.send(message).await?;
        info!(to = %to_email, "Password reset email sent");
        Ok(())
    }
}

/// No-op mailer for development and tests
///
/// Logs the reset URL instead of sending anything, which pairs with the
/// dev-token response mode.
#[derive(Debug, Default)]
pub struct NullMailer;

#[async_trait]
impl Mailer for NullMailer {
    async fn send_password_reset(
        &self,
        to_email: &str,
        _to_name: &str,
        reset_url: &str,
    ) -> Result<(), EmailError> {
        info!(to = %to_email, url = %reset_url, "Email delivery disabled, reset link logged");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_null_mailer_always_succeeds() {
        let mailer = NullMailer;
        let result = mailer
            .send_password_reset("a@b.com", "Ada", "https://example.com/reset?token=abc")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_mailer_as_trait_object() {
        let mailer: std::sync::Arc<dyn Mailer> = std::sync::Arc::new(NullMailer);
        assert!(mailer
            .send_password_reset("a@b.com", "Ada", "https://example.com/reset")
            .await
            .is_ok());
    }
}
