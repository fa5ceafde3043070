//! Transactional email: message templates and the senders that deliver them.
//!
//! With `smtp_host` configured mail goes out over SMTP (STARTTLS); otherwise
//! the logging sender records the envelope and drops the body.

use async_trait::async_trait;
use lettre::{
    message::MultiPart,
    transport::smtp::{authentication::Credentials, Error as SmtpError},
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::AppConfig;

const BRAND: &str = "Storefront";
const SUPPORT_ADDRESS: &str = "support@storefront.local";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// A rendered message ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError>;
}

/// Sender used when no SMTP relay is configured.
#[derive(Debug, Default, Clone)]
pub struct LoggingEmailSender;

#[async_trait]
impl EmailSender for LoggingEmailSender {
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        info!(to = %email.to, subject = %email.subject, "Email delivery skipped, no SMTP relay configured");
        Ok(())
    }
}

#[derive(Clone)]
pub struct SmtpEmailSender {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpEmailSender {
    /// Builds a STARTTLS transport; credentials are optional.
    pub fn new(
        host: &str,
        port: Option<u16>,
        username: Option<&str>,
        password: Option<&str>,
        from_address: impl Into<String>,
    ) -> Result<Self, SmtpError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)?;
        if let Some(port) = port {
            builder = builder.port(port);
        }
        if let (Some(username), Some(password)) = (username, password) {
            builder = builder.credentials(Credentials::new(username.to_string(), password.to_string()));
        }

        Ok(Self {
            mailer: builder.build(),
            from_address: from_address.into(),
        })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    #[instrument(skip(self, email), fields(to = %email.to))]
    async fn send(&self, email: OutgoingEmail) -> Result<(), EmailError> {
        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(email.to.clone()))?)
            .subject(email.subject)
            .multipart(MultiPart::alternative_plain_html(
                email.text_body,
                email.html_body,
            ))?;

        self.mailer.send(message).await?;
        info!("Email sent");
        Ok(())
    }
}

/// Picks the SMTP sender when a relay is configured, the logging one otherwise.
pub fn create_email_sender(config: &AppConfig) -> Result<Arc<dyn EmailSender>, EmailError> {
    match config.smtp_host.as_deref() {
        Some(host) if !host.trim().is_empty() => {
            let sender = SmtpEmailSender::new(
                host,
                config.smtp_port,
                config.smtp_username.as_deref(),
                config.smtp_password.as_deref(),
                config.email_from.clone(),
            )?;
            Ok(Arc::new(sender))
        }
        _ => Ok(Arc::new(LoggingEmailSender)),
    }
}

/// Sent after signup, unless the account only has a placeholder address.
pub fn welcome_email(to: &str, first_name: &str, phone: &str) -> OutgoingEmail {
    let subject = format!("Welcome to {}!", BRAND);
    let text_body = format!(
        "Hi {first_name},\n\n\
         Congratulations! Your account has been successfully created on {BRAND}.\n\n\
         Phone: +91 {phone}\nEmail: {to}\n\n\
         Need help? Contact us at {SUPPORT_ADDRESS}.\n"
    );
    let html_body = format!(
        "<p>Hi <strong>{first_name}</strong>,</p>\
         <p>Congratulations! Your account has been successfully created on {BRAND}.</p>\
         <ul><li><strong>Phone:</strong> +91 {phone}</li><li><strong>Email:</strong> {to}</li></ul>\
         <p>Need help? Contact us at {SUPPORT_ADDRESS}.</p>"
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text_body,
        html_body,
    }
}

pub fn password_reset_otp_email(
    to: &str,
    user_name: &str,
    otp: &str,
    expiry_minutes: u64,
) -> OutgoingEmail {
    let subject = format!("{} - Password Reset Request", BRAND);
    let text_body = format!(
        "Hi {user_name},\n\n\
         We received a request to reset your password. Use this OTP to continue: {otp}\n\n\
         The OTP expires in {expiry_minutes} minutes. If you did not request a reset, \
         ignore this email or contact {SUPPORT_ADDRESS}.\n"
    );
    let html_body = format!(
        "<p>Hi <strong>{user_name}</strong>,</p>\
         <p>We received a request to reset your password. Use the OTP below to continue:</p>\
         <p style=\"font-size:32px;letter-spacing:10px;font-weight:bold\">{otp}</p>\
         <p><strong>Important:</strong> This OTP will expire in {expiry_minutes} minutes.</p>\
         <p>If you did not request a reset, ignore this email or contact {SUPPORT_ADDRESS}.</p>"
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text_body,
        html_body,
    }
}

pub fn password_reset_success_email(to: &str, user_name: &str) -> OutgoingEmail {
    let subject = format!("{} - Password Reset Successful", BRAND);
    let text_body = format!(
        "Hi {user_name},\n\n\
         Your password has been successfully reset. If you did not make this change, \
         contact {SUPPORT_ADDRESS} immediately.\n"
    );
    let html_body = format!(
        "<p>Hi <strong>{user_name}</strong>,</p>\
         <p>Your password has been successfully reset.</p>\
         <p>If you did not make this change, contact {SUPPORT_ADDRESS} immediately.</p>"
    );

    OutgoingEmail {
        to: to.to_string(),
        subject,
        text_body,
        html_body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_otp_email_carries_code_and_expiry() {
        let email = password_reset_otp_email("asha@example.com", "Asha Rao", "482913", 15);
        assert_eq!(email.to, "asha@example.com");
        assert_eq!(email.subject, "Storefront - Password Reset Request");
        assert!(email.text_body.contains("482913"));
        assert!(email.html_body.contains("15 minutes"));
    }

    #[test]
    fn welcome_email_greets_by_first_name() {
        let email = welcome_email("asha@example.com", "Asha", "9876543210");
        assert!(email.text_body.starts_with("Hi Asha,"));
        assert!(email.html_body.contains("+91 9876543210"));
    }

    #[tokio::test]
    async fn logging_sender_accepts_everything() {
        let sender = LoggingEmailSender;
        let result = sender
            .send(password_reset_success_email("asha@example.com", "Asha"))
            .await;
        assert!(result.is_ok());
    }

    #[test]
    fn without_smtp_host_the_logging_sender_is_used() {
        let config = AppConfig::new(
            "sqlite::memory:".to_string(),
            None,
            crate::config::DEV_DEFAULT_JWT_SECRET.to_string(),
            3600,
            604800,
            "127.0.0.1".to_string(),
            8080,
            "development".to_string(),
        );
        assert!(create_email_sender(&config).is_ok());
    }
}
