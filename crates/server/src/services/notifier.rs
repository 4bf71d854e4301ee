//! OTP delivery over email.
//!
//! Uses SMTP via lettre with Askama plain-text and HTML templates. Delivery is
//! attempted once; failures are reported to the caller, never retried.

use askama::Template;
use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use slot_booking_core::{Email, OtpCode};

use crate::config::EmailConfig;

/// Subject line of the OTP message.
pub const OTP_SUBJECT: &str = "Your OTP Code";

#[derive(Template)]
#[template(path = "email/otp_code.html")]
struct OtpCodeEmailHtml {
    code: OtpCode,
}

#[derive(Template)]
#[template(path = "email/otp_code.txt")]
struct OtpCodeEmailText {
    code: OtpCode,
}

/// Errors that can occur when sending a code.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// SMTP transport error (connection, auth, timeout, rejection).
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Sender or recipient address rejected by the message builder.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Sends OTP codes to users.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `code` to `to`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError` when the message could not be handed to the transport.
    async fn send_otp(&self, to: &Email, code: OtpCode) -> Result<(), NotifyError>;
}

/// Render the plain-text and HTML bodies for `code`.
///
/// # Errors
///
/// Returns `NotifyError::Template` if rendering fails.
pub fn render_otp_bodies(code: OtpCode) -> Result<(String, String), NotifyError> {
    let text = OtpCodeEmailText { code }.render()?;
    let html = OtpCodeEmailHtml { code }.render()?;
    Ok((text, html))
}

/// SMTP-backed notifier.
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl SmtpNotifier {
    /// Create a notifier from configuration.
    ///
    /// No connection is made until the first send.
    ///
    /// # Errors
    ///
    /// Returns error if the relay hostname cannot be used for TLS.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(config.timeout))
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    fn build_message(&self, to: &Email, code: OtpCode) -> Result<Message, NotifyError> {
        let (text_body, html_body) = render_otp_bodies(code)?;

        let message = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| NotifyError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .as_str()
                .parse()
                .map_err(|_| NotifyError::InvalidAddress(to.to_string()))?)
            .subject(OTP_SUBJECT)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body),
                    ),
            )?;

        Ok(message)
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_otp(&self, to: &Email, code: OtpCode) -> Result<(), NotifyError> {
        let message = self.build_message(to, code)?;
        self.mailer.send(message).await?;

        tracing::info!(to = %to, "OTP email sent");
        Ok(())
    }
}
