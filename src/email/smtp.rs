//! SMTP mailer using lettre.

use crate::error::{Result, TallywardError};
use crate::traits::{Email, Mailer};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::RwLock;

/// SMTP connection settings.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    /// SMTP server hostname.
    pub host: String,
    /// SMTP server port (default: 587 for STARTTLS).
    pub port: u16,
    /// Username for authentication.
    pub username: Option<String>,
    /// Password for authentication.
    pub password: Option<SecretString>,
    /// Default "from" address for messages that leave it empty.
    pub default_from: Option<String>,
    /// Use STARTTLS (default: true).
    pub starttls: bool,
}

impl SmtpConfig {
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: 587,
            username: None,
            password: None,
            default_from: None,
            starttls: true,
        }
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(SecretString::new(password.into()));
        self
    }

    #[must_use]
    pub fn from(mut self, address: impl Into<String>) -> Self {
        self.default_from = Some(address.into());
        self
    }

    /// Disable STARTTLS (plain connection or implicit TLS).
    #[must_use]
    pub fn no_starttls(mut self) -> Self {
        self.starttls = false;
        self
    }

    /// Load settings from `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`,
    /// `SMTP_PASSWORD`, `SMTP_FROM` and `SMTP_STARTTLS`. Only the host
    /// is required.
    pub fn from_env() -> Result<Self> {
        let host = std::env::var("SMTP_HOST")
            .map_err(|_| TallywardError::internal("SMTP_HOST environment variable not set"))?;

        let port = std::env::var("SMTP_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(587);

        let username = std::env::var("SMTP_USERNAME").ok();
        let password = std::env::var("SMTP_PASSWORD").ok().map(SecretString::new);
        let default_from = std::env::var("SMTP_FROM").ok();
        let starttls = std::env::var("SMTP_STARTTLS")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Ok(Self {
            host,
            port,
            username,
            password,
            default_from,
            starttls,
        })
    }
}

/// Mailer that delivers through an SMTP relay.
///
/// ```rust,ignore
/// use tallyward::email::{SmtpConfig, SmtpMailer};
/// use tallyward::traits::{Email, Mailer};
///
/// let config = SmtpConfig::new("smtp.exemplo.com.br")
///     .credentials("postmaster", "app-password")
///     .from("no-reply@tallyward.app");
/// let mailer = SmtpMailer::new(config)?;
///
/// let email = Email::new("", "ana@exemplo.com.br", "Bem-vinda")
///     .text("Sua conta está pronta.");
/// mailer.send(&email).await?;
/// ```
pub struct SmtpMailer {
    transport: Arc<RwLock<AsyncSmtpTransport<Tokio1Executor>>>,
    config: SmtpConfig,
}

impl SmtpMailer {
    pub fn new(config: SmtpConfig) -> Result<Self> {
        let mut builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host).map_err(|e| {
                TallywardError::internal(format!("Failed to create SMTP transport: {e}"))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host).map_err(|e| {
                TallywardError::internal(format!("Failed to create SMTP transport: {e}"))
            })?
        };

        builder = builder.port(config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let credentials = Credentials::new(username.clone(), password.expose_secret().clone());
            builder = builder.credentials(credentials);
        }

        let transport = builder.build();

        Ok(Self {
            transport: Arc::new(RwLock::new(transport)),
            config,
        })
    }

    pub fn from_env() -> Result<Self> {
        let config = SmtpConfig::from_env()?;
        Self::new(config)
    }

    fn build_message(&self, email: &Email) -> Result<Message> {
        let from_str = if email.from.is_empty() {
            self.config.default_from.as_ref().ok_or_else(|| {
                TallywardError::bad_request("No 'from' address specified and no default configured")
            })?
        } else {
            &email.from
        };

        let from: Mailbox = from_str
            .parse()
            .map_err(|e| TallywardError::bad_request(format!("Invalid 'from' address: {e}")))?;

        let mut builder = Message::builder().from(from).subject(&email.subject);

        for to in &email.to {
            let mailbox: Mailbox = to.parse().map_err(|e| {
                TallywardError::bad_request(format!("Invalid 'to' address '{to}': {e}"))
            })?;
            builder = builder.to(mailbox);
        }

        let message = match (&email.text, &email.html) {
            (Some(text), Some(html)) => builder
                .multipart(
                    MultiPart::alternative()
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_PLAIN)
                                .body(text.clone()),
                        )
                        .singlepart(
                            SinglePart::builder()
                                .header(ContentType::TEXT_HTML)
                                .body(html.clone()),
                        ),
                )
                .map_err(|e| TallywardError::internal(format!("Failed to build email: {e}")))?,
            (Some(text), None) => builder
                .header(ContentType::TEXT_PLAIN)
                .body(text.clone())
                .map_err(|e| TallywardError::internal(format!("Failed to build email: {e}")))?,
            (None, Some(html)) => builder
                .header(ContentType::TEXT_HTML)
                .body(html.clone())
                .map_err(|e| TallywardError::internal(format!("Failed to build email: {e}")))?,
            (None, None) => {
                return Err(TallywardError::bad_request(
                    "Email must have either text or HTML body",
                ));
            }
        };

        Ok(message)
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        // Fill in the configured sender first so messages may leave
        // `from` empty.
        let mut email = email.clone();
        if email.from.is_empty() {
            if let Some(default) = &self.config.default_from {
                email.from = default.clone();
            }
        }
        email.validate()?;

        let message = self.build_message(&email)?;

        let transport = self.transport.read().await;
        transport
            .send(message)
            .await
            .map_err(|e| TallywardError::internal(format!("Failed to send email: {e}")))?;

        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

// AsyncSmtpTransport does not implement Debug.
impl std::fmt::Debug for SmtpMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpMailer")
            .field("host", &self.config.host)
            .field("port", &self.config.port)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder_defaults() {
        let config = SmtpConfig::new("smtp.exemplo.com.br");
        assert_eq!(config.port, 587);
        assert!(config.starttls);
        assert!(config.username.is_none());
    }

    #[tokio::test]
    async fn test_message_uses_default_from_when_empty() {
        let config = SmtpConfig::new("smtp.exemplo.com.br").from("no-reply@tallyward.app");
        let mailer = SmtpMailer::new(config).unwrap();

        let email = Email::new("", "ana@exemplo.com.br", "Assunto").text("corpo");
        assert!(mailer.build_message(&email).is_ok());

        let without_default = SmtpMailer::new(SmtpConfig::new("smtp.exemplo.com.br")).unwrap();
        assert!(without_default.build_message(&email).is_err());
    }

    #[tokio::test]
    async fn test_message_rejects_unparseable_recipient() {
        let mailer = SmtpMailer::new(SmtpConfig::new("smtp.exemplo.com.br")).unwrap();
        let email = Email::new("no-reply@tallyward.app", "not an address", "Assunto").text("corpo");

        assert!(mailer.build_message(&email).is_err());
    }
}
