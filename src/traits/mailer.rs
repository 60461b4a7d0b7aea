//! Mailer trait for sending emails.
//!
//! Abstracts the delivery backend so callers compose messages without
//! knowing whether they end up on an SMTP relay or the development
//! console.

use crate::error::Result;
use async_trait::async_trait;

/// An email message to be sent.
#[derive(Debug, Clone)]
pub struct Email {
    /// Sender address.
    pub from: String,
    /// Recipient addresses.
    pub to: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain text body (optional if html is provided).
    pub text: Option<String>,
    /// HTML body (optional if text is provided).
    pub html: Option<String>,
}

impl Email {
    /// Create a new email with the required fields.
    pub fn new(from: impl Into<String>, to: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: vec![to.into()],
            subject: subject.into(),
            text: None,
            html: None,
        }
    }

    /// Add a recipient.
    #[must_use]
    pub fn to(mut self, recipient: impl Into<String>) -> Self {
        self.to.push(recipient.into());
        self
    }

    /// Set the plain text body.
    #[must_use]
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.text = Some(body.into());
        self
    }

    /// Set the HTML body.
    #[must_use]
    pub fn html(mut self, body: impl Into<String>) -> Self {
        self.html = Some(body.into());
        self
    }

    /// Check the message has everything a backend needs.
    pub fn validate(&self) -> Result<()> {
        if self.from.is_empty() {
            return Err(crate::error::TallywardError::bad_request(
                "Email 'from' is required",
            ));
        }
        if self.to.is_empty() {
            return Err(crate::error::TallywardError::bad_request(
                "Email 'to' is required",
            ));
        }
        if self.subject.is_empty() {
            return Err(crate::error::TallywardError::bad_request(
                "Email 'subject' is required",
            ));
        }
        if self.text.is_none() && self.html.is_none() {
            return Err(crate::error::TallywardError::bad_request(
                "Email must have either 'text' or 'html' body",
            ));
        }
        Ok(())
    }
}

/// Email delivery backend.
///
/// # Example
///
/// ```rust,ignore
/// use tallyward::traits::{Email, Mailer};
/// use tallyward::error::Result;
/// use async_trait::async_trait;
///
/// struct MyMailer;
///
/// #[async_trait]
/// impl Mailer for MyMailer {
///     async fn send(&self, email: &Email) -> Result<()> {
///         // Deliver via your preferred service
///         Ok(())
///     }
///
///     fn is_healthy(&self) -> bool {
///         true
///     }
/// }
/// ```
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send an email.
    async fn send(&self, email: &Email) -> Result<()>;

    /// Check if the backend is healthy/connected.
    fn is_healthy(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_collects_fields() {
        let email = Email::new("no-reply@tallyward.app", "ana@exemplo.com.br", "Bem-vinda")
            .to("socio@exemplo.com.br")
            .text("corpo");

        assert_eq!(email.to.len(), 2);
        assert!(email.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_some_body() {
        let email = Email::new("from@exemplo.com.br", "to@exemplo.com.br", "assunto");
        assert!(email.validate().is_err());
    }
}
