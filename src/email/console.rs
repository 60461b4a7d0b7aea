//! Console mailer for development.
//!
//! Prints emails to stdout instead of sending them. Body content is
//! redacted by default since stdout is routinely captured by log
//! shippers; enable full output only on a local machine.

use crate::error::Result;
use crate::traits::{Email, Mailer};
use async_trait::async_trait;

/// A mailer that prints emails to stdout instead of sending them.
///
/// Bodies are redacted unless `with_full_output(true)` is set.
#[derive(Debug, Clone)]
pub struct ConsoleMailer {
    prefix: String,
    show_full_content: bool,
}

impl ConsoleMailer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            prefix: "[EMAIL]".to_string(),
            show_full_content: false,
        }
    }

    /// Create a console mailer with a custom log prefix.
    #[must_use]
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            show_full_content: false,
        }
    }

    /// Print full bodies instead of redacting them. Development only.
    #[must_use]
    pub fn with_full_output(mut self, enabled: bool) -> Self {
        if enabled {
            tracing::warn!(
                "ConsoleMailer: full output enabled, email content will be visible in logs"
            );
        }
        self.show_full_content = enabled;
        self
    }
}

impl Default for ConsoleMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Mailer for ConsoleMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        email.validate()?;

        println!("{} ════════════════════════════════════════", self.prefix);
        println!("{} From:    {}", self.prefix, email.from);
        println!("{} To:      {} recipient(s)", self.prefix, email.to.len());
        println!("{} Subject: {}", self.prefix, email.subject);
        println!("{} ────────────────────────────────────────", self.prefix);

        if self.show_full_content {
            if let Some(ref text) = email.text {
                println!("{} [TEXT]", self.prefix);
                for line in text.lines() {
                    println!("{} {}", self.prefix, line);
                }
            }
            if let Some(ref html) = email.html {
                println!("{} [HTML]", self.prefix);
                for line in html.lines() {
                    println!("{} {}", self.prefix, line);
                }
            }
        } else {
            if let Some(ref text) = email.text {
                println!("{} [TEXT] {} bytes [REDACTED]", self.prefix, text.len());
            }
            if let Some(ref html) = email.html {
                println!("{} [HTML] {} bytes [REDACTED]", self.prefix, html.len());
            }
        }

        println!("{} ════════════════════════════════════════", self.prefix);

        Ok(())
    }

    fn is_healthy(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_console_mailer_sends_without_error() {
        let mailer = ConsoleMailer::new();
        let email = Email::new("from@teste.com.br", "to@teste.com.br", "Assunto").text("corpo");

        assert!(mailer.send(&email).await.is_ok());
    }

    #[tokio::test]
    async fn test_console_mailer_rejects_bodyless_email() {
        let mailer = ConsoleMailer::new();
        let email = Email::new("from@teste.com.br", "to@teste.com.br", "Assunto");

        assert!(mailer.send(&email).await.is_err());
    }

    #[test]
    fn test_console_mailer_is_healthy() {
        assert!(ConsoleMailer::new().is_healthy());
    }
}
