//! Email delivery backends and message composition.
//!
//! Two [`Mailer`](crate::traits::Mailer) implementations are provided:
//! [`ConsoleMailer`] prints to stdout for development, [`SmtpMailer`]
//! delivers through an SMTP relay via lettre.
//!
//! ```rust,ignore
//! use tallyward::email::{SmtpConfig, SmtpMailer};
//! use tallyward::traits::Mailer;
//!
//! let mailer = SmtpMailer::new(
//!     SmtpConfig::new("smtp.exemplo.com.br")
//!         .credentials("postmaster", "app-password")
//!         .from("no-reply@tallyward.app"),
//! )?;
//! mailer.send(&tallyward::email::welcome_email(
//!     "no-reply@tallyward.app",
//!     "ana@exemplo.com.br",
//!     "Escritório Freitas",
//! ))
//! .await?;
//! ```

mod console;
mod smtp;

pub use console::ConsoleMailer;
pub use smtp::{SmtpConfig, SmtpMailer};

pub use crate::traits::Email;

/// Compose the welcome message sent once an account has been
/// provisioned. `name` is the firm's company name or the individual's
/// display name; an empty name falls back to a plain greeting.
#[must_use]
pub fn welcome_email(from: &str, to: &str, name: &str) -> Email {
    let greeting = if name.is_empty() {
        "Welcome to Tallyward".to_string()
    } else {
        format!("Welcome to Tallyward, {name}")
    };

    let text = format!(
        "{greeting}!\n\n\
         Your payment was confirmed and your workspace is ready.\n\
         Sign in with the email address this message was sent to.\n"
    );
    let html = format!(
        "<h1>{}!</h1>\
         <p>Your payment was confirmed and your workspace is ready.</p>\
         <p>Sign in with the email address this message was sent to.</p>",
        html_escape(&greeting)
    );

    Email::new(from, to, "Welcome to Tallyward")
        .text(text)
        .html(html)
}

// Names come from signup forms and may contain markup characters.
fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
