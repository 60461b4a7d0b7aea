//! Trait definitions for swappable collaborators.
//!
//! Email delivery and report serialization sit behind these seams so the
//! core flows never depend on a concrete backend: provisioning sends
//! mail through any [`Mailer`], and handlers stream documents from any
//! [`ReportExporter`].

pub mod exporter;
pub mod mailer;

pub use exporter::{CsvExporter, ExportedReport, ReportExporter};
pub use mailer::{Email, Mailer};
