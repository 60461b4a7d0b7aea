//! Report serialization boundary.
//!
//! Exporters are pure formatters: authorization and tenant scoping
//! happen before any rows reach them, so an exporter can never widen
//! what the caller was allowed to read.

use crate::tenancy::ClientTenant;

/// A rendered document ready to stream back to the caller.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub content_type: &'static str,
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Serializes already-authorized records into a downloadable document.
pub trait ReportExporter: Send + Sync {
    /// Render a firm's managed-client roster.
    fn export_client_roster(&self, clients: &[ClientTenant]) -> ExportedReport;
}

/// Comma-separated values exporter.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvExporter;

impl CsvExporter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl ReportExporter for CsvExporter {
    fn export_client_roster(&self, clients: &[ClientTenant]) -> ExportedReport {
        let mut out = String::from("id,display_name,fiscal_id,active,created_at\n");
        for client in clients {
            out.push_str(&format!(
                "{},{},{},{},{}\n",
                csv_field(&client.id),
                csv_field(&client.display_name),
                csv_field(&client.fiscal_id),
                client.active,
                client.created_at.to_rfc3339(),
            ));
        }

        ExportedReport {
            content_type: "text/csv; charset=utf-8",
            filename: "clients.csv".to_string(),
            bytes: out.into_bytes(),
        }
    }
}

/// Quote a field when it contains a delimiter, quote or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tenancy::ClientModules;
    use chrono::Utc;

    fn client(display_name: &str) -> ClientTenant {
        ClientTenant {
            id: "tenant-c1".to_string(),
            owner_user_id: "user-c1".to_string(),
            display_name: display_name.to_string(),
            fiscal_id: "39053344705".to_string(),
            accountant_tenant_id: Some("tenant-a1".to_string()),
            modules: ClientModules::default(),
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_roster_has_header_and_one_line_per_client() {
        let report =
            CsvExporter::new().export_client_roster(&[client("Bruno Lima"), client("Carla Souza")]);

        let text = String::from_utf8(report.bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "id,display_name,fiscal_id,active,created_at");
        assert!(lines[1].contains("Bruno Lima"));
        assert_eq!(report.content_type, "text/csv; charset=utf-8");
    }

    #[test]
    fn test_fields_with_delimiters_are_quoted() {
        let report =
            CsvExporter::new().export_client_roster(&[client("Lima, Souza \"e\" Filhos")]);

        let text = String::from_utf8(report.bytes).unwrap();
        assert!(text.contains("\"Lima, Souza \"\"e\"\" Filhos\""));
    }

    #[test]
    fn test_empty_roster_is_just_the_header() {
        let report = CsvExporter::new().export_client_roster(&[]);
        let text = String::from_utf8(report.bytes).unwrap();
        assert_eq!(text, "id,display_name,fiscal_id,active,created_at\n");
    }
}
