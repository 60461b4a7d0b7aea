use crate::traits::ExportedReport;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// Convenience alias for JSON handler results.
pub type JsonResponse<T> = Result<Json<T>, crate::error::TallywardError>;

/// 201 Created with a `Location` header.
#[derive(Debug, Serialize)]
pub struct CreatedResponse<T: Serialize> {
    pub data: T,
    pub location: String,
}

impl<T: Serialize> IntoResponse for CreatedResponse<T> {
    fn into_response(self) -> Response {
        let mut response = (StatusCode::CREATED, Json(self.data)).into_response();
        if let Ok(location) = self.location.parse() {
            response
                .headers_mut()
                .insert(header::LOCATION, location);
        } else {
            tracing::warn!(location = %self.location, "Invalid Location header value in CreatedResponse");
        }
        response
    }
}

/// A generated report served as a file download.
#[derive(Debug)]
pub struct Attachment(pub ExportedReport);

impl IntoResponse for Attachment {
    fn into_response(self) -> Response {
        let ExportedReport {
            content_type,
            filename,
            bytes,
        } = self.0;

        let mut response = bytes.into_response();
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        match HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")) {
            Ok(value) => {
                response.headers_mut().insert(header::CONTENT_DISPOSITION, value);
            }
            Err(_) => {
                tracing::warn!(filename = %filename, "Invalid attachment filename");
            }
        }
        response
    }
}
