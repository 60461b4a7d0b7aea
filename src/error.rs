use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// The main error type for Tallyward services
#[derive(Debug, thiserror::Error)]
pub enum TallywardError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A domain error carrying a stable machine-readable identifier.
    ///
    /// Produced by the `From` conversions on the domain error enums
    /// (`TenancyError`, `AuthError`, `BillingError`, `ProvisioningError`)
    /// so that identifiers such as `EMAIL_ALREADY_REGISTERED` reach the
    /// HTTP boundary unchanged. The message is written for clients and is
    /// returned verbatim regardless of the status class.
    #[error("{message}")]
    Domain {
        code: &'static str,
        status: u16,
        message: String,
    },

    #[cfg(feature = "database")]
    #[error("Database error: {0}")]
    Database(String),
}

/// Standard error response format for API errors.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    error_id: String,
}

impl TallywardError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn domain(code: &'static str, status: u16, msg: impl Into<String>) -> Self {
        Self::Domain {
            code,
            status,
            message: msg.into(),
        }
    }

    /// The stable identifier for domain errors, if this error carries one.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::Domain { code, .. } => Some(code),
            _ => None,
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            #[cfg(feature = "database")]
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Domain { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
        }
    }

    /// Returns a safe error message suitable for client responses.
    ///
    /// For client errors (4xx), returns the actual error message since these
    /// are typically safe and useful for the client.
    ///
    /// For server errors (5xx), returns a generic message to prevent
    /// information disclosure (CWE-209). The actual error details are
    /// logged server-side but not exposed to clients.
    ///
    /// Domain errors are the exception: their messages are curated for
    /// clients and are returned as-is even when the mapped status is 5xx.
    fn safe_message(&self) -> String {
        match self {
            // Client errors - safe to expose (user needs to know what went wrong)
            Self::NotFound(msg) => format!("Not found: {}", msg),
            Self::BadRequest(msg) => format!("Bad request: {}", msg),
            Self::Unauthorized(msg) => format!("Unauthorized: {}", msg),
            Self::Forbidden(msg) => format!("Forbidden: {}", msg),
            Self::Conflict(msg) => format!("Conflict: {}", msg),
            Self::Validation(msg) => format!("Validation failed: {}", msg),

            Self::Domain { message, .. } => message.clone(),

            // Server errors - hide details from clients
            Self::Internal(_) => "Internal server error".to_string(),
            Self::ServiceUnavailable(_) => "Service unavailable".to_string(),

            #[cfg(feature = "database")]
            Self::Database(_) => "Database error".to_string(),
        }
    }
}

impl IntoResponse for TallywardError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_id = uuid::Uuid::new_v4().to_string();

        // Full error details stay in server logs; response bodies for 5xx
        // carry only the generic message from safe_message().
        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request failed"
            );
        } else {
            tracing::debug!(
                status = status.as_u16(),
                error_id = %error_id,
                error = %self,
                "Request rejected"
            );
        }

        let body = Json(ErrorResponse {
            error: self.safe_message(),
            code: self.code(),
            error_id,
        });

        (status, body).into_response()
    }
}

/// Result type alias for Tallyward handlers
pub type Result<T> = std::result::Result<T, TallywardError>;

// Common error type conversions

impl From<serde_json::Error> for TallywardError {
    fn from(err: serde_json::Error) -> Self {
        // Classify based on error category
        if err.is_data() || err.is_syntax() || err.is_eof() {
            TallywardError::BadRequest(format!("JSON error: {}", err))
        } else {
            // IO errors are internal
            TallywardError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

#[cfg(feature = "database")]
impl From<sea_orm::DbErr> for TallywardError {
    fn from(err: sea_orm::DbErr) -> Self {
        match &err {
            sea_orm::DbErr::RecordNotFound(msg) => TallywardError::NotFound(if msg.is_empty() {
                "Record not found".to_string()
            } else {
                msg.clone()
            }),
            sea_orm::DbErr::Query(inner) => {
                TallywardError::Database(format!("Query error: {}", inner))
            }
            sea_orm::DbErr::Exec(inner) => {
                TallywardError::Database(format!("Execution error: {}", inner))
            }
            sea_orm::DbErr::Conn(inner) => {
                TallywardError::Database(format!("Connection error: {}", inner))
            }
            sea_orm::DbErr::Type(inner) => {
                TallywardError::Database(format!("Type error: {}", inner))
            }
            sea_orm::DbErr::Json(inner) => {
                TallywardError::Database(format!("JSON error: {}", inner))
            }
            _ => TallywardError::Database(format!("Database error: {}", err)),
        }
    }
}
