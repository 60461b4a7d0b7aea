//! Billing-specific error types.
//!
//! Signup validation failures are ordered and exclusive: a request with
//! several problems reports only the first one in the sequence, so the
//! variants here map one-to-one onto the checkout validation steps.

use std::fmt;

/// Errors raised while building a checkout session.
///
/// Each variant carries a stable identifier (see [`BillingError::code`])
/// so clients can branch on the reason without parsing message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BillingError {
    /// An account with this email already exists.
    EmailAlreadyRegistered,
    /// A tenant with this fiscal ID already exists.
    FiscalIdAlreadyRegistered,
    /// The requested plan does not exist, is inactive, or is not offered
    /// to this kind of signup.
    PlanNotFound { plan_id: String },
    /// The plan exists but is missing the provider price reference for
    /// the requested billing interval.
    PlanMisconfigured { plan_id: String, reason: String },
    /// The payment provider rejected or failed the session request. The
    /// signup itself is well-formed, so the caller may retry.
    CheckoutSessionCreationFailed { message: String },
}

impl fmt::Display for BillingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmailAlreadyRegistered => {
                write!(f, "Email is already registered")
            }
            Self::FiscalIdAlreadyRegistered => {
                write!(f, "Fiscal ID is already registered")
            }
            Self::PlanNotFound { plan_id } => {
                write!(f, "Plan not found: {}", plan_id)
            }
            Self::PlanMisconfigured { plan_id, reason } => {
                write!(f, "Plan '{}' is misconfigured: {}", plan_id, reason)
            }
            Self::CheckoutSessionCreationFailed { message } => {
                write!(f, "Could not create checkout session: {}", message)
            }
        }
    }
}

impl std::error::Error for BillingError {}

impl BillingError {
    /// Stable machine-readable identifier for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmailAlreadyRegistered => "EMAIL_ALREADY_REGISTERED",
            Self::FiscalIdAlreadyRegistered => "FISCAL_ID_ALREADY_REGISTERED",
            Self::PlanNotFound { .. } => "PLAN_NOT_FOUND",
            Self::PlanMisconfigured { .. } => "PLAN_MISCONFIGURED",
            Self::CheckoutSessionCreationFailed { .. } => "CHECKOUT_SESSION_CREATION_FAILED",
        }
    }

    /// Check if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::EmailAlreadyRegistered
                | Self::FiscalIdAlreadyRegistered
                | Self::PlanNotFound { .. }
        )
    }

    /// Check if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::PlanMisconfigured { .. } | Self::CheckoutSessionCreationFailed { .. }
        )
    }

    /// Check if this error is retryable.
    ///
    /// Only provider-side session failures are worth retrying; every
    /// other variant will fail the same way again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::CheckoutSessionCreationFailed { .. })
    }
}

impl From<BillingError> for crate::error::TallywardError {
    fn from(err: BillingError) -> Self {
        let status = match &err {
            BillingError::EmailAlreadyRegistered | BillingError::FiscalIdAlreadyRegistered => 409,
            BillingError::PlanNotFound { .. } => 404,
            BillingError::PlanMisconfigured { .. } => 500,
            BillingError::CheckoutSessionCreationFailed { .. } => 502,
        };
        crate::error::TallywardError::domain(err.code(), status, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TallywardError;
    use axum::http::StatusCode;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BillingError::EmailAlreadyRegistered.to_string(),
            "Email is already registered"
        );

        let err = BillingError::PlanNotFound {
            plan_id: "contador-pro".to_string(),
        };
        assert_eq!(err.to_string(), "Plan not found: contador-pro");

        let err = BillingError::PlanMisconfigured {
            plan_id: "contador-pro".to_string(),
            reason: "no yearly price reference".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Plan 'contador-pro' is misconfigured: no yearly price reference"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(BillingError::EmailAlreadyRegistered.is_client_error());
        assert!(!BillingError::EmailAlreadyRegistered.is_retryable());

        let err = BillingError::CheckoutSessionCreationFailed {
            message: "upstream timeout".to_string(),
        };
        assert!(!err.is_client_error());
        assert!(err.is_server_error());
        assert!(err.is_retryable());

        let err = BillingError::PlanMisconfigured {
            plan_id: "p".to_string(),
            reason: "r".to_string(),
        };
        assert!(err.is_server_error());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_conversion_keeps_code_and_status() {
        let err: TallywardError = BillingError::EmailAlreadyRegistered.into();
        assert_eq!(err.code(), Some("EMAIL_ALREADY_REGISTERED"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);

        let err: TallywardError = BillingError::PlanNotFound {
            plan_id: "p".to_string(),
        }
        .into();
        assert_eq!(err.code(), Some("PLAN_NOT_FOUND"));
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: TallywardError = BillingError::CheckoutSessionCreationFailed {
            message: "m".to_string(),
        }
        .into();
        assert_eq!(err.code(), Some("CHECKOUT_SESSION_CREATION_FAILED"));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }
}
