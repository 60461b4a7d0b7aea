//! Provisioning-specific error types.
//!
//! Every variant here is terminal for the delivery that caused it:
//! re-sending the identical event cannot change the outcome, so none of
//! these are worth a provider retry. Transient storage failures are the
//! retryable case, and those surface as plain internal errors instead.

use crate::billing::InvalidMetadataField;
use std::fmt;

/// Errors raised while consuming a payment-provider webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisioningError {
    /// The delivery failed signature verification. Nothing was read from
    /// or written to storage.
    InvalidWebhookSignature { reason: &'static str },
    /// The body passed verification but is not a parseable event.
    InvalidWebhookPayload { message: String },
    /// The event metadata is missing a field the signup kind requires.
    MissingMetadata { key: &'static str },
    /// The email or fiscal ID was claimed between checkout and webhook
    /// delivery. No account is created; the payment needs administrative
    /// reconciliation.
    DuplicateDuringProvisioning { field: &'static str },
}

impl fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidWebhookSignature { reason } => {
                write!(f, "Invalid webhook signature: {}", reason)
            }
            Self::InvalidWebhookPayload { message } => {
                write!(f, "Invalid webhook payload: {}", message)
            }
            Self::MissingMetadata { key } => {
                write!(f, "Missing or invalid metadata field '{}'", key)
            }
            Self::DuplicateDuringProvisioning { field } => {
                write!(f, "Duplicate {} detected during provisioning", field)
            }
        }
    }
}

impl std::error::Error for ProvisioningError {}

impl ProvisioningError {
    /// Stable machine-readable identifier for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidWebhookSignature { .. } => "INVALID_WEBHOOK_SIGNATURE",
            Self::InvalidWebhookPayload { .. } => "INVALID_WEBHOOK_PAYLOAD",
            Self::MissingMetadata { .. } => "MISSING_METADATA",
            Self::DuplicateDuringProvisioning { .. } => "DUPLICATE_DURING_PROVISIONING",
        }
    }

    /// Check if this error is retryable.
    ///
    /// Always false: a redelivery of the identical event carries the
    /// same signature, the same payload and the same conflict.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        false
    }
}

impl From<InvalidMetadataField> for ProvisioningError {
    fn from(err: InvalidMetadataField) -> Self {
        Self::MissingMetadata { key: err.key }
    }
}

impl From<ProvisioningError> for crate::error::TallywardError {
    fn from(err: ProvisioningError) -> Self {
        let status = match &err {
            ProvisioningError::InvalidWebhookSignature { .. }
            | ProvisioningError::InvalidWebhookPayload { .. }
            | ProvisioningError::MissingMetadata { .. } => 400,
            ProvisioningError::DuplicateDuringProvisioning { .. } => 409,
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
        let err = ProvisioningError::InvalidWebhookSignature {
            reason: "signature mismatch",
        };
        assert_eq!(
            err.to_string(),
            "Invalid webhook signature: signature mismatch"
        );

        let err = ProvisioningError::DuplicateDuringProvisioning { field: "email" };
        assert_eq!(err.to_string(), "Duplicate email detected during provisioning");
    }

    #[test]
    fn test_nothing_is_retryable() {
        let errors = [
            ProvisioningError::InvalidWebhookSignature { reason: "r" },
            ProvisioningError::InvalidWebhookPayload {
                message: "m".to_string(),
            },
            ProvisioningError::MissingMetadata { key: "email" },
            ProvisioningError::DuplicateDuringProvisioning { field: "email" },
        ];
        for err in errors {
            assert!(!err.is_retryable(), "{err}");
        }
    }

    #[test]
    fn test_metadata_error_conversion() {
        let err: ProvisioningError = InvalidMetadataField { key: "plan_id" }.into();
        assert_eq!(err, ProvisioningError::MissingMetadata { key: "plan_id" });
    }

    #[test]
    fn test_conversion_keeps_code_and_status() {
        let err: TallywardError = ProvisioningError::InvalidWebhookSignature {
            reason: "timestamp outside tolerance",
        }
        .into();
        assert_eq!(err.code(), Some("INVALID_WEBHOOK_SIGNATURE"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: TallywardError =
            ProvisioningError::DuplicateDuringProvisioning { field: "fiscal ID" }.into();
        assert_eq!(err.code(), Some("DUPLICATE_DURING_PROVISIONING"));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
