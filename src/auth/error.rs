//! Authentication error types.

use std::fmt;

/// Errors raised while resolving a credential into a caller identity.
///
/// Every credential failure collapses into [`AuthError::InvalidCredential`]
/// so responses never reveal whether an account exists, whether the token
/// was expired, or which verification step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The presented credential is missing, malformed, expired, or does
    /// not match an account.
    InvalidCredential,
    /// The credential verified but the account is deactivated.
    InactiveAccount,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCredential => write!(f, "Invalid credentials"),
            Self::InactiveAccount => write!(f, "Account is deactivated"),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Stable machine-readable identifier for this error.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::InactiveAccount => "INACTIVE_ACCOUNT",
        }
    }

    /// Check if this is a client error (4xx). Always true today; kept so
    /// callers match the other domain error enums.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidCredential | Self::InactiveAccount)
    }
}

impl From<AuthError> for crate::error::TallywardError {
    fn from(err: AuthError) -> Self {
        let status = match err {
            AuthError::InvalidCredential => 401,
            AuthError::InactiveAccount => 403,
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
        assert_eq!(AuthError::InvalidCredential.to_string(), "Invalid credentials");
        assert_eq!(
            AuthError::InactiveAccount.to_string(),
            "Account is deactivated"
        );
    }

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(AuthError::InvalidCredential.code(), "INVALID_CREDENTIAL");
        assert_eq!(AuthError::InactiveAccount.code(), "INACTIVE_ACCOUNT");
    }

    #[test]
    fn test_conversion_keeps_code_and_status() {
        let err: TallywardError = AuthError::InvalidCredential.into();
        assert_eq!(err.code(), Some("INVALID_CREDENTIAL"));
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: TallywardError = AuthError::InactiveAccount.into();
        assert_eq!(err.code(), Some("INACTIVE_ACCOUNT"));
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
    }
}
