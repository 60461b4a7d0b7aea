//! Access token claims.

use crate::tenancy::Role;
use serde::{Deserialize, Serialize};

/// Claims embedded in an issued access token.
///
/// The token is self-describing so consumers can read the subject and
/// role without a lookup, but the identity resolver always rebuilds the
/// caller from the stored account. A revoked or deactivated account is
/// rejected even while its token is still within `exp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Role the account held when the token was issued
    pub role: Role,
    /// Accountant tenant the subject belonged to at issuance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accountant_tenant_id: Option<String>,
    /// Client tenant the subject belonged to at issuance
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_tenant_id: Option<String>,
    /// Issued at (unix timestamp)
    pub iat: u64,
    /// Expiration time (unix timestamp)
    pub exp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_round_trip() {
        let claims = Claims {
            sub: "user-1".to_string(),
            role: Role::Accountant,
            accountant_tenant_id: Some("tenant-1".to_string()),
            client_tenant_id: None,
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };

        let json = serde_json::to_string(&claims).unwrap();
        assert!(json.contains("\"role\":\"accountant\""));
        // Absent tenant links stay out of the payload entirely.
        assert!(!json.contains("client_tenant_id"));

        let back: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, "user-1");
        assert_eq!(back.accountant_tenant_id.as_deref(), Some("tenant-1"));
        assert!(back.client_tenant_id.is_none());
    }
}
