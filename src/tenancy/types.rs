//! Tenant and caller types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of an authenticated user.
///
/// Matched exhaustively at every access decision so that adding a role
/// surfaces each unhandled site as a compile error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// An accounting firm user. Owns an accountant tenant and may act on
    /// the client tenants that firm manages.
    Accountant,
    /// An individual client user. Owns exactly one client tenant.
    Client,
    /// Back-office staff. Carries no tenant of its own.
    Admin,
}

impl Role {
    /// Get the string representation of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accountant => "accountant",
            Self::Client => "client",
            Self::Admin => "admin",
        }
    }
}

/// Error returned when parsing a role or tenant kind string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRoleError {
    invalid_value: String,
}

impl fmt::Display for ParseRoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid value: '{}'", self.invalid_value)
    }
}

impl std::error::Error for ParseRoleError {}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accountant" => Ok(Self::Accountant),
            "client" => Ok(Self::Client),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which kind of tenant a plan targets, a signup provisions, or a tenant
/// record is.
///
/// The same two-valued tag travels as the provisioning discriminator in
/// checkout metadata, so its string form is part of the wire contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantKind {
    Accountant,
    Client,
}

impl TenantKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accountant => "accountant",
            Self::Client => "client",
        }
    }
}

impl FromStr for TenantKind {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "accountant" => Ok(Self::Accountant),
            "client" => Ok(Self::Client),
            _ => Err(ParseRoleError {
                invalid_value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TenantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The resolved identity of an authenticated request.
///
/// Produced by the identity resolver from a verified credential and
/// consumed by the authorization guard. At most one of the tenant ids is
/// populated, matching the caller's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub user_id: String,
    pub role: Role,
    pub accountant_tenant_id: Option<String>,
    pub client_tenant_id: Option<String>,
}

impl Caller {
    /// The tenant this caller acts as: the accountant tenant for firm
    /// users, the client tenant for client users, and none for admins.
    #[must_use]
    pub fn tenant_id(&self) -> Option<&str> {
        match self.role {
            Role::Accountant => self.accountant_tenant_id.as_deref(),
            Role::Client => self.client_tenant_id.as_deref(),
            Role::Admin => None,
        }
    }
}

/// Feature-module toggles on a client tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ClientModules {
    /// Cash-flow and payments module.
    #[serde(default)]
    pub financial: bool,
    /// Document inbox and storage module.
    #[serde(default)]
    pub documents: bool,
}

/// An accounting firm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountantTenant {
    pub id: String,
    /// The single user owning this tenant.
    pub owner_user_id: String,
    pub company_name: String,
    /// Professional registration identifier of the firm.
    pub registration_number: String,
    /// CNPJ, unique across all tenants of either kind.
    pub fiscal_id: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// An individual client, optionally managed by an accounting firm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientTenant {
    pub id: String,
    /// The single user owning this tenant.
    pub owner_user_id: String,
    pub display_name: String,
    /// CPF or CNPJ, unique across all tenants of either kind.
    pub fiscal_id: String,
    /// The managing firm, when there is one. A weak back-reference: the
    /// firm may act on this tenant's resources but does not own the row.
    pub accountant_tenant_id: Option<String>,
    pub modules: ClientModules,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// A tenant is either an accounting firm or an individual client.
///
/// Modeled as a sum type so each variant carries only its own fields
/// instead of one record where half the columns are null depending on a
/// kind flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Tenant {
    Accountant(AccountantTenant),
    Client(ClientTenant),
}

impl Tenant {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Accountant(t) => &t.id,
            Self::Client(t) => &t.id,
        }
    }

    #[must_use]
    pub fn kind(&self) -> TenantKind {
        match self {
            Self::Accountant(_) => TenantKind::Accountant,
            Self::Client(_) => TenantKind::Client,
        }
    }

    /// Human-facing name: the firm's company name or the individual's
    /// display name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Accountant(t) => &t.company_name,
            Self::Client(t) => &t.display_name,
        }
    }

    #[must_use]
    pub fn fiscal_id(&self) -> &str {
        match self {
            Self::Accountant(t) => &t.fiscal_id,
            Self::Client(t) => &t.fiscal_id,
        }
    }

    #[must_use]
    pub fn owner_user_id(&self) -> &str {
        match self {
            Self::Accountant(t) => &t.owner_user_id,
            Self::Client(t) => &t.owner_user_id,
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Self::Accountant(t) => t.active,
            Self::Client(t) => t.active,
        }
    }

    #[must_use]
    pub fn as_accountant(&self) -> Option<&AccountantTenant> {
        match self {
            Self::Accountant(t) => Some(t),
            Self::Client(_) => None,
        }
    }

    #[must_use]
    pub fn as_client(&self) -> Option<&ClientTenant> {
        match self {
            Self::Client(t) => Some(t),
            Self::Accountant(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_tenant() -> ClientTenant {
        ClientTenant {
            id: "t-client".to_string(),
            owner_user_id: "u-1".to_string(),
            display_name: "Maria Souza".to_string(),
            fiscal_id: "39053344705".to_string(),
            accountant_tenant_id: Some("t-firm".to_string()),
            modules: ClientModules {
                financial: true,
                documents: false,
            },
            active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("accountant".parse::<Role>().unwrap(), Role::Accountant);
        assert_eq!("CLIENT".parse::<Role>().unwrap(), Role::Client);
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Accountant.to_string(), "accountant");
        assert_eq!(Role::Client.to_string(), "client");
        assert_eq!(Role::Admin.to_string(), "admin");
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Role::Accountant).unwrap();
        assert_eq!(json, "\"accountant\"");

        let parsed: Role = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, Role::Accountant);
    }

    #[test]
    fn test_tenant_kind_round_trip() {
        for kind in [TenantKind::Accountant, TenantKind::Client] {
            let parsed: TenantKind = kind.as_str().parse().unwrap();
            assert_eq!(parsed, kind);
        }
        assert!("firm".parse::<TenantKind>().is_err());
    }

    #[test]
    fn test_caller_tenant_id_follows_role() {
        let caller = Caller {
            user_id: "u-1".to_string(),
            role: Role::Accountant,
            accountant_tenant_id: Some("t-firm".to_string()),
            client_tenant_id: None,
        };
        assert_eq!(caller.tenant_id(), Some("t-firm"));

        let caller = Caller {
            user_id: "u-2".to_string(),
            role: Role::Client,
            accountant_tenant_id: None,
            client_tenant_id: Some("t-client".to_string()),
        };
        assert_eq!(caller.tenant_id(), Some("t-client"));

        let caller = Caller {
            user_id: "u-3".to_string(),
            role: Role::Admin,
            accountant_tenant_id: None,
            client_tenant_id: None,
        };
        assert_eq!(caller.tenant_id(), None);
    }

    #[test]
    fn test_tenant_accessors() {
        let tenant = Tenant::Client(client_tenant());
        assert_eq!(tenant.id(), "t-client");
        assert_eq!(tenant.kind(), TenantKind::Client);
        assert_eq!(tenant.fiscal_id(), "39053344705");
        assert!(tenant.is_active());
        assert!(tenant.as_client().is_some());
        assert!(tenant.as_accountant().is_none());
    }

    #[test]
    fn test_tenant_serializes_with_kind_tag() {
        let tenant = Tenant::Client(client_tenant());
        let json = serde_json::to_value(&tenant).unwrap();
        assert_eq!(json["kind"], "client");
        assert_eq!(json["fiscal_id"], "39053344705");

        let back: Tenant = serde_json::from_value(json).unwrap();
        assert_eq!(back, tenant);
    }
}
