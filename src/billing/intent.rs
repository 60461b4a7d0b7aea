//! Signup data carried through provider metadata.
//!
//! No database row exists until payment completes, so everything the
//! provisioner needs to create the account graph rides inside the
//! checkout session as flat string metadata. The same map is attached to
//! the subscription the session spawns, which lets subscription webhooks
//! recover the intent without a session lookup.

use crate::billing::subscription::BillingInterval;
use crate::tenancy::TenantKind;
use std::collections::HashMap;
use std::fmt;

const META_SIGNUP_KIND: &str = "signup_kind";
const META_EMAIL: &str = "email";
const META_PASSWORD_HASH: &str = "password_hash";
const META_PLAN_ID: &str = "plan_id";
const META_INTERVAL: &str = "interval";
const META_FISCAL_ID: &str = "fiscal_id";
const META_COMPANY_NAME: &str = "company_name";
const META_REGISTRATION_NUMBER: &str = "registration_number";
const META_DISPLAY_NAME: &str = "display_name";

/// A validated signup, ready to be provisioned once payment completes.
///
/// The password is already hashed by the time an intent exists; the
/// plaintext never enters this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutIntent {
    pub kind: TenantKind,
    /// Lowercased, trimmed email
    pub email: String,
    /// PHC-formatted Argon2id hash
    pub password_hash: String,
    pub plan_id: String,
    pub interval: BillingInterval,
    /// Digits-only fiscal ID (CNPJ for firms, CPF for individuals)
    pub fiscal_id: String,
    /// Firm signups only
    pub company_name: Option<String>,
    /// Firm signups only
    pub registration_number: Option<String>,
    /// Individual signups only
    pub display_name: Option<String>,
}

impl CheckoutIntent {
    /// Flatten into provider metadata.
    ///
    /// Absent optional fields are omitted rather than sent as empty
    /// strings, so [`CheckoutIntent::from_metadata`] is an exact inverse.
    #[must_use]
    pub fn to_metadata(&self) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert(META_SIGNUP_KIND.to_string(), self.kind.as_str().to_string());
        metadata.insert(META_EMAIL.to_string(), self.email.clone());
        metadata.insert(META_PASSWORD_HASH.to_string(), self.password_hash.clone());
        metadata.insert(META_PLAN_ID.to_string(), self.plan_id.clone());
        metadata.insert(
            META_INTERVAL.to_string(),
            self.interval.as_str().to_string(),
        );
        metadata.insert(META_FISCAL_ID.to_string(), self.fiscal_id.clone());

        if let Some(company_name) = &self.company_name {
            metadata.insert(META_COMPANY_NAME.to_string(), company_name.clone());
        }
        if let Some(registration_number) = &self.registration_number {
            metadata.insert(
                META_REGISTRATION_NUMBER.to_string(),
                registration_number.clone(),
            );
        }
        if let Some(display_name) = &self.display_name {
            metadata.insert(META_DISPLAY_NAME.to_string(), display_name.clone());
        }

        metadata
    }

    /// Rebuild an intent from provider metadata.
    ///
    /// Fails on any missing or unparseable required field, including the
    /// fields the parsed kind makes mandatory: firm signups must carry a
    /// company name and registration number, individual signups a
    /// display name.
    pub fn from_metadata(
        metadata: &HashMap<String, String>,
    ) -> Result<Self, InvalidMetadataField> {
        let required = |key: &'static str| -> Result<String, InvalidMetadataField> {
            metadata
                .get(key)
                .filter(|value| !value.is_empty())
                .cloned()
                .ok_or(InvalidMetadataField { key })
        };

        let kind: TenantKind = required(META_SIGNUP_KIND)?
            .parse()
            .map_err(|_| InvalidMetadataField {
                key: META_SIGNUP_KIND,
            })?;
        let interval: BillingInterval =
            required(META_INTERVAL)?
                .parse()
                .map_err(|_| InvalidMetadataField { key: META_INTERVAL })?;

        let (company_name, registration_number, display_name) = match kind {
            TenantKind::Accountant => (
                Some(required(META_COMPANY_NAME)?),
                Some(required(META_REGISTRATION_NUMBER)?),
                None,
            ),
            TenantKind::Client => (None, None, Some(required(META_DISPLAY_NAME)?)),
        };

        Ok(Self {
            kind,
            email: required(META_EMAIL)?,
            password_hash: required(META_PASSWORD_HASH)?,
            plan_id: required(META_PLAN_ID)?,
            interval,
            fiscal_id: required(META_FISCAL_ID)?,
            company_name,
            registration_number,
            display_name,
        })
    }
}

/// Error returned when provider metadata lacks a usable field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidMetadataField {
    pub key: &'static str,
}

impl fmt::Display for InvalidMetadataField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Missing or invalid metadata field '{}'", self.key)
    }
}

impl std::error::Error for InvalidMetadataField {}

#[cfg(test)]
mod tests {
    use super::*;

    fn firm_intent() -> CheckoutIntent {
        CheckoutIntent {
            kind: TenantKind::Accountant,
            email: "ana@escritoriofreitas.com.br".to_string(),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            plan_id: "contador-pro".to_string(),
            interval: BillingInterval::Monthly,
            fiscal_id: "12345678000190".to_string(),
            company_name: Some("Escritório Freitas Contabilidade".to_string()),
            registration_number: Some("CRC-SP 123456".to_string()),
            display_name: None,
        }
    }

    fn individual_intent() -> CheckoutIntent {
        CheckoutIntent {
            kind: TenantKind::Client,
            email: "bruno@exemplo.com.br".to_string(),
            password_hash: "$argon2id$v=19$m=1024,t=1,p=1$c2FsdA$aGFzaA".to_string(),
            plan_id: "autonomo".to_string(),
            interval: BillingInterval::Yearly,
            fiscal_id: "39053344705".to_string(),
            company_name: None,
            registration_number: None,
            display_name: Some("Bruno Lima".to_string()),
        }
    }

    #[test]
    fn test_firm_metadata_round_trip() {
        let intent = firm_intent();
        let metadata = intent.to_metadata();

        assert_eq!(metadata.get("signup_kind").map(String::as_str), Some("accountant"));
        assert_eq!(metadata.get("interval").map(String::as_str), Some("monthly"));
        assert!(!metadata.contains_key("display_name"));

        let back = CheckoutIntent::from_metadata(&metadata).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn test_individual_metadata_round_trip() {
        let intent = individual_intent();
        let metadata = intent.to_metadata();

        assert!(!metadata.contains_key("company_name"));
        assert!(!metadata.contains_key("registration_number"));

        let back = CheckoutIntent::from_metadata(&metadata).unwrap();
        assert_eq!(back, intent);
    }

    #[test]
    fn test_values_survive_as_flat_strings() {
        // Every metadata value must already be a plain string, no JSON
        // nesting, since providers only accept flat maps.
        let metadata = firm_intent().to_metadata();
        for value in metadata.values() {
            assert!(!value.starts_with('{'));
            assert!(!value.starts_with('['));
        }
    }

    #[test]
    fn test_missing_required_field() {
        let mut metadata = firm_intent().to_metadata();
        metadata.remove("password_hash");

        let err = CheckoutIntent::from_metadata(&metadata).unwrap_err();
        assert_eq!(err.key, "password_hash");
    }

    #[test]
    fn test_empty_required_field_counts_as_missing() {
        let mut metadata = firm_intent().to_metadata();
        metadata.insert("email".to_string(), String::new());

        let err = CheckoutIntent::from_metadata(&metadata).unwrap_err();
        assert_eq!(err.key, "email");
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let mut metadata = firm_intent().to_metadata();
        metadata.insert("signup_kind".to_string(), "franchise".to_string());

        let err = CheckoutIntent::from_metadata(&metadata).unwrap_err();
        assert_eq!(err.key, "signup_kind");
    }

    #[test]
    fn test_kind_specific_fields_are_required() {
        let mut metadata = firm_intent().to_metadata();
        metadata.remove("company_name");
        let err = CheckoutIntent::from_metadata(&metadata).unwrap_err();
        assert_eq!(err.key, "company_name");

        let mut metadata = individual_intent().to_metadata();
        metadata.remove("display_name");
        let err = CheckoutIntent::from_metadata(&metadata).unwrap_err();
        assert_eq!(err.key, "display_name");
    }
}
