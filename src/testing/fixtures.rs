//! Generators for test data in the shapes the domain expects.

use crate::billing::StoredPlan;
use crate::tenancy::TenantKind;

/// Helper functions for generating fake test data
pub mod fake {
    use uuid::Uuid;

    /// Generate a unique email address
    pub fn email() -> String {
        format!("test-{}@exemplo.com.br", Uuid::new_v4().simple())
    }

    /// Generate a UUID string
    pub fn uuid() -> String {
        Uuid::new_v4().to_string()
    }

    /// Generate a digits-only CNPJ-shaped fiscal id (14 digits)
    pub fn cnpj() -> String {
        digits(14)
    }

    /// Generate a digits-only CPF-shaped fiscal id (11 digits)
    pub fn cpf() -> String {
        digits(11)
    }

    /// Generate a firm name
    pub fn company_name() -> String {
        format!("Escritório {}", &Uuid::new_v4().simple().to_string()[..8])
    }

    /// Generate a person name
    pub fn person_name() -> String {
        format!("Cliente {}", &Uuid::new_v4().simple().to_string()[..8])
    }

    fn digits(count: usize) -> String {
        (0..count)
            .map(|_| char::from(b'0' + fastrand::u8(0..10)))
            .collect()
    }
}

/// A purchasable firm plan with both billing intervals configured.
#[must_use]
pub fn firm_plan() -> StoredPlan {
    StoredPlan {
        id: "contador-pro".to_string(),
        name: "Contador Pro".to_string(),
        audience: TenantKind::Accountant,
        monthly_price_id: Some("price_pro_monthly".to_string()),
        yearly_price_id: Some("price_pro_yearly".to_string()),
        monthly_price_cents: Some(14900),
        yearly_price_cents: Some(149000),
        currency: "brl".to_string(),
        features: serde_json::json!({ "client_portal": true, "reports": true }),
        limits: serde_json::json!({ "clients": -1, "documents_gb": 100 }),
        active: true,
    }
}

/// A purchasable individual plan, monthly only.
#[must_use]
pub fn client_plan() -> StoredPlan {
    StoredPlan {
        id: "autonomo".to_string(),
        name: "Autônomo".to_string(),
        audience: TenantKind::Client,
        monthly_price_id: Some("price_autonomo_monthly".to_string()),
        yearly_price_id: None,
        monthly_price_cents: Some(4900),
        yearly_price_cents: None,
        currency: "brl".to_string(),
        features: serde_json::json!({ "financial": true, "reports": false }),
        limits: serde_json::json!({ "documents_gb": 5 }),
        active: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fake_fiscal_ids_have_domain_shapes() {
        assert_eq!(fake::cnpj().len(), 14);
        assert_eq!(fake::cpf().len(), 11);
        assert!(fake::cnpj().chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_fake_emails_are_unique() {
        assert_ne!(fake::email(), fake::email());
    }

    #[test]
    fn test_plans_target_their_audience() {
        assert_eq!(firm_plan().audience, TenantKind::Accountant);
        assert_eq!(client_plan().audience, TenantKind::Client);
    }
}
