//! Shipping address input and local validation.

use serde::{Deserialize, Serialize};

use bindery_core::{DomainError, DomainResult};

/// Full shipping address as entered by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub recipient: String,
    pub line1: String,
    #[serde(default)]
    pub line2: Option<String>,
    pub city: String,
    pub postal_code: String,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
}

impl ShippingAddress {
    /// Local field validation. Runs before any rate lookup; a rejected
    /// address has no side effects.
    pub fn validate(&self) -> DomainResult<()> {
        let mut missing = Vec::new();
        if self.recipient.trim().is_empty() {
            missing.push("recipient");
        }
        if self.line1.trim().is_empty() {
            missing.push("line1");
        }
        if self.city.trim().is_empty() {
            missing.push("city");
        }
        if self.postal_code.trim().is_empty() {
            missing.push("postal_code");
        }
        if !missing.is_empty() {
            return Err(DomainError::validation(format!(
                "missing address fields: {}",
                missing.join(", ")
            )));
        }

        if self.country.trim().len() != 2 {
            return Err(DomainError::validation(
                "country must be a two-letter code",
            ));
        }

        Ok(())
    }
}
