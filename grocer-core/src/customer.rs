use grocer_shared::Masked;
use serde::{Deserialize, Serialize};

const FALLBACK_NAME: &str = "Customer";

/// Account profile as provided by the storefront's auth layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl CustomerProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            FALLBACK_NAME
        } else {
            name
        }
    }

    /// Non-blank email, trimmed
    pub fn email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }

    /// Non-blank phone, trimmed
    pub fn phone(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }

    /// Contact block handed to the payment gateway.
    pub fn contact(&self, phone: &str) -> CustomerContact {
        CustomerContact {
            name: self.display_name().to_string(),
            email: self.email().map(|e| Masked::new(e.to_string())),
            phone: Masked::new(phone.trim().to_string()),
        }
    }
}

/// Customer fields required by the payment intent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerContact {
    pub name: String,
    pub email: Option<Masked<String>>,
    pub phone: Masked<String>,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_fields_are_absent() {
        let profile = CustomerProfile::new("  ")
            .with_email("")
            .with_phone("   ");

        assert_eq!(profile.display_name(), "Customer");
        assert_eq!(profile.email(), None);
        assert_eq!(profile.phone(), None);
    }

    #[test]
    fn test_contact_trims_phone() {
        let profile = CustomerProfile::new("Mona").with_email("mona@example.com");
        let contact = profile.contact(" 01012345678 ");

        assert_eq!(contact.name, "Mona");
        assert_eq!(contact.phone.expose(), "01012345678");
        assert_eq!(contact.email.as_ref().map(|e| e.expose().as_str()), Some("mona@example.com"));
    }
}
