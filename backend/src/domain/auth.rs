//! Credential shapes consumed by the identity provider port.

use serde::{Deserialize, Serialize};

use crate::domain::user::{EmailAddress, PhoneNumber, UserValidationError};

/// How a user identifies their account: by email or by phone.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactIdentifier {
    /// Email address.
    Email(EmailAddress),
    /// Phone number.
    Phone(PhoneNumber),
}

impl ContactIdentifier {
    /// Parse from a raw `(method, value)` pair as submitted by clients.
    pub fn parse(method: ContactMethod, value: &str) -> Result<Self, UserValidationError> {
        match method {
            ContactMethod::Email => EmailAddress::new(value).map(Self::Email),
            ContactMethod::Phone => PhoneNumber::new(value).map(Self::Phone),
        }
    }
}

/// The contact method selector exposed at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ContactMethod {
    /// Identify by email address.
    Email,
    /// Identify by phone number.
    Phone,
}

/// Validation failures for submitted credentials.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialsValidationError {
    /// The contact identifier failed validation.
    #[error(transparent)]
    Contact(#[from] UserValidationError),
    /// Password empty once trimmed.
    #[error("password must not be empty")]
    EmptyPassword,
}

/// A sign-in attempt's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    identifier: ContactIdentifier,
    password: String,
}

impl LoginCredentials {
    /// Validate and build credentials.
    pub fn try_from_parts(
        identifier: ContactIdentifier,
        password: impl Into<String>,
    ) -> Result<Self, CredentialsValidationError> {
        let password = password.into();
        if password.trim().is_empty() {
            return Err(CredentialsValidationError::EmptyPassword);
        }
        Ok(Self {
            identifier,
            password,
        })
    }

    /// The submitted contact identifier.
    pub const fn identifier(&self) -> &ContactIdentifier {
        &self.identifier
    }

    /// The submitted password.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn rejects_blank_passwords() {
        let identifier = ContactIdentifier::parse(ContactMethod::Email, "ada@example.org")
            .expect("valid email");
        let err = LoginCredentials::try_from_parts(identifier, "  ")
            .expect_err("blank password rejected");
        assert_eq!(err, CredentialsValidationError::EmptyPassword);
    }

    #[rstest]
    #[case(ContactMethod::Email, "ada@example.org", true)]
    #[case(ContactMethod::Email, "nope", false)]
    #[case(ContactMethod::Phone, "+44 20 7946 0958", true)]
    #[case(ContactMethod::Phone, "abc", false)]
    fn parses_contact_identifiers(
        #[case] method: ContactMethod,
        #[case] value: &str,
        #[case] ok: bool,
    ) {
        assert_eq!(ContactIdentifier::parse(method, value).is_ok(), ok);
    }
}
