//! User identity and account value types.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::language::PreferredLanguage;
use crate::domain::points::Points;

/// Validation errors returned by the user value-type constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyEmail,
    InvalidEmail,
    EmptyPhone,
    InvalidPhone,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyEmail => write!(f, "email address must not be empty"),
            Self::InvalidEmail => write!(f, "email address is not well formed"),
            Self::EmptyPhone => write!(f, "phone number must not be empty"),
            Self::InvalidPhone => {
                write!(f, "phone number may only contain digits, spaces, and a leading +")
            }
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from string input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Wrap an already-parsed UUID.
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        // Deliverability is the mail system's problem; this only rejects
        // obviously malformed input.
        let pattern = "^[^@\\s]+@[^@\\s]+\\.[^@\\s]+$";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validate and construct an [`EmailAddress`].
    pub fn new(email: impl Into<String>) -> Result<Self, UserValidationError> {
        let email = email.into();
        if email.trim().is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if !email_regex().is_match(&email) {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(email))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Validated phone number in loose international notation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Validate and construct a [`PhoneNumber`].
    pub fn new(phone: impl Into<String>) -> Result<Self, UserValidationError> {
        let phone = phone.into();
        if phone.trim().is_empty() {
            return Err(UserValidationError::EmptyPhone);
        }
        let mut digits = 0_usize;
        for (index, ch) in phone.chars().enumerate() {
            match ch {
                '+' if index == 0 => {}
                ' ' => {}
                c if c.is_ascii_digit() => digits += 1,
                _ => return Err(UserValidationError::InvalidPhone),
            }
        }
        if digits < 6 {
            return Err(UserValidationError::InvalidPhone);
        }
        Ok(Self(phone))
    }
}

impl AsRef<str> for PhoneNumber {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Board user account as the engagement core sees it.
///
/// Identity fields are owned by the external identity provider; the points
/// balance is mutated only through the ledger, and the reset throttle state
/// lives behind its own repository port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Stable identifier.
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: UserId,
    /// Primary contact address, also the display handle on the board.
    #[schema(value_type = String, example = "ada@example.org")]
    pub email: EmailAddress,
    /// Optional phone contact used for password-reset lookups.
    #[schema(value_type = Option<String>, example = "+44 20 7946 0958")]
    pub phone: Option<PhoneNumber>,
    /// Interface language, restricted to the supported set.
    pub preferred_language: PreferredLanguage,
    /// Transferable engagement points. Never negative.
    #[schema(value_type = u32, example = 25)]
    pub points: Points,
}

impl User {
    /// Build a user from validated components.
    pub const fn new(
        id: UserId,
        email: EmailAddress,
        phone: Option<PhoneNumber>,
        preferred_language: PreferredLanguage,
        points: Points,
    ) -> Self {
        Self {
            id,
            email,
            phone,
            preferred_language,
            points,
        }
    }
}
