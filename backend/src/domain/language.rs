//! Preferred interface language as a closed, validated set.
//!
//! Free-form locale strings are not accepted anywhere; the boundary parses
//! into this enum and persistence stores the short code.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Languages the board can be rendered in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PreferredLanguage {
    /// English (default).
    En,
    /// Spanish.
    Es,
    /// Hindi.
    Hi,
    /// Portuguese.
    Pt,
    /// Chinese.
    Zh,
    /// French.
    Fr,
}

/// Error returned when a language code is outside the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported language code '{code}'")]
pub struct ParseLanguageError {
    /// The rejected code.
    pub code: String,
}

impl PreferredLanguage {
    /// All supported languages, in display order.
    pub const ALL: [Self; 6] = [
        Self::En,
        Self::Es,
        Self::Hi,
        Self::Pt,
        Self::Zh,
        Self::Fr,
    ];

    /// Short code stored in the database and exchanged with clients.
    pub const fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
            Self::Hi => "hi",
            Self::Pt => "pt",
            Self::Zh => "zh",
            Self::Fr => "fr",
        }
    }
}

impl Default for PreferredLanguage {
    fn default() -> Self {
        Self::En
    }
}

impl fmt::Display for PreferredLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for PreferredLanguage {
    type Err = ParseLanguageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|language| language.code() == s)
            .ok_or_else(|| ParseLanguageError { code: s.to_owned() })
    }
}
