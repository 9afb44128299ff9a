//! Sign-in audit trail and device classification.
//!
//! Entries are append-only and written once per successful sign-in. The core
//! enforces no invariant on them beyond the write-once shape; they exist for
//! the profile surface and for the mobile access window check at login.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::user::UserId;

/// Coarse device classification derived from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Phones and tablets.
    Mobile,
    /// Everything else.
    Desktop,
}

static MOBILE_RE: OnceLock<Regex> = OnceLock::new();

fn mobile_regex() -> &'static Regex {
    MOBILE_RE.get_or_init(|| {
        let pattern = "Mobile|Tablet|iPad|iPhone|Android";
        Regex::new(pattern)
            .unwrap_or_else(|error| panic!("device regex failed to compile: {error}"))
    })
}

impl DeviceClass {
    /// Classify a raw user-agent string.
    pub fn classify(user_agent: &str) -> Self {
        if mobile_regex().is_match(user_agent) {
            Self::Mobile
        } else {
            Self::Desktop
        }
    }

    /// Stable storage code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::Mobile => "mobile",
            Self::Desktop => "desktop",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Client metadata captured at sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInfo {
    /// Raw user-agent string.
    pub user_agent: String,
    /// Reported platform, if any.
    pub platform: Option<String>,
    /// Peer address as seen by the server.
    pub address: Option<String>,
}

/// One append-only sign-in record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginHistoryEntry {
    /// Row identifier.
    #[schema(value_type = String)]
    pub id: Uuid,
    /// The user who signed in.
    #[schema(value_type = String)]
    pub user_id: UserId,
    /// Coarse device classification.
    pub device_class: DeviceClass,
    /// Raw user-agent string.
    pub user_agent: String,
    /// Reported platform, if any.
    pub platform: Option<String>,
    /// Peer address as seen by the server.
    pub address: Option<String>,
    /// Sign-in instant.
    pub created_at: DateTime<Utc>,
}

impl LoginHistoryEntry {
    /// Build a record for a sign-in happening now.
    pub fn record(user_id: UserId, client: ClientInfo, created_at: DateTime<Utc>) -> Self {
        let device_class = DeviceClass::classify(&client.user_agent);
        Self {
            id: Uuid::new_v4(),
            user_id,
            device_class,
            user_agent: client.user_agent,
            platform: client.platform,
            address: client.address,
            created_at,
        }
    }
}
