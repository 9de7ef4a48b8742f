//! Session and token data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User ID type (owned by the relational user store)
pub type UserId = String;

/// Session ID type (hex, independent of the user id)
pub type SessionId = String;

/// Current session record schema version
pub const SESSION_SCHEMA_VERSION: u32 = 1;

fn legacy_schema_version() -> u32 {
    1
}

/// Server-side record of one authenticated device
///
/// Stored as camelCase JSON under `session:<id>`. Records written before
/// versioning decode as version 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default = "legacy_schema_version")]
    pub version: u32,
    pub user_id: UserId,
    /// SHA-256 hex of the current refresh token; empty for unusable records
    #[serde(default)]
    pub refresh_token_hash: String,
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    /// Fixed at creation; rotation never moves it
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default)]
    pub ban_reason: Option<String>,
}

impl Session {
    /// Build a fresh record
    pub fn new(
        user_id: UserId,
        refresh_token_hash: String,
        device: &DeviceInfo,
        ban: &BanState,
        now: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            version: SESSION_SCHEMA_VERSION,
            user_id,
            refresh_token_hash,
            device_name: device.device_name.clone(),
            device_type: device.device_type.clone(),
            user_agent: device.user_agent.clone(),
            ip_address: device.ip_address.clone(),
            created_at: now,
            last_active_at: now,
            expires_at,
            is_banned: ban.is_banned,
            ban_reason: ban.reason.clone(),
        }
    }

    /// Decode a stored record
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    /// Whether the fixed refresh window has closed
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Client device metadata captured at login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_name: Option<String>,
    pub device_type: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

/// Ban flag applied to a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BanState {
    pub is_banned: bool,
    pub reason: Option<String>,
}

impl BanState {
    /// Not banned
    pub fn active() -> Self {
        Self::default()
    }

    /// Banned with an optional reason
    pub fn banned(reason: Option<String>) -> Self {
        Self {
            is_banned: true,
            reason,
        }
    }
}

/// A session together with its id
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEntry {
    pub session_id: SessionId,
    pub session: Session,
}

/// Tokens returned by a successful rotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RotatedTokens {
    pub refresh_token: String,
    pub access_token: String,
}

/// Everything a client receives when a session is opened
///
/// The raw secrets exist only here; the store keeps their hashes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuedSession {
    pub session_id: SessionId,
    pub refresh_token: String,
    pub binding_token: String,
    pub access_token: String,
    /// Seconds until the session (and its cookies) expire
    pub expires_in_secs: u64,
}

/// A freshly generated binding token and the TTL it was stored with
#[derive(Debug, Clone)]
pub struct BindingGrant {
    pub token: String,
    pub ttl_secs: u64,
}

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenClaims {
    pub user_id: UserId,
    pub session_id: SessionId,
    #[serde(rename = "type")]
    pub token_type: String,
    pub iss: String,
    pub aud: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}
