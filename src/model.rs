//! Shared data model: scan payloads, pending records, and user profiles.
//!
//! Serialized field names follow the backend's camelCase wire format so the
//! stored records stay interchangeable with what the server produces.

use serde::{Deserialize, Serialize};

/// What a scanned attendance payload points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanKind {
    /// A time-boxed class meeting (`sessionId`).
    Session,
    /// A campus event (`eventId`).
    Event,
}

/// A validated attendance payload extracted from a scanned string.
///
/// Immutable once created; invalid inputs never produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanPayload {
    pub kind: ScanKind,
    pub id: String,
    /// Unix seconds after which the session/event no longer accepts check-ins.
    #[serde(rename = "expiresAtEpochSeconds")]
    pub expires_at_epoch_secs: u64,
}

/// An attendance intent captured before the user was authenticated,
/// held for replay after login. At most one is retained per device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingScan {
    pub payload: ScanPayload,
    #[serde(rename = "scannedAtEpochMillis")]
    pub scanned_at_epoch_millis: u64,
}

/// Student profile as returned by the login endpoint.
///
/// The backend sends more fields than we interpret; unknown fields are
/// preserved so the stored record round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// An authenticated device session. Single instance per device,
/// last write wins in the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}
