//! User and credential models.

use serde::{Deserialize, Serialize};

/// Authenticated Academy user, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Backend-assigned numeric ID
    pub id: u64,
    /// Email address (unique per user)
    pub email: String,
    /// Display name (may be absent for fresh Google accounts)
    pub name: Option<String>,
    /// Profile picture URL
    pub picture: Option<String>,
}

/// Bearer credential pair issued on login.
///
/// Both values are opaque strings; this client never inspects or decodes
/// them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived access token
    pub access: String,
    /// Long-lived refresh token
    pub refresh: String,
}
