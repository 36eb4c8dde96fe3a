// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types shared by the session and API layers.

/// Error type for everything that can fail between this client and the
/// Academy backend.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Academy API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Login callback error: {0}")]
    Callback(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ClientError {
    /// True for transport-level failures that may succeed on retry.
    /// HTTP-status rejections are never transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Network(_))
    }

    /// True when the backend rejected the bearer credential (HTTP 401).
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, ClientError::Api { status: 401, .. })
    }
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
