// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! File-backed token store.
//!
//! One file per key, mirroring the fixed key names the web client keeps in
//! browser storage. Reads never fail: missing files and malformed content
//! are treated as absent. Writes go through a temp file and an atomic
//! rename so a crash mid-write cannot leave a torn value behind.

use crate::models::User;
use crate::store::keys;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Durable store for the token pair and the cached user record.
///
/// A store without a root directory ("detached") reads everything as
/// absent and accepts writes as no-ops; the session layer then behaves as
/// if the user was never logged in.
#[derive(Debug, Clone)]
pub struct TokenStore {
    root: Option<PathBuf>,
}

impl TokenStore {
    /// Create a store rooted at the given directory, creating it if needed.
    ///
    /// Falls back to a detached store when the directory cannot be created,
    /// so a read-only home never blocks startup.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        if let Err(e) = fs::create_dir_all(&root) {
            tracing::warn!(
                path = %root.display(),
                error = %e,
                "Cannot create data directory, session will not persist"
            );
            return Self { root: None };
        }
        Self { root: Some(root) }
    }

    /// Create a store that persists nothing.
    pub fn detached() -> Self {
        Self { root: None }
    }

    /// Whether writes actually land on disk.
    pub fn is_persistent(&self) -> bool {
        self.root.is_some()
    }

    // ─── Token Operations ────────────────────────────────────────────────

    pub fn access_token(&self) -> Option<String> {
        self.read_key(keys::ACCESS_TOKEN)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.read_key(keys::REFRESH_TOKEN)
    }

    /// Overwrite both tokens.
    ///
    /// Consumers only read after this returns, so per-file atomicity is
    /// sufficient; there is no cross-file transaction.
    pub fn set_tokens(&self, access: &str, refresh: &str) {
        self.write_key(keys::ACCESS_TOKEN, access);
        self.write_key(keys::REFRESH_TOKEN, refresh);
    }

    /// Replace only the access token, keeping the refresh token.
    pub fn set_access_token(&self, access: &str) {
        self.write_key(keys::ACCESS_TOKEN, access);
    }

    /// Remove both tokens and the cached user record.
    pub fn clear(&self) {
        self.remove_key(keys::ACCESS_TOKEN);
        self.remove_key(keys::REFRESH_TOKEN);
        self.remove_key(keys::USER);
    }

    // ─── Cached User Record ──────────────────────────────────────────────

    /// Last cached user record; malformed JSON reads as absent.
    pub fn stored_user(&self) -> Option<User> {
        let raw = self.read_key(keys::USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(error = %e, "Cached user record is not valid JSON, ignoring");
                None
            }
        }
    }

    pub fn set_stored_user(&self, user: &User) {
        match serde_json::to_string(user) {
            Ok(raw) => self.write_key(keys::USER, &raw),
            Err(e) => tracing::warn!(error = %e, "Failed to serialize user record"),
        }
    }

    // ─── Key-Level Helpers ───────────────────────────────────────────────

    fn key_path(&self, key: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(key))
    }

    fn read_key(&self, key: &str) -> Option<String> {
        let path = self.key_path(key)?;
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read from token store");
                None
            }
        }
    }

    fn write_key(&self, key: &str, value: &str) {
        let Some(path) = self.key_path(key) else {
            return;
        };
        if let Err(e) = write_atomic(&path, value) {
            tracing::warn!(key, error = %e, "Failed to write to token store");
        }
    }

    fn remove_key(&self, key: &str) {
        let Some(path) = self.key_path(key) else {
            return;
        };
        if let Err(e) = fs::remove_file(&path) {
            if e.kind() != ErrorKind::NotFound {
                tracing::warn!(key, error = %e, "Failed to remove key from token store");
            }
        }
    }
}

/// Write to a temp file first, then rename for atomicity.
///
/// Tokens are credentials, so the file is restricted to the owner on Unix
/// before it lands at its final path.
fn write_atomic(path: &Path, value: &str) -> std::io::Result<()> {
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, value)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let permissions = fs::Permissions::from_mode(0o600);
        fs::set_permissions(&temp_path, permissions)?;
    }

    fs::rename(&temp_path, path)?;
    Ok(())
}
