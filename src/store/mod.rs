// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer for tokens and the cached user record.

pub mod local;

pub use local::TokenStore;

/// Fixed storage key names (one file per key under the data directory).
pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const REFRESH_TOKEN: &str = "refresh_token";
    pub const USER: &str = "user.json";
}
