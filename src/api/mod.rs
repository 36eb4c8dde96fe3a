// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Typed HTTP clients for the Academy backend.
//!
//! Each client is a thin wrapper over a shared `reqwest::Client`: it builds
//! requests, attaches the bearer credential where required, and parses the
//! JSON response. No session logic lives here.

use crate::error::{ClientError, Result};
use serde::Deserialize;

pub mod auth;
pub mod catalog;
pub mod trivia;

pub use auth::{AuthApi, CallbackExchange, LoginInit};
pub use catalog::CatalogApi;
pub use trivia::TriviaApi;

/// Build the HTTP client shared by all Academy API calls.
///
/// The cookie store carries the HTTP-only session cookies the backend sets
/// on the callback exchange, so later requests stay cookie-authenticated.
pub fn build_http_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .cookie_store(true)
        .build()
        .map_err(|e| ClientError::Internal(anyhow::anyhow!("HTTP client init failed: {}", e)))
}

/// Check response status and return an API error if not successful.
pub(crate) async fn check_response(response: reqwest::Response) -> Result<()> {
    if response.status().is_success() {
        return Ok(());
    }

    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Api { status, body })
}

/// Check response status and parse the JSON body.
///
/// A transport failure while reading the body stays a `Network` error; a
/// body that arrived but does not decode is an internal error, so the
/// transport-retry budget is never spent on a malformed payload.
pub(crate) async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(ClientError::Api { status, body });
    }

    response.json().await.map_err(|e| {
        if e.is_decode() {
            ClientError::Internal(anyhow::anyhow!("Invalid JSON from Academy API: {}", e))
        } else {
            ClientError::Network(e.to_string())
        }
    })
}
