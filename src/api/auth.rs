// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the backend authentication endpoints.
//!
//! Four endpoints, no business logic:
//! - login initiation (returns the Google authorization URL)
//! - authorization-code exchange
//! - bearer status check
//! - access-token refresh

use crate::api::check_response_json;
use crate::error::{ClientError, Result};
use crate::models::{TokenPair, User};
use serde::Deserialize;

/// Thin typed client for the `/auth/` endpoints.
#[derive(Clone)]
pub struct AuthApi {
    http: reqwest::Client,
    base_url: String,
}

impl AuthApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Begin a login: ask the backend for the Google authorization URL.
    ///
    /// `redirect_uri` tells the backend where to send the browser after
    /// consent; when `None` the backend uses its configured default.
    pub async fn login_init(&self, redirect_uri: Option<&str>) -> Result<LoginInit> {
        let url = login_init_url(&self.base_url, redirect_uri);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_response_json(response).await
    }

    /// Exchange an authorization code for a signed-in session.
    ///
    /// The backend sets its session cookies on this response (captured by
    /// the shared cookie store) and returns the user record in the body.
    pub async fn exchange_callback(&self, code: &str) -> Result<CallbackExchange> {
        let url = format!("{}/auth/google/callback/", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("Code exchange failed: {}", e)))?;

        check_response_json(response).await
    }

    /// Ask who the bearer credential belongs to.
    ///
    /// Any non-success status is an error, including 401; the caller decides
    /// whether that means "needs refresh" rather than "logged out".
    pub async fn check_status(&self, access_token: &str) -> Result<User> {
        let url = format!("{}/auth/status/", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let status: StatusResponse = check_response_json(response).await?;
        Ok(status.user)
    }

    /// Trade a refresh token for a new access token.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String> {
        let url = format!("{}/auth/token/refresh/", self.base_url);

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "refresh": refresh_token }))
            .send()
            .await
            .map_err(|e| ClientError::Network(format!("Token refresh request failed: {}", e)))?;

        let refreshed: RefreshResponse = check_response_json(response).await?;
        Ok(refreshed.access)
    }
}

/// Build the login-init URL, encoding the redirect target when present.
fn login_init_url(base_url: &str, redirect_uri: Option<&str>) -> String {
    match redirect_uri {
        Some(redirect) => format!(
            "{}/auth/google/login/?redirect_uri={}",
            base_url,
            urlencoding::encode(redirect)
        ),
        None => format!("{}/auth/google/login/", base_url),
    }
}

/// Response from the login-init endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInit {
    /// Google authorization URL the browser should be sent to
    pub auth_url: String,
}

/// Response from the callback exchange.
///
/// The user record is always present. Token strings appear only on
/// deployments that use bearer flows alongside the session cookies.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackExchange {
    pub user: User,
    pub access: Option<String>,
    pub refresh: Option<String>,
}

impl CallbackExchange {
    /// Both bearer tokens, when the deployment issued them.
    pub fn token_pair(&self) -> Option<TokenPair> {
        match (&self.access, &self.refresh) {
            (Some(access), Some(refresh)) => Some(TokenPair {
                access: access.clone(),
                refresh: refresh.clone(),
            }),
            _ => None,
        }
    }
}

/// Body of the status endpoint.
#[derive(Debug, Deserialize)]
struct StatusResponse {
    user: User,
}

/// Body of the refresh endpoint.
#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: String,
}
