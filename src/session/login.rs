// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Loopback callback listener for interactive login.
//!
//! The backend's Google OAuth flow ends with a redirect to a local
//! `/auth/callback` URL. This module binds a short-lived server on
//! 127.0.0.1, hands the first authorization code back through a oneshot
//! channel, and renders a small page telling the learner to return to
//! the application.

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::error::{ClientError, Result};

/// Parameters the provider redirects back with.
#[derive(Deserialize)]
struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// A successfully received callback.
#[derive(Debug)]
pub struct CallbackOutcome {
    pub code: String,
    pub state: Option<String>,
}

type CallbackResult = std::result::Result<CallbackOutcome, String>;

/// Only the first callback wins; later hits still get a page rendered
/// but their parameters are dropped.
type OutcomeSender = Arc<tokio::sync::Mutex<Option<oneshot::Sender<CallbackResult>>>>;

/// Aborts the serve task when the listener is dropped without being
/// waited on (for example when login initiation fails).
struct ServerGuard(JoinHandle<()>);

impl Drop for ServerGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// One-shot loopback server for the login redirect.
pub struct CallbackListener {
    addr: SocketAddr,
    rx: oneshot::Receiver<CallbackResult>,
    server: ServerGuard,
}

impl CallbackListener {
    /// Bind on 127.0.0.1 and start serving. Port 0 picks an ephemeral
    /// port; a fixed port that is already taken is reported as a
    /// callback error so the caller can surface it.
    pub async fn bind(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("127.0.0.1", port)).await.map_err(|e| {
            ClientError::Callback(format!("failed to bind 127.0.0.1:{}: {}", port, e))
        })?;
        let addr = listener
            .local_addr()
            .map_err(|e| ClientError::Callback(format!("local_addr failed: {}", e)))?;

        let (tx, rx) = oneshot::channel();
        let app = callback_router(Arc::new(tokio::sync::Mutex::new(Some(tx))));

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::warn!(error = %e, "Callback listener exited with error");
            }
        });

        tracing::debug!(%addr, "Callback listener bound");

        Ok(Self {
            addr,
            rx,
            server: ServerGuard(server),
        })
    }

    /// The redirect URI the backend must send the provider back to.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}/auth/callback", self.addr)
    }

    /// Wait for the first callback, then shut the listener down.
    pub async fn wait(self, timeout: Duration) -> Result<CallbackOutcome> {
        let Self { rx, server, .. } = self;

        let received = tokio::time::timeout(timeout, rx).await;
        drop(server);

        match received {
            Ok(Ok(Ok(outcome))) => Ok(outcome),
            Ok(Ok(Err(provider_error))) => Err(ClientError::Callback(format!(
                "provider reported an error: {}",
                provider_error
            ))),
            Ok(Err(_)) => Err(ClientError::Callback(
                "callback listener closed before a callback arrived".to_string(),
            )),
            Err(_) => Err(ClientError::Callback(format!(
                "no callback received within {} seconds",
                timeout.as_secs()
            ))),
        }
    }
}

fn callback_router(tx: OutcomeSender) -> Router {
    Router::new()
        .route("/auth/callback", get(receive_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(tx)
}

async fn receive_callback(
    State(tx): State<OutcomeSender>,
    Query(params): Query<CallbackParams>,
) -> Html<String> {
    let result = match (params.code, params.error) {
        (_, Some(error)) => Err(error),
        (Some(code), None) => Ok(CallbackOutcome {
            code,
            state: params.state,
        }),
        (None, None) => Err("missing authorization code".to_string()),
    };

    let page = match &result {
        Ok(_) => {
            tracing::debug!("Authorization code received");
            success_page()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Callback carried no usable code");
            failure_page(e)
        }
    };

    if let Some(tx) = tx.lock().await.take() {
        let _ = tx.send(result);
    }

    Html(page)
}

/// Extract the `state` query parameter from a backend-issued auth URL.
/// The value is opaque to us; it only gets compared against what the
/// callback echoes back.
pub(crate) fn auth_url_state(auth_url: &str) -> Option<String> {
    let url = reqwest::Url::parse(auth_url).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "state")
        .map(|(_, value)| value.into_owned())
}

fn success_page() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>Academy - Signed In</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px; background: #f5f5f5;">
<div style="max-width: 400px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
<h1 style="color: #22c55e; margin-bottom: 20px;">Signed In</h1>
<p style="color: #666;">You can close this window and return to the application.</p>
</div>
<script>setTimeout(() => window.close(), 2000);</script>
</body>
</html>"#
        .to_string()
}

fn failure_page(error: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Academy - Sign In Failed</title></head>
<body style="font-family: system-ui; text-align: center; padding: 50px; background: #f5f5f5;">
<div style="max-width: 400px; margin: 0 auto; background: white; padding: 40px; border-radius: 8px; box-shadow: 0 2px 4px rgba(0,0,0,0.1);">
<h1 style="color: #ef4444; margin-bottom: 20px;">Sign In Failed</h1>
<p style="color: #666;">Error: {}</p>
<p style="color: #888; font-size: 14px;">You can close this window and try again.</p>
</div>
</body>
</html>"#,
        error
    )
}
