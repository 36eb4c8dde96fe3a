// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session controller state machine.
//!
//! Owns the single session value the rest of the application observes.
//! Handles:
//! - Bootstrap (resolve session state from stored tokens + backend)
//! - Silent access-token refresh, with bounded retry on transport errors
//! - Login code exchange and logout
//! - Supersession of stale concurrent runs via a run generation counter

use crate::api::AuthApi;
use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::models::User;
use crate::session::login::{auth_url_state, CallbackListener};
use crate::store::TokenStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch, Mutex};

/// The session value exposed to consumers.
///
/// `user` is `None` for the anonymous state. `loading` is true from the
/// moment a Bootstrap or Refresh run starts until its result (or a
/// superseding run's result) is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionState {
    /// State before the first Bootstrap has resolved anything.
    fn initial() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

/// Transport-error retry budget for the refresh endpoint.
///
/// HTTP-status rejections are never retried; only transport failures get
/// another attempt, with the delay doubling each time.
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    max_retries: u32,
    initial_delay: Duration,
}

impl RetryPolicy {
    fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// How a refresh attempt resolved.
enum RefreshOutcome {
    /// A usable access token was obtained (freshly refreshed, or another
    /// task renewed it while we waited for the lock). Persisted unless a
    /// logout superseded the run meanwhile.
    Renewed(String),
    /// Refresh was impossible or rejected; the session is over.
    SignedOut,
}

/// State shared by every clone of the controller.
struct Shared {
    state_tx: watch::Sender<SessionState>,
    /// Run generation; only the run holding the latest generation may
    /// apply its result.
    generation: AtomicU64,
    /// Generation claimed by the most recent logout. A run's store writes
    /// are discarded once this reaches or passes its generation.
    logout_generation: AtomicU64,
    /// Serializes credential-store writes with logout's claim-and-clear.
    /// Never held across an await.
    store_lock: std::sync::Mutex<()>,
    /// Serializes refresh attempts so concurrent 401s cannot trigger
    /// duplicate refresh calls.
    refresh_lock: Mutex<()>,
    /// Session-sync events, broadcast after a successful login exchange.
    sync_tx: broadcast::Sender<()>,
}

/// Orchestrates the token store and the auth endpoints into a single
/// session state value.
///
/// One controller is constructed per application root and passed down
/// explicitly; clones share the same state.
#[derive(Clone)]
pub struct SessionController {
    auth: AuthApi,
    store: TokenStore,
    retry: RetryPolicy,
    callback_port: u16,
    login_timeout: Duration,
    shared: Arc<Shared>,
}

impl SessionController {
    pub fn new(auth: AuthApi, store: TokenStore, config: &Config) -> Self {
        let (state_tx, _) = watch::channel(SessionState::initial());
        let (sync_tx, _) = broadcast::channel(8);

        Self {
            auth,
            store,
            retry: RetryPolicy {
                max_retries: config.refresh_retries,
                initial_delay: Duration::from_millis(config.refresh_retry_delay_ms),
            },
            callback_port: config.callback_port,
            login_timeout: Duration::from_secs(config.login_timeout_secs),
            shared: Arc::new(Shared {
                state_tx,
                generation: AtomicU64::new(0),
                logout_generation: AtomicU64::new(0),
                store_lock: std::sync::Mutex::new(()),
                refresh_lock: Mutex::new(()),
                sync_tx,
            }),
        }
    }

    // ─── Bootstrap ───────────────────────────────────────────────────────

    /// Resolve the current session state from scratch.
    ///
    /// - No stored access token: trust the cached user record if present
    ///   (optimistic, no network), otherwise anonymous.
    /// - Stored access token: verify it against the status endpoint; on
    ///   rejection fall through to the Refresh transition.
    pub async fn bootstrap(&self) {
        let run = self.begin_run();
        let user = self.evaluate_session(run).await;
        self.finish_run(run, user);
    }

    async fn evaluate_session(&self, run: u64) -> Option<User> {
        let Some(access) = self.store.access_token() else {
            return self.store.stored_user();
        };

        match self.auth.check_status(&access).await {
            Ok(user) => {
                // The backend's record replaces the cached copy
                self.store_if_current(run, |store| store.set_stored_user(&user));
                Some(user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Status check failed, falling back to refresh");
                match self.locked_refresh(run, Some(&access)).await {
                    RefreshOutcome::Renewed(_) => self.store.stored_user(),
                    RefreshOutcome::SignedOut => None,
                }
            }
        }
    }

    // ─── Refresh ─────────────────────────────────────────────────────────

    /// Run the Refresh transition as its own state-machine run.
    ///
    /// Returns the new access token when the session could be renewed.
    pub async fn refresh(&self) -> Option<String> {
        self.refresh_run(None).await
    }

    /// Get a usable access token after `rejected` failed a bearer check.
    ///
    /// When another task already replaced the rejected token, the
    /// replacement is returned without a second refresh call; otherwise
    /// this runs the Refresh transition.
    pub async fn renewed_access_token(&self, rejected: &str) -> Option<String> {
        self.refresh_run(Some(rejected)).await
    }

    async fn refresh_run(&self, stale_access: Option<&str>) -> Option<String> {
        // Fast path: a newer token already exists
        if let (Some(stale), Some(current)) = (stale_access, self.store.access_token()) {
            if current != stale {
                return Some(current);
            }
        }

        let run = self.begin_run();
        match self.locked_refresh(run, stale_access).await {
            RefreshOutcome::Renewed(access) => {
                self.finish_run(run, self.store.stored_user());
                Some(access)
            }
            RefreshOutcome::SignedOut => {
                self.finish_run(run, None);
                None
            }
        }
    }

    /// The Refresh transition proper, serialized by the refresh lock.
    ///
    /// The cached user record is reused on success; profile data is never
    /// re-fetched here. Failure clears every stored credential. Store
    /// writes are dropped when a logout superseded this run.
    async fn locked_refresh(&self, run: u64, stale_access: Option<&str>) -> RefreshOutcome {
        let _guard = self.shared.refresh_lock.lock().await;

        // Re-check under the lock: the task holding it before us may have
        // already renewed the token we saw rejected.
        if let (Some(stale), Some(current)) = (stale_access, self.store.access_token()) {
            if current != stale {
                return RefreshOutcome::Renewed(current);
            }
        }

        let Some(refresh_token) = self.store.refresh_token() else {
            tracing::debug!("No refresh token stored, signing out");
            self.store_if_current(run, |store| store.clear());
            return RefreshOutcome::SignedOut;
        };

        match self.refresh_with_retry(&refresh_token).await {
            Ok(access) => {
                if self.store_if_current(run, |store| store.set_access_token(&access)) {
                    tracing::info!("Access token refreshed");
                } else {
                    tracing::debug!(run, "Refresh superseded by logout, token not persisted");
                }
                RefreshOutcome::Renewed(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, clearing session");
                self.store_if_current(run, |store| store.clear());
                RefreshOutcome::SignedOut
            }
        }
    }

    /// Call the refresh endpoint, retrying transport errors within the
    /// configured budget. HTTP-status rejections fail immediately.
    async fn refresh_with_retry(&self, refresh_token: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            match self.auth.refresh(refresh_token).await {
                Ok(access) => return Ok(access),
                Err(e) if e.is_transient() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    attempt += 1;
                    tracing::debug!(
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient refresh failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    // ─── Login ───────────────────────────────────────────────────────────

    /// Run the full interactive login flow.
    ///
    /// Binds the loopback callback listener, asks the backend for a
    /// provider auth URL pointing back at it, opens the system browser,
    /// and waits for the redirect. The `state` value riding on the auth
    /// URL is opaque; it just has to come back unchanged.
    pub async fn login(&self) -> Result<User> {
        let listener = CallbackListener::bind(self.callback_port).await?;
        let redirect_uri = listener.redirect_uri();

        let init = self.auth.login_init(Some(&redirect_uri)).await?;
        let expected_state = auth_url_state(&init.auth_url);

        tracing::info!(url = %init.auth_url, "Opening browser for login");
        if let Err(e) = open::that(&init.auth_url) {
            // Headless or browserless environments: the URL was already
            // logged, so the learner can follow it by hand
            tracing::warn!(error = %e, "Could not open a browser, navigate to the URL manually");
        }

        let outcome = listener.wait(self.login_timeout).await?;

        if let Some(expected) = expected_state {
            if outcome.state.as_deref() != Some(expected.as_str()) {
                return Err(ClientError::Callback(
                    "state parameter mismatch on callback".to_string(),
                ));
            }
        }

        self.complete_login(&outcome.code).await
    }

    /// Exchange an authorization code for a signed-in session.
    ///
    /// Persists the returned user record (and bearer tokens, when the
    /// deployment issues them) and broadcasts a session-sync event so
    /// mounted providers re-run Bootstrap. The session state itself is
    /// never written here; convergence happens through that re-run.
    pub async fn complete_login(&self, code: &str) -> Result<User> {
        let exchange = self.auth.exchange_callback(code).await?;

        self.store.set_stored_user(&exchange.user);
        if let Some(pair) = exchange.token_pair() {
            self.store.set_tokens(&pair.access, &pair.refresh);
        } else if let Some(access) = exchange.access.as_deref() {
            self.store.set_access_token(access);
        }

        tracing::info!(
            user_id = exchange.user.id,
            email = %exchange.user.email,
            "Login exchange complete"
        );

        // No receivers just means nothing is mounted yet
        let _ = self.shared.sync_tx.send(());

        Ok(exchange.user)
    }

    // ─── Logout ──────────────────────────────────────────────────────────

    /// Clear all credentials and emit the anonymous state synchronously.
    ///
    /// Claims a run generation, so any in-flight Bootstrap or Refresh can
    /// no longer apply its result or write credentials back to the store.
    /// Safe to call when already anonymous.
    pub fn logout(&self) {
        let run = {
            let _guard = self
                .shared
                .store_lock
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            let run = self.claim_generation();
            self.shared.logout_generation.store(run, Ordering::SeqCst);
            self.store.clear();
            run
        };
        self.apply_if_current(run, None);
        tracing::info!("Logged out");
    }

    // ─── State Access ────────────────────────────────────────────────────

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.shared.state_tx.subscribe()
    }

    /// Snapshot of the current session state.
    pub fn current(&self) -> SessionState {
        self.shared.state_tx.borrow().clone()
    }

    /// Subscribe to session-sync events (fired after a login exchange).
    pub fn sync_events(&self) -> broadcast::Receiver<()> {
        self.shared.sync_tx.subscribe()
    }

    // ─── Run Bookkeeping ─────────────────────────────────────────────────

    fn claim_generation(&self) -> u64 {
        self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Claim a generation and raise the loading flag for this run.
    fn begin_run(&self) -> u64 {
        let run = {
            // Claimed under the store lock, so a run claimed after a
            // logout always observes the cleared store
            let _guard = self
                .shared
                .store_lock
                .lock()
                .unwrap_or_else(|e| e.into_inner());
            self.claim_generation()
        };
        self.shared.state_tx.send_if_modified(|state| {
            // A later run or logout may have already taken over
            if self.shared.generation.load(Ordering::SeqCst) != run {
                return false;
            }
            if state.loading {
                return false;
            }
            state.loading = true;
            true
        });
        run
    }

    /// Apply a run's terminal state, unless a later run superseded it.
    fn finish_run(&self, run: u64, user: Option<User>) {
        if !self.apply_if_current(run, user) {
            tracing::debug!(run, "Session run superseded, result dropped");
        }
    }

    fn apply_if_current(&self, run: u64, user: Option<User>) -> bool {
        self.shared.state_tx.send_if_modified(|state| {
            if self.shared.generation.load(Ordering::SeqCst) != run {
                return false;
            }
            *state = SessionState {
                user,
                loading: false,
            };
            true
        })
    }

    /// Apply a run's credential-store write, unless a logout claimed this
    /// run's generation or a later one.
    ///
    /// Concurrent runs never invalidate each other's writes here; only
    /// logout does. The lock keeps the write ordered against logout's
    /// claim-and-clear.
    fn store_if_current(&self, run: u64, write: impl FnOnce(&TokenStore)) -> bool {
        let _guard = self
            .shared
            .store_lock
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        if self.shared.logout_generation.load(Ordering::SeqCst) >= run {
            return false;
        }
        write(&self.store);
        true
    }
}
