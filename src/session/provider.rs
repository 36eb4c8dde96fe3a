// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reactive exposure of the session state.
//!
//! Mounted once at the application root. Runs Bootstrap immediately,
//! then re-runs it whenever the app regains focus or a session-sync
//! event arrives (another flow completed a login). Consumers read the
//! session through `subscribe()` and never touch the token store or
//! the auth endpoints directly.

use crate::session::controller::{SessionController, SessionState};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;

/// Aborts the background loop when the last provider handle drops.
struct TaskGuard(JoinHandle<()>);

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.0.abort();
    }
}

/// Handle to the mounted session loop. Clones are cheap and share the
/// same background task.
#[derive(Clone)]
pub struct SessionProvider {
    controller: SessionController,
    focus_tx: mpsc::UnboundedSender<()>,
    _task: Arc<TaskGuard>,
}

impl SessionProvider {
    /// Spawn the session loop and kick off the initial Bootstrap.
    pub fn mount(controller: SessionController) -> Self {
        let (focus_tx, focus_rx) = mpsc::unbounded_channel();
        let sync_rx = controller.sync_events();

        let task = tokio::spawn(run_loop(controller.clone(), focus_rx, sync_rx));

        Self {
            controller,
            focus_tx,
            _task: Arc::new(TaskGuard(task)),
        }
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.controller.subscribe()
    }

    /// Snapshot of the current session state.
    pub fn current(&self) -> SessionState {
        self.controller.current()
    }

    /// Tell the session loop the application regained focus.
    ///
    /// Picks up sessions established or ended elsewhere while the app
    /// was in the background.
    pub fn notify_focus(&self) {
        let _ = self.focus_tx.send(());
    }

    /// Clear the session synchronously.
    pub fn logout(&self) {
        self.controller.logout();
    }

    /// Force an access-token refresh.
    pub async fn refresh(&self) {
        let _ = self.controller.refresh().await;
    }
}

async fn run_loop(
    controller: SessionController,
    mut focus_rx: mpsc::UnboundedReceiver<()>,
    mut sync_rx: broadcast::Receiver<()>,
) {
    controller.bootstrap().await;

    loop {
        tokio::select! {
            event = sync_rx.recv() => match event {
                Ok(()) => {
                    tracing::debug!("Session sync received, re-running bootstrap");
                    controller.bootstrap().await;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // Coalescing missed events into one re-run is fine;
                    // bootstrap always resolves from scratch
                    tracing::debug!(missed, "Session sync lagged");
                    controller.bootstrap().await;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            notified = focus_rx.recv() => match notified {
                Some(()) => {
                    tracing::debug!("Focus regained, re-checking session");
                    controller.bootstrap().await;
                }
                None => break,
            },
        }
    }
}
