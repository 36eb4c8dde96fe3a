// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session lifecycle layer.
//!
//! Everything between the raw auth endpoints and the rest of the
//! application: the controller state machine, the loopback callback
//! listener used for interactive login, the reactive provider, and the
//! bearer-attaching facades for learner resources.

pub mod controller;
pub mod login;
pub mod provider;
pub mod resources;

pub use controller::{SessionController, SessionState};
pub use login::{CallbackListener, CallbackOutcome};
pub use provider::SessionProvider;
pub use resources::{CatalogService, TriviaService};
