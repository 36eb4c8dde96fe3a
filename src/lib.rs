// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Academy client: native session core for the Academy e-learning backend
//!
//! Keeps a learner signed in against the Academy REST API: durable token
//! storage, a session state machine covering bootstrap, refresh, login
//! and logout, and typed clients for the learner-facing resources.

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod session;
pub mod store;

use api::{AuthApi, CatalogApi, TriviaApi};
use config::Config;
use error::Result;
use session::{CatalogService, SessionController, TriviaService};
use store::TokenStore;

/// Shared application wiring.
pub struct AcademyClient {
    pub config: Config,
    pub store: TokenStore,
    pub controller: SessionController,
    pub catalog: CatalogService,
    pub trivia: TriviaService,
}

impl AcademyClient {
    /// Wire the store, API clients and session controller from a loaded
    /// configuration.
    pub fn new(config: Config) -> Result<Self> {
        let store = match &config.data_dir {
            Some(dir) => TokenStore::new(dir),
            None => {
                tracing::warn!("No data directory available, session will not persist");
                TokenStore::detached()
            }
        };

        let http = api::build_http_client()?;
        let auth = AuthApi::new(http.clone(), config.api_base_url.as_str());
        let controller = SessionController::new(auth, store.clone(), &config);

        let catalog = CatalogService::new(
            CatalogApi::new(http.clone(), config.api_base_url.as_str()),
            store.clone(),
            controller.clone(),
        );
        let trivia = TriviaService::new(
            TriviaApi::new(http, config.api_base_url.as_str()),
            store.clone(),
            controller.clone(),
        );

        Ok(Self {
            config,
            store,
            controller,
            catalog,
            trivia,
        })
    }
}
