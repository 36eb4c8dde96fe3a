// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Bearer-attaching facades for learner resources.
//!
//! Thin wrappers over the catalog and trivia endpoints that read the
//! access token from the store and recover from a rejected bearer by
//! running one token refresh and retrying once. Public reads go straight
//! through without a token.

use crate::api::{CatalogApi, TriviaApi};
use crate::error::{ClientError, Result};
use crate::models::{
    Certificate, CertificateVerification, Course, Enrollment, LeaderboardEntry, TriviaQuestion,
};
use crate::session::controller::SessionController;
use crate::store::TokenStore;
use std::future::Future;

/// Run an authenticated call, refreshing the access token once when the
/// backend rejects it. A failed refresh propagates the original
/// rejection.
async fn with_bearer<T, F, Fut>(
    store: &TokenStore,
    controller: &SessionController,
    call: F,
) -> Result<T>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let Some(access) = store.access_token() else {
        return Err(ClientError::NotLoggedIn);
    };

    match call(access.clone()).await {
        Err(e) if e.is_auth_rejection() => {
            tracing::debug!("Bearer rejected, refreshing access token");
            match controller.renewed_access_token(&access).await {
                Some(renewed) => call(renewed).await,
                None => Err(e),
            }
        }
        other => other,
    }
}

/// Courses, enrollments and certificates.
#[derive(Clone)]
pub struct CatalogService {
    api: CatalogApi,
    store: TokenStore,
    controller: SessionController,
}

impl CatalogService {
    pub fn new(api: CatalogApi, store: TokenStore, controller: SessionController) -> Self {
        Self {
            api,
            store,
            controller,
        }
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        self.api.list_courses().await
    }

    pub async fn get_course(&self, course_id: u64) -> Result<Course> {
        self.api.get_course(course_id).await
    }

    /// Public verification lookup; no session required.
    pub async fn verify_certificate(&self, code: &str) -> Result<CertificateVerification> {
        self.api.verify_certificate(code).await
    }

    pub async fn list_enrollments(&self) -> Result<Vec<Enrollment>> {
        with_bearer(&self.store, &self.controller, |access| async move {
            self.api.list_enrollments(&access).await
        })
        .await
    }

    pub async fn enroll(&self, course_id: u64) -> Result<Enrollment> {
        with_bearer(&self.store, &self.controller, |access| async move {
            self.api.enroll(&access, course_id).await
        })
        .await
    }

    pub async fn unenroll(&self, enrollment_id: u64) -> Result<()> {
        with_bearer(&self.store, &self.controller, |access| async move {
            self.api.unenroll(&access, enrollment_id).await
        })
        .await
    }

    pub async fn list_certificates(&self) -> Result<Vec<Certificate>> {
        with_bearer(&self.store, &self.controller, |access| async move {
            self.api.list_certificates(&access).await
        })
        .await
    }
}

/// Trivia questions, score submission and the leaderboard.
#[derive(Clone)]
pub struct TriviaService {
    api: TriviaApi,
    store: TokenStore,
    controller: SessionController,
}

impl TriviaService {
    pub fn new(api: TriviaApi, store: TokenStore, controller: SessionController) -> Self {
        Self {
            api,
            store,
            controller,
        }
    }

    pub async fn questions(&self) -> Result<Vec<TriviaQuestion>> {
        self.api.questions().await
    }

    pub async fn submit_score(&self, score: u32) -> Result<()> {
        with_bearer(&self.store, &self.controller, |access| async move {
            self.api.submit_score(&access, score).await
        })
        .await
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        self.api.leaderboard().await
    }
}
