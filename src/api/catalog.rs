// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the course catalog, enrollment, and certificate endpoints.

use crate::api::{check_response, check_response_json};
use crate::error::{ClientError, Result};
use crate::models::{Certificate, CertificateVerification, Course, Enrollment};
use serde::Deserialize;

/// Thin typed client for the `/api/` catalog endpoints.
#[derive(Clone)]
pub struct CatalogApi {
    http: reqwest::Client,
    base_url: String,
}

impl CatalogApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    // ─── Public Catalog ──────────────────────────────────────────────────

    /// List the published course catalog.
    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let url = format!("{}/api/courses/", self.base_url);
        self.get_json(&url, None).await
    }

    /// Get a single course by ID.
    pub async fn get_course(&self, course_id: u64) -> Result<Course> {
        let url = format!("{}/api/courses/{}/", self.base_url, course_id);
        self.get_json(&url, None).await
    }

    /// Look up a certificate by its public verification code.
    ///
    /// Unknown codes are a regular `{valid: false}` response, not an error.
    pub async fn verify_certificate(&self, code: &str) -> Result<CertificateVerification> {
        let url = format!(
            "{}/api/certificates/verify/{}/",
            self.base_url,
            urlencoding::encode(code)
        );
        self.get_json(&url, None).await
    }

    // ─── Learner Resources (bearer-authenticated) ────────────────────────

    /// List the caller's enrollments.
    pub async fn list_enrollments(&self, access_token: &str) -> Result<Vec<Enrollment>> {
        let url = format!("{}/api/enrollments/", self.base_url);
        self.get_json(&url, Some(access_token)).await
    }

    /// Enroll the caller in a course.
    pub async fn enroll(&self, access_token: &str, course_id: u64) -> Result<Enrollment> {
        let url = format!("{}/api/enrollments/", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "course_id": course_id }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_response_json(response).await
    }

    /// Remove one of the caller's enrollments.
    pub async fn unenroll(&self, access_token: &str, enrollment_id: u64) -> Result<()> {
        let url = format!("{}/api/enrollments/{}/", self.base_url, enrollment_id);

        let response = self
            .http
            .delete(&url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_response(response).await
    }

    /// List the caller's certificates.
    pub async fn list_certificates(&self, access_token: &str) -> Result<Vec<Certificate>> {
        let url = format!("{}/api/certificates/", self.base_url);
        self.get_json(&url, Some(access_token)).await
    }

    /// Generic GET request with JSON response and optional bearer credential.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        access_token: Option<&str>,
    ) -> Result<T> {
        let mut request = self.http.get(url);
        if let Some(token) = access_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_response_json(response).await
    }
}
