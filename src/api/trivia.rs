// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client for the trivia question, score, and leaderboard endpoints.

use crate::api::{check_response, check_response_json};
use crate::error::{ClientError, Result};
use crate::models::{LeaderboardEntry, TriviaQuestion};

/// Thin typed client for the `/api/trivia/` endpoints.
#[derive(Clone)]
pub struct TriviaApi {
    http: reqwest::Client,
    base_url: String,
}

impl TriviaApi {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch the current question set.
    pub async fn questions(&self) -> Result<Vec<TriviaQuestion>> {
        let url = format!("{}/api/trivia/questions/", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_response_json(response).await
    }

    /// Submit the caller's score for the current round.
    pub async fn submit_score(&self, access_token: &str, score: u32) -> Result<()> {
        let url = format!("{}/api/trivia/scores/", self.base_url);

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "score": score }))
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_response(response).await
    }

    /// Fetch the public leaderboard, best scores first.
    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>> {
        let url = format!("{}/api/trivia/leaderboard/", self.base_url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        check_response_json(response).await
    }
}
