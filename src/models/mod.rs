// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the client.

pub mod catalog;
pub mod trivia;
pub mod user;

pub use catalog::{Certificate, CertificateVerification, Course, Enrollment};
pub use trivia::{LeaderboardEntry, TriviaQuestion};
pub use user::{TokenPair, User};
