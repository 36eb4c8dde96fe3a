//! Course catalog, enrollment, and certificate models.

use serde::{Deserialize, Serialize};

/// A published course in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    /// URL-friendly identifier
    pub slug: String,
    pub title: String,
    pub description: String,
    pub lesson_count: u32,
}

/// A learner's enrollment in a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: u64,
    pub course_id: u64,
    pub course_title: String,
    /// When the learner enrolled (RFC 3339, passed through as received)
    pub enrolled_at: String,
    /// Set once every lesson is complete
    pub completed_at: Option<String>,
}

/// A certificate issued on course completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Certificate {
    pub id: u64,
    pub course_title: String,
    /// Public verification code printed on the certificate
    pub code: String,
    pub issued_at: String,
}

/// Outcome of a public certificate verification lookup.
///
/// Validity is decided by the backend; this is a plain record lookup, not
/// a cryptographic check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateVerification {
    pub valid: bool,
    pub certificate: Option<Certificate>,
}
