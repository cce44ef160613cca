//! Fingerprint submission
//!
//! One request per call. Callers decide what a failure means to the user;
//! nothing here retries.

pub mod http;

use crate::error::GestureResult;
use crate::fingerprint::Fingerprint;
use async_trait::async_trait;
use serde::Serialize;

pub use http::HttpSubmitter;

/// Result of a successful submission
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub fingerprint: Fingerprint,
    pub status: u16,
    /// Response body, when it was JSON
    pub response: Option<serde_json::Value>,
    pub submitted_at: chrono::DateTime<chrono::Utc>,
}

/// Endpoint that accepts gesture credentials
#[async_trait]
pub trait GestureSubmitter: Send + Sync {
    async fn submit(&self, fingerprint: &Fingerprint) -> GestureResult<SubmissionReceipt>;
}
