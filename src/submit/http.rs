//! HTTP submission: `POST {"hash": "0x…"}` to the configured endpoint

use crate::config::GestureConfig;
use crate::error::{GestureError, GestureResult};
use crate::fingerprint::Fingerprint;
use crate::submit::{GestureSubmitter, SubmissionReceipt};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

#[derive(Serialize)]
struct SubmitBody<'a> {
    hash: &'a Fingerprint,
}

pub struct HttpSubmitter {
    client: reqwest::Client,
    url: String,
}

impl HttpSubmitter {
    pub fn new(url: impl Into<String>, timeout: Duration) -> GestureResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &GestureConfig) -> GestureResult<Self> {
        Self::new(config.submit_url.clone(), config.request_timeout())
    }
}

#[async_trait]
impl GestureSubmitter for HttpSubmitter {
    async fn submit(&self, fingerprint: &Fingerprint) -> GestureResult<SubmissionReceipt> {
        tracing::info!("Submitting gesture {} to {}", fingerprint, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&SubmitBody { hash: fingerprint })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GestureError::SubmissionRejected {
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let body = serde_json::from_str(&text).ok();
        tracing::info!("Gesture submitted (status={})", status.as_u16());

        Ok(SubmissionReceipt {
            fingerprint: fingerprint.clone(),
            status: status.as_u16(),
            response: body,
            submitted_at: chrono::Utc::now(),
        })
    }
}
