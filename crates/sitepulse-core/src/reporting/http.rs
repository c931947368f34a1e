//! HTTP layer: status mapping and retry.
//!
//! The only place that interprets status codes; client.rs deals in
//! decoded bodies.

use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use tracing::warn;

use super::auth::TokenProvider;
use crate::error::{PipelineError, PipelineResult};

/// Upper bound on any single backoff.
const MAX_BACKOFF: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) token_provider: TokenProvider,
    pub(crate) max_retries: u32,
}

impl HttpBackend {
    /// POST a JSON body, retrying rate limits and transport failures.
    pub(crate) async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> PipelineResult<reqwest::Response> {
        let mut retries = 0;

        loop {
            match self.post_json_once(url, body).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let backoff = backoff_for(&e, retries);

                    warn!(
                        error = %e,
                        retry = retries,
                        max_retries = self.max_retries,
                        backoff_ms = backoff.as_millis() as u64,
                        "retrying reporting request"
                    );

                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_json_once<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &B,
    ) -> PipelineResult<reqwest::Response> {
        let token = self.token_provider.get_token().await?;

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", token))
            .json(body)
            .send()
            .await?;
        let status = response.status();

        match status.as_u16() {
            200..=299 => Ok(response),

            401 | 403 => {
                let message = response.text().await.unwrap_or_default();
                Err(PipelineError::Unauthorized {
                    status: status.as_u16(),
                    message: upstream_message(&message, status),
                })
            }

            429 => {
                let retry_after = response
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<u64>().ok())
                    .map(Duration::from_secs);

                Err(PipelineError::RateLimited { retry_after })
            }

            _ => {
                let message = response.text().await.unwrap_or_default();
                Err(PipelineError::Upstream {
                    status: status.as_u16(),
                    message: upstream_message(&message, status),
                })
            }
        }
    }
}

/// Server-suggested delay (capped, ±10% jitter) for rate limits, otherwise
/// jittered exponential backoff.
fn backoff_for(error: &PipelineError, retries: u32) -> Duration {
    use rand::Rng;

    match error {
        PipelineError::RateLimited {
            retry_after: Some(retry_after),
        } => {
            let base_ms = (*retry_after).min(MAX_BACKOFF).as_millis() as u64;
            let jitter_factor: f64 = rand::thread_rng().gen_range(0.9_f64..=1.1_f64);
            let jittered_ms = ((base_ms as f64) * jitter_factor).round() as u64;
            Duration::from_millis(jittered_ms.max(100))
        }
        _ => {
            let base = Duration::from_secs(1 << retries.min(5)).min(MAX_BACKOFF);
            let jittered_ms = rand::thread_rng().gen_range(0..=base.as_millis() as u64);
            Duration::from_millis(jittered_ms.max(10))
        }
    }
}

/// Prefer the service's own error message over the raw body.
fn upstream_message(body: &str, status: reqwest::StatusCode) -> String {
    let from_json = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => status.to_string(),
        None => body.trim().to_string(),
    }
}
