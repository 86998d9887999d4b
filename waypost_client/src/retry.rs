use anyhow::Result;
use rand::Rng;
use reqwest::{RequestBuilder, Response, StatusCode};
use std::time::Duration;

pub const DEFAULT_READ_ATTEMPTS: u32 = 3;

/// Bounded exponential backoff with jitter for idempotent reads.
/// Mutations must not go through here; a retried write can double-apply.
pub async fn send_with_retry<F>(mut build: F, attempts: u32) -> Result<Response>
where
    F: FnMut() -> RequestBuilder,
{
    let max_attempts = attempts.clamp(1, 5);
    let mut backoff = Duration::from_millis(200);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let last_attempt = attempt >= max_attempts;
        match build().send().await {
            Ok(resp) => {
                let status = resp.status();
                if !should_retry_status(status) || last_attempt {
                    return Ok(resp);
                }
                tracing::debug!(status = %status, attempt, "retrying after upstream error");
            }
            Err(e) => {
                if last_attempt {
                    return Err(e.into());
                }
                tracing::debug!(error = %e, attempt, "retrying after transport error");
            }
        }
        sleep_with_jitter(backoff).await;
        backoff = backoff.saturating_mul(2).min(Duration::from_secs(5));
    }
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

async fn sleep_with_jitter(base: Duration) {
    let jitter_ms: u64 = rand::rng().random_range(0..=200);
    tokio::time::sleep(base + Duration::from_millis(jitter_ms)).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_statuses_cover_throttling_and_server_errors() {
        assert!(should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(should_retry_status(StatusCode::BAD_GATEWAY));
        assert!(!should_retry_status(StatusCode::BAD_REQUEST));
        assert!(!should_retry_status(StatusCode::NOT_FOUND));
        assert!(!should_retry_status(StatusCode::OK));
    }

    #[tokio::test]
    async fn transport_errors_surface_after_the_final_attempt() {
        // Nothing listens on port 1, so every attempt fails fast.
        let client = reqwest::Client::new();
        let err = send_with_retry(|| client.get("http://127.0.0.1:1/health"), 2)
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());

        // An attempt budget of zero still makes exactly one attempt.
        let err = send_with_retry(|| client.get("http://127.0.0.1:1/health"), 0)
            .await
            .unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
