use std::time::Instant;
use tracing::{debug, error, warn};

use crate::api::{throttle_wait, DeleteResponse};
use crate::constants::TRANSPORT_RETRY_DELAY;
use crate::error::ApiError;
use crate::rate_limiter::RateLimiter;
use crate::traits::ChatApi;

/// Deletes one message at a time with a bounded retry budget.
pub struct MessageDeleter<'a> {
    api: &'a dyn ChatApi,
    limiter: &'a RateLimiter,
    max_attempts: u32,
}

impl<'a> MessageDeleter<'a> {
    pub fn new(api: &'a dyn ChatApi, limiter: &'a RateLimiter, max_attempts: u32) -> Self {
        Self {
            api,
            limiter,
            max_attempts,
        }
    }

    /// Returns true once the server confirms the deletion.
    ///
    /// Throttling and transport errors use up attempts; 400/403, any other
    /// status, and undecodable responses fail immediately.
    pub async fn delete_one(&self, channel_id: &str, message_id: &str) -> bool {
        self.limiter.wait_delete().await;

        let mut attempt = 0;
        while attempt < self.max_attempts {
            let started = Instant::now();
            let response = self.api.delete_message(channel_id, message_id).await;

            match response {
                Ok(resp) => {
                    self.limiter.track_ping(started.elapsed().as_secs_f64() * 1000.0);
                    match resp {
                        DeleteResponse::Deleted => {
                            self.limiter.record_deletion();
                            debug!(message_id, "Message deleted");
                            return true;
                        }
                        DeleteResponse::RateLimited { retry_after } => {
                            self.limiter.record_throttle(retry_after);
                            let wait = throttle_wait(retry_after, 2);
                            warn!(
                                message_id,
                                wait_ms = wait.as_millis() as u64,
                                attempt = attempt + 1,
                                max_attempts = self.max_attempts,
                                "Rate limited while deleting message"
                            );
                            tokio::time::sleep(wait).await;
                            attempt += 1;
                        }
                        DeleteResponse::Rejected { status } => {
                            error!(message_id, status, "Delete rejected: missing permission or bad request");
                            return false;
                        }
                        DeleteResponse::Failed { status, body } => {
                            error!(message_id, status, body = %body, "Delete failed");
                            return false;
                        }
                    }
                }
                Err(ApiError::Transport(e)) => {
                    error!(
                        message_id,
                        error = %e,
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts,
                        "Transport error while deleting message"
                    );
                    attempt += 1;
                    tokio::time::sleep(TRANSPORT_RETRY_DELAY).await;
                }
                Err(e) => {
                    error!(message_id, error = %e, "Unexpected error while deleting message");
                    return false;
                }
            }
        }

        error!(
            message_id,
            attempts = self.max_attempts,
            "Giving up on message after exhausting attempts"
        );
        false
    }
}
