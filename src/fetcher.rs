use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::api::{throttle_wait, PageResponse};
use crate::constants::PAGE_SIZE;
use crate::error::ApiError;
use crate::rate_limiter::RateLimiter;
use crate::traits::ChatApi;

/// Why history paging stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryEnd {
    /// Reached an empty page: the whole history was scanned.
    Exhausted,
    /// Non-success status; the IDs collected before it are kept.
    HttpFailure { status: u16 },
    /// Too many consecutive throttled responses for one page.
    ThrottleCapReached { retries: u32 },
    /// No usable response; collected IDs were discarded.
    TransportFailure(String),
    /// A success response that did not decode; collected IDs were discarded.
    DecodeFailure(String),
}

impl DiscoveryEnd {
    pub fn is_complete(&self) -> bool {
        matches!(self, DiscoveryEnd::Exhausted)
    }
}

impl fmt::Display for DiscoveryEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryEnd::Exhausted => write!(f, "history exhausted"),
            DiscoveryEnd::HttpFailure { status } => write!(f, "HTTP {status}"),
            DiscoveryEnd::ThrottleCapReached { retries } => {
                write!(f, "still throttled after {retries} retries")
            }
            DiscoveryEnd::TransportFailure(e) => write!(f, "transport error: {e}"),
            DiscoveryEnd::DecodeFailure(e) => write!(f, "unreadable page: {e}"),
        }
    }
}

/// Candidate IDs in discovery order (newest first within each page).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub ids: Vec<String>,
    pub end: DiscoveryEnd,
}

/// Walks a channel's history backward and collects the user's deletable
/// messages.
pub struct MessageFetcher<'a> {
    api: &'a dyn ChatApi,
    limiter: &'a RateLimiter,
    throttle_retry_cap: Option<u32>,
}

impl<'a> MessageFetcher<'a> {
    pub fn new(api: &'a dyn ChatApi, limiter: &'a RateLimiter, throttle_retry_cap: Option<u32>) -> Self {
        Self {
            api,
            limiter,
            throttle_retry_cap,
        }
    }

    pub async fn fetch_candidates(&self, channel_id: &str, user_id: &str) -> Discovery {
        let mut ids = Vec::new();
        let mut before: Option<String> = None;
        let mut throttled_retries = 0u32;

        loop {
            self.limiter.wait_search().await;

            let started = Instant::now();
            let response = self
                .api
                .list_messages(channel_id, before.clone(), PAGE_SIZE)
                .await;

            let page = match response {
                Ok(page) => {
                    self.limiter.track_ping(started.elapsed().as_secs_f64() * 1000.0);
                    page
                }
                Err(ApiError::Transport(e)) => {
                    error!(error = %e, "Transport error while fetching messages");
                    return Discovery {
                        ids: Vec::new(),
                        end: DiscoveryEnd::TransportFailure(e),
                    };
                }
                Err(ApiError::Decode(e)) => {
                    error!(error = %e, "Unexpected error while fetching messages");
                    return Discovery {
                        ids: Vec::new(),
                        end: DiscoveryEnd::DecodeFailure(e),
                    };
                }
            };

            let wait = match page {
                PageResponse::RateLimited { retry_after } => {
                    self.limiter.record_throttle(retry_after);
                    let wait = throttle_wait(retry_after, 2);
                    warn!(
                        wait_ms = wait.as_millis() as u64,
                        "Rate limited while fetching messages"
                    );
                    wait
                }
                PageResponse::NotIndexed { retry_after } => {
                    self.limiter.record_throttle(retry_after);
                    let wait = throttle_wait(retry_after, 1);
                    warn!(wait_ms = wait.as_millis() as u64, "Channel not indexed yet");
                    wait
                }
                PageResponse::Failed { status, body } => {
                    error!(status, body = %body, "Message fetch failed");
                    return Discovery {
                        ids,
                        end: DiscoveryEnd::HttpFailure { status },
                    };
                }
                PageResponse::Page(messages) => {
                    throttled_retries = 0;
                    let Some(oldest) = messages.last() else {
                        info!(found = ids.len(), "No more messages in history");
                        return Discovery {
                            ids,
                            end: DiscoveryEnd::Exhausted,
                        };
                    };
                    before = Some(oldest.id.clone());

                    let before_len = ids.len();
                    ids.extend(
                        messages
                            .iter()
                            .filter(|m| m.is_candidate_for(user_id))
                            .map(|m| m.id.clone()),
                    );
                    debug!(
                        page_len = messages.len(),
                        matched = ids.len() - before_len,
                        cursor = ?before,
                        "Fetched history page"
                    );
                    continue;
                }
            };

            if let Some(cap) = self.throttle_retry_cap {
                if throttled_retries >= cap {
                    warn!(retries = throttled_retries, "Giving up on throttled history page");
                    return Discovery {
                        ids,
                        end: DiscoveryEnd::ThrottleCapReached {
                            retries: throttled_retries,
                        },
                    };
                }
            }
            throttled_retries += 1;
            tokio::time::sleep(wait).await;
        }
    }
}
