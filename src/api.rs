//! Wire types and per-endpoint response shapes.

use serde::Deserialize;
use std::time::Duration;

use crate::constants::{
    DEFAULT_RETRY_AFTER, MAX_RETRY_AFTER, MESSAGE_KIND_DEFAULT, MESSAGE_KIND_PIN_NOTICE,
};

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Author {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u32,
    pub author: Author,
}

impl Message {
    /// True for the user's own text messages and pin notices; other system
    /// messages cannot be deleted by their author.
    pub fn is_candidate_for(&self, user_id: &str) -> bool {
        self.author.id == user_id
            && matches!(self.kind, MESSAGE_KIND_DEFAULT | MESSAGE_KIND_PIN_NOTICE)
    }
}

/// Body of a 429 or 202 response.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RetryAfterBody {
    #[serde(default)]
    retry_after: Option<f64>,
}

/// Parse the server-directed wait from a throttling body, in seconds.
/// Missing, malformed or negative values fall back to one second; values
/// above an hour are capped.
pub(crate) fn parse_retry_after(body: &str) -> Duration {
    serde_json::from_str::<RetryAfterBody>(body)
        .ok()
        .and_then(|b| b.retry_after)
        .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
        .unwrap_or(DEFAULT_RETRY_AFTER)
        .min(MAX_RETRY_AFTER)
}

/// Wait after a throttled response: `factor` times the server's delay,
/// capped at `MAX_RETRY_AFTER` before multiplying.
pub(crate) fn throttle_wait(retry_after: Duration, factor: u32) -> Duration {
    retry_after.min(MAX_RETRY_AFTER).saturating_mul(factor)
}

/// Outcome of a single-resource lookup (`/users/@me`, `/channels/{id}`).
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Failed { status: u16, body: String },
}

/// Outcome of one history page request.
#[derive(Debug, Clone, PartialEq)]
pub enum PageResponse {
    Page(Vec<Message>),
    RateLimited { retry_after: Duration },
    /// 202: the channel's history is still being indexed.
    NotIndexed { retry_after: Duration },
    Failed { status: u16, body: String },
}

/// Outcome of one delete request.
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteResponse {
    Deleted,
    RateLimited { retry_after: Duration },
    /// 400/403: permanent for this message.
    Rejected { status: u16 },
    Failed { status: u16, body: String },
}
