use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::api::Lookup;
use crate::config::ClearanceConfig;
use crate::constants::{DM_CHANNEL_KIND, PROGRESS_EVERY, PROGRESS_FLUSH_TIMEOUT};
use crate::deleter::MessageDeleter;
use crate::discord::DiscordApi;
use crate::error::ValidationError;
use crate::fetcher::MessageFetcher;
use crate::rate_limiter::RateLimiter;
use crate::stats::LimiterStats;
use crate::traits::ChatApi;

/// Counts emitted every few processed deletions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub deleted_count: u64,
    pub failed_count: u64,
    pub total_processed: u64,
    pub total_found: u64,
}

/// Outcome of one clearance run.
///
/// `success` only says the pipeline ran; per-message failures are in
/// `failed_count`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClearanceResult {
    pub success: bool,
    pub message: String,
    pub deleted_count: u64,
    pub failed_count: u64,
    pub total_found: u64,
    pub discovery_complete: bool,
    pub stats: LimiterStats,
}

impl ClearanceResult {
    fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            deleted_count: 0,
            failed_count: 0,
            total_found: 0,
            discovery_complete: false,
            stats: LimiterStats::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Validating,
    Discovering,
    Deleting,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Validating => "validating",
            Phase::Discovering => "discovering",
            Phase::Deleting => "deleting",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs validate → discover → delete for one channel at a time.
pub struct ClearanceOrchestrator {
    config: ClearanceConfig,
}

impl ClearanceOrchestrator {
    pub fn new(config: ClearanceConfig) -> Self {
        Self { config }
    }

    /// Clear `user_id`'s messages from the DM channel `channel_id` using a
    /// fresh HTTP session authenticated with `token`.
    ///
    /// A snapshot is offered on `progress` after every tenth processed
    /// message. Sending never blocks deletion: a snapshot that does not fit
    /// is queued and retried, in order, at the next emission and once more
    /// (with a short timeout) when the run ends. To be sure of seeing every
    /// snapshot, either keep receiving while the run is in progress or give
    /// the channel room for `total_found / 10` snapshots.
    pub async fn clear_channel(
        &self,
        user_id: &str,
        token: &str,
        channel_id: &str,
        progress: Option<mpsc::Sender<ProgressSnapshot>>,
    ) -> ClearanceResult {
        let api = match DiscordApi::new(&self.config.api_base, token) {
            Ok(api) => api,
            Err(e) => {
                error!(error = %e, "Failed to build HTTP client");
                return ClearanceResult::failure(ValidationError::from(e).to_string());
            }
        };
        self.clear_channel_with(&api, user_id, channel_id, progress)
            .await
    }

    /// Same as [`clear_channel`](Self::clear_channel) over any [`ChatApi`].
    pub async fn clear_channel_with(
        &self,
        api: &dyn ChatApi,
        user_id: &str,
        channel_id: &str,
        progress: Option<mpsc::Sender<ProgressSnapshot>>,
    ) -> ClearanceResult {
        let run_id = uuid::Uuid::new_v4();
        let span = info_span!("clearance", %run_id, user_id, channel_id);
        self.run(api, user_id, channel_id, progress)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        api: &dyn ChatApi,
        user_id: &str,
        channel_id: &str,
        progress: Option<mpsc::Sender<ProgressSnapshot>>,
    ) -> ClearanceResult {
        let mut phase = Phase::Idle;
        info!("Starting clearance");

        enter(&mut phase, Phase::Validating);
        if let Err(e) = validate(api, user_id, channel_id).await {
            error!(error = %e, "Validation failed");
            return ClearanceResult::failure(e.to_string());
        }

        let limiter = RateLimiter::new(self.config.search_delay(), self.config.delete_delay());

        enter(&mut phase, Phase::Discovering);
        let discovery = MessageFetcher::new(api, &limiter, self.config.search_throttle_retry_cap)
            .fetch_candidates(channel_id, user_id)
            .await;
        let total_found = discovery.ids.len() as u64;
        if discovery.end.is_complete() {
            info!(total_found, "Discovery finished");
        } else {
            warn!(total_found, reason = %discovery.end, "Discovery ended early");
        }

        enter(&mut phase, Phase::Deleting);
        let deleter = MessageDeleter::new(api, &limiter, self.config.max_attempts);
        let mut deleted_count = 0u64;
        let mut failed_count = 0u64;
        let mut total_processed = 0u64;
        let mut emitter = progress.map(ProgressEmitter::new);

        for message_id in &discovery.ids {
            total_processed += 1;
            if deleter.delete_one(channel_id, message_id).await {
                deleted_count += 1;
            } else {
                failed_count += 1;
            }

            if total_processed % PROGRESS_EVERY == 0 {
                if let Some(emitter) = emitter.as_mut() {
                    emitter.emit(ProgressSnapshot {
                        deleted_count,
                        failed_count,
                        total_processed,
                        total_found,
                    });
                }
            }
        }
        if let Some(emitter) = emitter {
            emitter.finish().await;
        }

        enter(&mut phase, Phase::Done);
        let stats = limiter.stats();
        info!(
            deleted_count,
            failed_count,
            throttled_count = stats.throttled_count,
            throttled_total_ms = stats.throttled_total_ms,
            avg_ping_ms = stats.avg_ping_ms,
            "Clearance finished"
        );

        let message = if discovery.end.is_complete() {
            "Clearance finished.".to_string()
        } else {
            format!("Clearance finished; message discovery ended early ({}).", discovery.end)
        };

        ClearanceResult {
            success: true,
            message,
            deleted_count,
            failed_count,
            total_found,
            discovery_complete: discovery.end.is_complete(),
            stats,
        }
    }
}

fn enter(phase: &mut Phase, next: Phase) {
    debug!(from = %phase, to = %next, "Phase transition");
    *phase = next;
}

/// The token must resolve to `user_id` and the channel must be a DM.
async fn validate(api: &dyn ChatApi, user_id: &str, channel_id: &str) -> Result<(), ValidationError> {
    match api.current_user().await? {
        Lookup::Found(user) if user.id == user_id => {}
        Lookup::Found(user) => {
            return Err(ValidationError::IdentityMismatch {
                expected: user_id.to_string(),
                actual: user.id,
            })
        }
        Lookup::Failed { status, body } => {
            debug!(status, body = %body, "Token lookup failed");
            return Err(ValidationError::InvalidToken { status });
        }
    }

    match api.channel(channel_id).await? {
        Lookup::Found(channel) if channel.kind == DM_CHANNEL_KIND => Ok(()),
        Lookup::Found(channel) => Err(ValidationError::NotDirectMessage {
            channel_id: channel_id.to_string(),
            kind: channel.kind,
        }),
        Lookup::Failed { status, body } => {
            debug!(status, body = %body, "Channel lookup failed");
            Err(ValidationError::ChannelUnavailable { status })
        }
    }
}

/// Delivers snapshots without blocking the deletion loop. Snapshots that
/// find the channel full wait in `pending` and go out first next time.
struct ProgressEmitter {
    tx: mpsc::Sender<ProgressSnapshot>,
    pending: VecDeque<ProgressSnapshot>,
}

impl ProgressEmitter {
    fn new(tx: mpsc::Sender<ProgressSnapshot>) -> Self {
        Self {
            tx,
            pending: VecDeque::new(),
        }
    }

    fn emit(&mut self, snapshot: ProgressSnapshot) {
        if self.tx.is_closed() {
            debug!("Progress receiver gone");
            self.pending.clear();
            return;
        }
        self.pending.push_back(snapshot);
        while let Some(next) = self.pending.pop_front() {
            match self.tx.try_send(next) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(s)) => {
                    self.pending.push_front(s);
                    debug!(queued = self.pending.len(), "Progress channel full, queueing snapshot");
                    break;
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Progress receiver gone");
                    self.pending.clear();
                }
            }
        }
    }

    /// Last chance for queued snapshots; gives up after one timeout.
    async fn finish(mut self) {
        while let Some(next) = self.pending.pop_front() {
            if let Err(e) = self.tx.send_timeout(next, PROGRESS_FLUSH_TIMEOUT).await {
                warn!(
                    dropped = self.pending.len() + 1,
                    error = %e,
                    "Could not deliver queued progress snapshots"
                );
                return;
            }
        }
    }
}
