use std::time::Duration;

/// Default REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Default pause before each history page request, in milliseconds.
pub const DEFAULT_SEARCH_DELAY_MS: u64 = 1000;

/// Default pause before each message deletion, in milliseconds.
pub const DEFAULT_DELETE_DELAY_MS: u64 = 1000;

/// Default number of attempts per message deletion.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Messages requested per history page (API maximum).
pub(crate) const PAGE_SIZE: u32 = 100;

/// A progress snapshot is emitted every this many processed messages.
pub(crate) const PROGRESS_EVERY: u64 = 10;

/// How long the end of a run waits to hand over queued progress snapshots.
pub(crate) const PROGRESS_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Used when a throttling response carries no `retry_after`.
pub(crate) const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

/// Upper bound on any server-directed wait.
pub(crate) const MAX_RETRY_AFTER: Duration = Duration::from_secs(3600);

/// Pause before retrying a deletion that failed at the transport level.
pub(crate) const TRANSPORT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Channel kind of a one-to-one direct-message channel.
pub(crate) const DM_CHANNEL_KIND: u32 = 1;

/// Message kind of an ordinary user message.
pub(crate) const MESSAGE_KIND_DEFAULT: u32 = 0;

/// Message kind of the "pinned a message" system notice.
pub(crate) const MESSAGE_KIND_PIN_NOTICE: u32 = 6;

/// Weight kept from the previous latency average on each new sample.
pub(crate) const PING_DECAY: f64 = 0.9;
