//! Bulk-delete a user's own messages from one direct-message channel.
//!
//! A run validates the token and channel, pages backward through the
//! channel history collecting the user's messages, then deletes them one by
//! one. Both phases are paced by a [`RateLimiter`] and back off when the
//! server throttles.
//!
//! ```no_run
//! use dmsweep::{ClearanceConfig, ClearanceOrchestrator, ProgressSnapshot};
//!
//! # async fn run() {
//! let orchestrator = ClearanceOrchestrator::new(ClearanceConfig::default());
//! let (tx, mut rx) = tokio::sync::mpsc::channel::<ProgressSnapshot>(16);
//! tokio::spawn(async move {
//!     while let Some(p) = rx.recv().await {
//!         println!("{}/{} processed", p.total_processed, p.total_found);
//!     }
//! });
//! let result = orchestrator
//!     .clear_channel("123456789", "token", "987654321", Some(tx))
//!     .await;
//! println!("deleted {} messages", result.deleted_count);
//! # }
//! ```

pub mod api;
pub mod clearance;
pub mod config;
pub mod constants;
pub mod deleter;
pub mod discord;
pub mod error;
pub mod fetcher;
pub mod rate_limiter;
pub mod stats;
pub mod traits;

pub use clearance::{ClearanceOrchestrator, ClearanceResult, ProgressSnapshot};
pub use config::ClearanceConfig;
pub use discord::DiscordApi;
pub use error::{ApiError, ConfigError, ValidationError};
pub use rate_limiter::RateLimiter;
pub use stats::LimiterStats;
pub use traits::ChatApi;
