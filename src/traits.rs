use async_trait::async_trait;

use crate::api::{Channel, DeleteResponse, Lookup, PageResponse, User};
use crate::error::ApiError;

/// The slice of the chat REST API a clearance run needs.
///
/// `Err` means the request did not produce an HTTP response we could read;
/// every HTTP status is reported through the `Ok` variants.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// `GET /users/@me`
    async fn current_user(&self) -> Result<Lookup<User>, ApiError>;

    /// `GET /channels/{channel_id}`
    async fn channel(&self, channel_id: &str) -> Result<Lookup<Channel>, ApiError>;

    /// `GET /channels/{channel_id}/messages?limit&before`, newest first.
    async fn list_messages(
        &self,
        channel_id: &str,
        before: Option<String>,
        limit: u32,
    ) -> Result<PageResponse, ApiError>;

    /// `DELETE /channels/{channel_id}/messages/{message_id}`
    async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<DeleteResponse, ApiError>;
}
