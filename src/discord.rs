use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::api::{parse_retry_after, Channel, DeleteResponse, Lookup, Message, PageResponse, User};
use crate::error::ApiError;
use crate::traits::ChatApi;

/// reqwest-backed [`ChatApi`]. One instance is one HTTP session; the token
/// is sent verbatim in the `Authorization` header.
pub struct DiscordApi {
    http: Client,
    base_url: String,
    token: String,
}

impl DiscordApi {
    pub fn new(base_url: &str, token: &str) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(concat!("dmsweep/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get(&self, url: &str) -> Result<Response, ApiError> {
        Ok(self
            .http
            .get(url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .send()
            .await?)
    }

    async fn lookup<T: DeserializeOwned>(&self, url: &str) -> Result<Lookup<T>, ApiError> {
        let resp = self.get(url).await?;
        let status = resp.status();
        let body = resp.text().await?;
        if status != StatusCode::OK {
            debug!(%status, url, "Lookup failed");
            return Ok(Lookup::Failed {
                status: status.as_u16(),
                body,
            });
        }
        decode(&body).map(Lookup::Found)
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[async_trait]
impl ChatApi for DiscordApi {
    async fn current_user(&self) -> Result<Lookup<User>, ApiError> {
        self.lookup(&format!("{}/users/@me", self.base_url)).await
    }

    async fn channel(&self, channel_id: &str) -> Result<Lookup<Channel>, ApiError> {
        self.lookup(&format!("{}/channels/{channel_id}", self.base_url))
            .await
    }

    async fn list_messages(
        &self,
        channel_id: &str,
        before: Option<String>,
        limit: u32,
    ) -> Result<PageResponse, ApiError> {
        let url = format!("{}/channels/{channel_id}/messages", self.base_url);
        let mut query = vec![("limit", limit.to_string())];
        if let Some(before) = before {
            query.push(("before", before));
        }

        let resp = self
            .http
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .query(&query)
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;

        Ok(match status {
            StatusCode::OK => PageResponse::Page(decode::<Vec<Message>>(&body)?),
            StatusCode::TOO_MANY_REQUESTS => PageResponse::RateLimited {
                retry_after: parse_retry_after(&body),
            },
            StatusCode::ACCEPTED => PageResponse::NotIndexed {
                retry_after: parse_retry_after(&body),
            },
            _ => PageResponse::Failed {
                status: status.as_u16(),
                body,
            },
        })
    }

    async fn delete_message(
        &self,
        channel_id: &str,
        message_id: &str,
    ) -> Result<DeleteResponse, ApiError> {
        let url = format!(
            "{}/channels/{channel_id}/messages/{message_id}",
            self.base_url
        );
        let resp = self
            .http
            .delete(&url)
            .header(reqwest::header::AUTHORIZATION, &self.token)
            .send()
            .await?;
        let status = resp.status();

        Ok(match status {
            StatusCode::OK | StatusCode::NO_CONTENT => DeleteResponse::Deleted,
            StatusCode::TOO_MANY_REQUESTS => DeleteResponse::RateLimited {
                retry_after: parse_retry_after(&resp.text().await?),
            },
            StatusCode::FORBIDDEN | StatusCode::BAD_REQUEST => DeleteResponse::Rejected {
                status: status.as_u16(),
            },
            _ => DeleteResponse::Failed {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn api_for(server: &MockServer) -> DiscordApi {
        DiscordApi::new(&server.uri(), "secret-token").unwrap()
    }

    #[tokio::test]
    async fn test_current_user_sends_token_and_decodes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .and(header("authorization", "secret-token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"id": "42", "username": "me"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let user = api_for(&server).await.current_user().await.unwrap();
        assert_eq!(
            user,
            Lookup::Found(User {
                id: "42".into(),
                username: Some("me".into())
            })
        );
    }

    #[tokio::test]
    async fn test_current_user_unauthorized_is_failed_lookup() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/@me"))
            .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
            .mount(&server)
            .await;

        let user = api_for(&server).await.current_user().await.unwrap();
        assert_eq!(
            user,
            Lookup::Failed {
                status: 401,
                body: "401: Unauthorized".into()
            }
        );
    }

    #[tokio::test]
    async fn test_channel_decodes_kind() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/777"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "777", "type": 1})),
            )
            .mount(&server)
            .await;

        let channel = api_for(&server).await.channel("777").await.unwrap();
        assert_eq!(
            channel,
            Lookup::Found(Channel {
                id: "777".into(),
                kind: 1
            })
        );
    }

    #[tokio::test]
    async fn test_list_messages_passes_cursor() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/777/messages"))
            .and(query_param("limit", "100"))
            .and(query_param("before", "500"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"id": "499", "type": 0, "author": {"id": "42"}},
                {"id": "498", "type": 6, "author": {"id": "43"}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let page = api_for(&server)
            .await
            .list_messages("777", Some("500".into()), 100)
            .await
            .unwrap();
        match page {
            PageResponse::Page(messages) => {
                assert_eq!(messages.len(), 2);
                assert_eq!(messages[1].id, "498");
            }
            other => panic!("expected page, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_messages_classifies_throttling() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1/messages"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(serde_json::json!({"retry_after": 2.5})),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/channels/2/messages"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        assert_eq!(
            api.list_messages("1", None, 100).await.unwrap(),
            PageResponse::RateLimited {
                retry_after: Duration::from_millis(2500)
            }
        );
        assert_eq!(
            api.list_messages("2", None, 100).await.unwrap(),
            PageResponse::NotIndexed {
                retry_after: Duration::from_secs(1)
            }
        );
    }

    #[tokio::test]
    async fn test_list_messages_server_error_is_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1/messages"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let page = api_for(&server)
            .await
            .list_messages("1", None, 100)
            .await
            .unwrap();
        assert_eq!(
            page,
            PageResponse::Failed {
                status: 500,
                body: "boom".into()
            }
        );
    }

    #[tokio::test]
    async fn test_list_messages_bad_body_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/channels/1/messages"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let err = api_for(&server)
            .await
            .list_messages("1", None, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn test_delete_message_status_mapping() {
        let server = MockServer::start().await;
        for (id, status) in [("1", 204), ("2", 200), ("3", 403), ("4", 400), ("5", 404)] {
            Mock::given(method("DELETE"))
                .and(path(format!("/channels/9/messages/{id}")))
                .respond_with(ResponseTemplate::new(status))
                .mount(&server)
                .await;
        }
        Mock::given(method("DELETE"))
            .and(path("/channels/9/messages/6"))
            .respond_with(
                ResponseTemplate::new(429).set_body_json(serde_json::json!({"retry_after": 0.5})),
            )
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        assert_eq!(api.delete_message("9", "1").await.unwrap(), DeleteResponse::Deleted);
        assert_eq!(api.delete_message("9", "2").await.unwrap(), DeleteResponse::Deleted);
        assert_eq!(
            api.delete_message("9", "3").await.unwrap(),
            DeleteResponse::Rejected { status: 403 }
        );
        assert_eq!(
            api.delete_message("9", "4").await.unwrap(),
            DeleteResponse::Rejected { status: 400 }
        );
        assert!(matches!(
            api.delete_message("9", "5").await.unwrap(),
            DeleteResponse::Failed { status: 404, .. }
        ));
        assert_eq!(
            api.delete_message("9", "6").await.unwrap(),
            DeleteResponse::RateLimited {
                retry_after: Duration::from_millis(500)
            }
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Nothing listens on port 9 locally.
        let api = DiscordApi::new("http://127.0.0.1:9", "t").unwrap();
        let err = api.delete_message("1", "2").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
