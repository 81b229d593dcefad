//! Access to the ARTAC backend.
//!
//! The session is generic over [`RemoteService`] so that it can be driven by
//! the real HTTP client ([`HttpRemote`]) or by an in-process double.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;

use artac_shared::protocol::{
    AgentDto, CeoChatRequest, CeoChatResponse, ChannelDto, MessageDto, SendMessageRequest,
};
use artac_shared::types::ChannelId;

use crate::error::{ClientError, RemoteError};

/// Operations the session needs from the backend.
pub trait RemoteService: Send + Sync + 'static {
    /// `GET /health`; any 2xx is healthy.
    fn health(&self) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// `GET /agents`
    fn fetch_agents(&self) -> impl Future<Output = Result<Vec<AgentDto>, RemoteError>> + Send;

    /// `GET /channels`
    fn fetch_channels(&self) -> impl Future<Output = Result<Vec<ChannelDto>, RemoteError>> + Send;

    /// `GET /channels/{id}/messages`
    fn fetch_messages(
        &self,
        channel_id: &ChannelId,
    ) -> impl Future<Output = Result<Vec<MessageDto>, RemoteError>> + Send;

    /// `POST /channels/{id}/messages`
    fn post_message(
        &self,
        channel_id: &ChannelId,
        body: &SendMessageRequest,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// `POST /ceo/chat`
    fn ceo_chat(
        &self,
        body: &CeoChatRequest,
    ) -> impl Future<Output = Result<CeoChatResponse, RemoteError>> + Send;
}

/// [`RemoteService`] over HTTP/JSON.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpRemote {
    /// Build a client for `base_url`. Every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "API URL must start with http:// or https://, got {base_url:?}"
            )));
        }

        let base_url = Url::parse(&base_url)
            .map_err(|e| ClientError::Config(format!("invalid API URL {base_url:?}: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RemoteError::from)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Endpoint URL below the base. Each segment is percent-encoded, so ids
    /// containing `/`, `?` or spaces stay a single path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn messages_url(&self, channel_id: &ChannelId) -> Url {
        self.url(&["channels", channel_id.as_str(), "messages"])
    }

    async fn get_json<T: DeserializeOwned>(&self, endpoint: &str, url: Url) -> Result<T, RemoteError> {
        let resp = self.client.get(url).send().await?;
        let resp = check_status(endpoint, resp)?;
        Ok(resp.json().await?)
    }

    async fn post_json<B: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        url: Url,
        body: &B,
    ) -> Result<reqwest::Response, RemoteError> {
        let resp = self.client.post(url).json(body).send().await?;
        check_status(endpoint, resp)
    }
}

fn check_status(path: &str, resp: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = resp.status();
    if !status.is_success() {
        return Err(RemoteError::Status {
            endpoint: path.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

impl RemoteService for HttpRemote {
    async fn health(&self) -> Result<(), RemoteError> {
        let resp = self.client.get(self.url(&["health"])).send().await?;
        check_status("/health", resp).map(|_| ())
    }

    async fn fetch_agents(&self) -> Result<Vec<AgentDto>, RemoteError> {
        self.get_json("/agents", self.url(&["agents"])).await
    }

    async fn fetch_channels(&self) -> Result<Vec<ChannelDto>, RemoteError> {
        self.get_json("/channels", self.url(&["channels"])).await
    }

    async fn fetch_messages(&self, channel_id: &ChannelId) -> Result<Vec<MessageDto>, RemoteError> {
        let endpoint = format!("/channels/{channel_id}/messages");
        self.get_json(&endpoint, self.messages_url(channel_id)).await
    }

    async fn post_message(
        &self,
        channel_id: &ChannelId,
        body: &SendMessageRequest,
    ) -> Result<(), RemoteError> {
        let endpoint = format!("/channels/{channel_id}/messages");
        self.post_json(&endpoint, self.messages_url(channel_id), body)
            .await
            .map(|_| ())
    }

    async fn ceo_chat(&self, body: &CeoChatRequest) -> Result<CeoChatResponse, RemoteError> {
        let resp = self.post_json("/ceo/chat", self.url(&["ceo", "chat"]), body).await?;
        Ok(resp.json().await?)
    }
}
