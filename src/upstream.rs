use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::catalog::UpstreamRequest;
use crate::Result;

/// Status and decoded JSON body of an upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: u16,
    pub body: Value,
}

impl UpstreamReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The one outbound call a proxied request makes.
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<UpstreamReply>;
}

/// Real upstream over HTTPS. No retries and no timeout beyond reqwest's
/// defaults.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    http_client: Client,
}

impl HttpUpstream {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("video-search-proxy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http_client })
    }

    pub fn with_client(http_client: Client) -> Self {
        Self { http_client }
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &UpstreamRequest) -> Result<UpstreamReply> {
        let response = self
            .http_client
            .get(request.url.clone())
            .send()
            .await?;

        let status = response.status().as_u16();
        debug!(status, url = %request.redacted(), "upstream responded");

        let body = response.json::<Value>().await?;
        Ok(UpstreamReply { status, body })
    }
}
