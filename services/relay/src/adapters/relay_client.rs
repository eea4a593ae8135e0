use async_trait::async_trait;
use careerhub_core::domain::Method;
use careerhub_core::ports::{PortError, PortResult, RelayCall, RelayReply, RelayService};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

/// Talks to the relay the way a browser would: same base URL for every call
/// and a cookie jar that keeps whatever the relay sets.
pub struct HttpRelayClient {
    client: Client,
    base_url: String,
}

impl HttpRelayClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RelayService for HttpRelayClient {
    async fn send(&self, call: RelayCall) -> PortResult<RelayReply> {
        let url = format!("{}{}", self.base_url, call.endpoint.path());

        let mut builder = match call.endpoint.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header(ACCEPT, "application/json");
        if let Some(body) = &call.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(RelayReply {
            status,
            content_type,
            body,
        })
    }
}
