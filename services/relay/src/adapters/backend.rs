use async_trait::async_trait;
use careerhub_core::domain::Method;
use careerhub_core::ports::{BackendGateway, BackendReply, BackendRequest, PortError, PortResult};
use reqwest::header::{ACCEPT, COOKIE, SET_COOKIE};
use reqwest::Client;
use tracing::debug;

/// Forwards relayed requests to the backend origin over HTTP.
///
/// The client deliberately has no cookie store: the only cookies the backend
/// sees are the ones the browser sent to the relay.
pub struct HttpBackendGateway {
    client: Client,
    base_url: String,
}

impl HttpBackendGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }
}

#[async_trait]
impl BackendGateway for HttpBackendGateway {
    async fn forward(&self, request: BackendRequest) -> PortResult<BackendReply> {
        let url = format!("{}{}", self.base_url, request.endpoint.path());
        debug!(endpoint = %request.endpoint, %url, "Forwarding to backend");

        let mut builder = match request.endpoint.method() {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
        }
        .header(ACCEPT, "application/json");

        if let Some(cookie) = request.cookie.as_deref().filter(|c| !c.is_empty()) {
            builder = builder.header(COOKIE, cookie);
        }
        // `json` also sets `Content-Type: application/json`.
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| PortError::Transport(e.to_string()))?;

        let status = response.status().as_u16();
        let set_cookies = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(BackendReply {
            status,
            body,
            set_cookies,
        })
    }
}
