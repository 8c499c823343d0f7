use async_trait::async_trait;

use cleovent_core::FlowError;

#[derive(Debug, Clone)]
pub struct HttpRequest<'a> {
    /// Service label used in errors and logs.
    pub service: &'static str,
    pub url: &'a str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One-shot GET. The caller bounds the call with the REST timeout.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, FlowError>;
}

/// `reqwest` transport. Connection pooling is left to the client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, request: &HttpRequest<'_>) -> Result<HttpResponse, FlowError> {
        let service = request.service;
        let response = self
            .client
            .get(request.url)
            .send()
            .await
            .map_err(|e| transport_error(service, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| transport_error(service, e))?;
        Ok(HttpResponse { status, body })
    }
}

fn transport_error(service: &'static str, e: reqwest::Error) -> FlowError {
    // reqwest errors carry the URL, which holds the access token
    let e = e.without_url();
    FlowError::Transport {
        service,
        status: e.status().map(|s| s.as_u16()),
        message: e.to_string(),
    }
}
