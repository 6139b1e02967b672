use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::COOKIE;

use super::{FormRequest, HttpResponse, HttpTransport};

const REQUEST_TIMEOUT_SECS: u64 = 15;

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn post_form(&self, request: FormRequest) -> Result<HttpResponse> {
        let mut builder = self.client.post(&request.url).form(&request.fields);

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(cookies) = request.credentials.as_deref().filter(|c| !c.is_empty()) {
            builder = builder.header(COOKIE, cookies);
        }

        let response = builder
            .send()
            .await
            .with_context(|| format!("POST {} failed", request.url))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .with_context(|| format!("failed to read response body from {}", request.url))?;

        Ok(HttpResponse { status, body })
    }
}
