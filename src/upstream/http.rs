//! reqwest-backed upstream

use async_trait::async_trait;
use std::time::Duration;

use crate::common::config::HttpConfig;
use crate::common::{Error, Result};

use super::{PageRequest, PageResponse, Upstream};

/// Sends page requests to the real backend over HTTP
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build a client from the HTTP configuration
    pub fn new(config: &HttpConfig, request_timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(request_timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn fetch(&self, request: &PageRequest) -> Result<PageResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::upstream(&request.url, e))?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        tracing::trace!(method = %request.method, url = %request.url, "upstream request");
        let response = builder
            .send()
            .await
            .map_err(|e| Error::upstream(&request.url, e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::upstream(&request.url, e))?
            .to_vec();

        tracing::debug!(url = %request.url, status, bytes = body.len(), "upstream response");
        Ok(PageResponse {
            status,
            headers,
            body,
        })
    }
}
