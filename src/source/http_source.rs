use std::collections::HashMap;
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, RequestBuilder};
use tracing::{debug, warn};

use super::traits::RemoteSource;

const USER_AGENT: &str = concat!("stellar-launch-engine/", env!("CARGO_PKG_VERSION"));

pub struct HttpSource {
    client: Client,
    headers: HashMap<String, String>,
}

impl HttpSource {
    pub fn new(timeout: Duration) -> Result<Self> {
        Self::with_headers(timeout, HashMap::new())
    }

    /// Build a source that attaches `headers` to every request.
    pub fn with_headers(timeout: Duration, headers: HashMap<String, String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, headers })
    }

    fn build_request(&self, url: &str) -> RequestBuilder {
        let mut req = self.client.get(url);
        for (k, v) in &self.headers {
            req = req.header(k.as_str(), v.as_str());
        }
        req
    }
}

#[async_trait]
impl RemoteSource for HttpSource {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        let resp = self.build_request(url).send().await?;

        let status = resp.status();
        if !status.is_success() {
            warn!("http fetch failed status={} url={}", status.as_u16(), url);
            return Err(anyhow!("HTTP {}", status.as_u16()));
        }

        let bytes = resp.bytes().await?;
        debug!("http fetch url={} bytes={}", url, bytes.len());
        Ok(bytes)
    }
}
