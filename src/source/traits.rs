use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Read-only access to the distribution service.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// GET `url` and return the full response body.
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}
