use crate::app::ports::{FetchResult, ResourceFetcher};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ResourceFetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResult, String> {
        tracing::info!("HTTP GET request to: {}", url);
        let resp = self
            .client
            .get(url)
            .header("User-Agent", concat!("flowmap/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status().as_u16();
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/plain")
            .to_string();
        let bytes = resp.bytes().await.map_err(|e| e.to_string())?.to_vec();
        tracing::info!("HTTP response: status={}, size={} bytes", status, bytes.len());
        Ok(FetchResult { status, bytes, content_type })
    }
}
