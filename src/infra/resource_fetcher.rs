use crate::app::ports::{FetchResult, ResourceFetcher};
use crate::infra::file_store::FileFetcher;
use crate::infra::http_client::ReqwestFetcher;
use async_trait::async_trait;

/// Routes `http(s)://` resources to the HTTP client and everything else to the filesystem.
pub struct DefaultFetcher {
    http: ReqwestFetcher,
    files: FileFetcher,
}

impl DefaultFetcher {
    pub fn new() -> Self {
        Self {
            http: ReqwestFetcher::new(),
            files: FileFetcher,
        }
    }
}

impl Default for DefaultFetcher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_remote(resource: &str) -> bool {
    let lower = resource.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[async_trait]
impl ResourceFetcher for DefaultFetcher {
    async fn fetch(&self, resource: &str) -> Result<FetchResult, String> {
        if is_remote(resource) {
            self.http.fetch(resource.trim()).await
        } else {
            self.files.fetch(resource).await
        }
    }
}
