use async_trait::async_trait;

/// Fetches the raw bytes behind a resource identifier (path or URL).
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch(&self, resource: &str) -> Result<FetchResult, String>;
}

#[derive(Clone, Debug)]
pub struct FetchResult {
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
