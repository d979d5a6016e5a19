use crate::app::ports::{FetchResult, ResourceFetcher};
use async_trait::async_trait;
use std::io::ErrorKind;

/// Reads resources from the local filesystem.
///
/// A missing file is reported as a 404 so the loader treats it like any
/// other non-success fetch.
pub struct FileFetcher;

#[async_trait]
impl ResourceFetcher for FileFetcher {
    async fn fetch(&self, resource: &str) -> Result<FetchResult, String> {
        let path = resource.strip_prefix("file://").unwrap_or(resource);
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                tracing::debug!("Read {} bytes from {}", bytes.len(), path);
                Ok(FetchResult {
                    status: 200,
                    bytes,
                    content_type: "text/csv".to_string(),
                })
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FetchResult {
                status: 404,
                bytes: Vec::new(),
                content_type: "text/plain".to_string(),
            }),
            Err(e) => Err(format!("{}: {}", path, e)),
        }
    }
}
