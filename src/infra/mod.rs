// Infrastructure adapters implementing the application ports

pub mod file_store;
pub mod http_client;
pub mod resource_fetcher;

pub use file_store::FileFetcher;
pub use http_client::ReqwestFetcher;
pub use resource_fetcher::DefaultFetcher;
