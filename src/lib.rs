// Application layer: startup use case, session and ports
pub mod app;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod geo;
// Adapters behind the app ports
pub mod infra;
pub mod observability;
pub mod pipeline;
pub mod render;
