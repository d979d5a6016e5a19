use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowMapError {
    #[error("Resource '{resource}' is unavailable: {reason}")]
    ResourceUnavailable { resource: String, reason: String },

    #[error("No data: {context}")]
    EmptyDataset { context: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),
}

impl FlowMapError {
    pub fn unavailable(resource: impl Into<String>, reason: impl Into<String>) -> Self {
        FlowMapError::ResourceUnavailable {
            resource: resource.into(),
            reason: reason.into(),
        }
    }

    pub fn empty(context: impl Into<String>) -> Self {
        FlowMapError::EmptyDataset {
            context: context.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FlowMapError>;
