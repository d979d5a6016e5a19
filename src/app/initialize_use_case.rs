use serde::Serialize;
use std::fmt;
use tracing::{error, info, instrument};

use crate::app::ports::ResourceFetcher;
use crate::app::session::Session;
use crate::config::AppOptions;
use crate::error::{FlowMapError, Result};
use crate::pipeline::Pipeline;
use crate::render::config_store::ConfigStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ResourceUnavailable,
    NoData,
    Config,
    Internal,
}

/// The single user-visible error produced when startup cannot complete
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartupFailure {
    pub kind: FailureKind,
    pub message: String,
    pub retry_hint: String,
}

impl StartupFailure {
    pub fn from_error(err: &FlowMapError) -> Self {
        let (kind, retry_hint) = match err {
            FlowMapError::ResourceUnavailable { .. } => (
                FailureKind::ResourceUnavailable,
                "Check that the data files exist and are reachable, then reload.",
            ),
            FlowMapError::EmptyDataset { .. } => (
                FailureKind::NoData,
                "Check that flows reference known location ids, or relax minFlow/maxDistance.",
            ),
            FlowMapError::Config(_) | FlowMapError::Toml(_) => (
                FailureKind::Config,
                "Fix the configuration and reload.",
            ),
            FlowMapError::Io(_) | FlowMapError::Json(_) => (FailureKind::Internal, "Reload to try again."),
        };
        Self {
            kind,
            message: err.to_string(),
            retry_hint: retry_hint.to_string(),
        }
    }
}

impl fmt::Display for StartupFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.retry_hint)
    }
}

#[derive(Debug)]
pub enum Startup {
    Ready(Session),
    Failed(StartupFailure),
}

/// Runs load, parse, filter and normalize, and yields a session or a failure.
pub struct InitializeUseCase {
    fetcher: Box<dyn ResourceFetcher>,
}

impl InitializeUseCase {
    pub fn new(fetcher: Box<dyn ResourceFetcher>) -> Self {
        Self { fetcher }
    }

    /// Build a session. The first layer description is built here so a
    /// session never exists without a renderable flow set.
    #[instrument(skip_all, fields(locations = %options.locations_file, flows = %options.flows_file))]
    pub async fn initialize(&self, options: &AppOptions) -> Result<Session> {
        let data = Pipeline::load(self.fetcher.as_ref(), &options.locations_file, &options.flows_file).await?;

        let filter_options = options.filter_options();
        let derived = Pipeline::derive(&data, &filter_options)?;

        let config = ConfigStore::with_defaults(options.initial_render_config());
        let session = Session::new(data, filter_options, derived, options.view(), config);
        session.layer_description()?;

        info!("Session ready with {} flows", session.flows().len());
        Ok(session)
    }

    pub async fn run(&self, options: &AppOptions) -> Startup {
        match self.initialize(options).await {
            Ok(session) => Startup::Ready(session),
            Err(e) => {
                error!("Startup failed: {}", e);
                Startup::Failed(StartupFailure::from_error(&e))
            }
        }
    }
}
