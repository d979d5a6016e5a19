use tracing::{info, instrument, warn};

use crate::domain::{FilteredFlow, Location};
use crate::error::Result;
use crate::pipeline::processing::filter::{FilterOptions, FilterOutcome, FilterReport};
use crate::pipeline::processing::normalize::animation_speed;
use crate::pipeline::{LoadedData, Pipeline, PipelineSummary};
use crate::render::config_store::{ConfigEdit, ConfigState, ConfigStore, RenderConfig};
use crate::render::events::{EventHooks, PickEvent, PickKind, PickTarget};
use crate::render::layers::{LayerDescription, ViewOptions};

/// Application root after a successful startup.
///
/// Owns the loaded datasets, the derived flow set, the config store and the
/// event hooks. All edits go through `&mut self`.
#[derive(Debug)]
pub struct Session {
    data: LoadedData,
    filter_options: FilterOptions,
    derived: FilterOutcome,
    view: ViewOptions,
    config: ConfigStore,
    hooks: EventHooks,
}

impl Session {
    pub(crate) fn new(
        data: LoadedData,
        filter_options: FilterOptions,
        derived: FilterOutcome,
        view: ViewOptions,
        config: ConfigStore,
    ) -> Self {
        Self {
            data,
            filter_options,
            derived,
            view,
            config,
            hooks: EventHooks::new(),
        }
    }

    pub fn locations(&self) -> &[Location] {
        &self.data.locations
    }

    pub fn flows(&self) -> &[FilteredFlow] {
        &self.derived.flows
    }

    pub fn filter_report(&self) -> &FilterReport {
        &self.derived.report
    }

    pub fn filter_options(&self) -> &FilterOptions {
        &self.filter_options
    }

    pub fn view(&self) -> &ViewOptions {
        &self.view
    }

    pub fn config(&self) -> &RenderConfig {
        self.config.current()
    }

    pub fn config_state(&self) -> ConfigState {
        self.config.state()
    }

    pub fn set(&mut self, edit: ConfigEdit) {
        self.config.set(edit);
    }

    pub fn reset_to_default(&mut self) {
        self.config.reset_to_default();
    }

    pub fn layer_description(&self) -> Result<LayerDescription> {
        self.config
            .build_layer_description(&self.derived.flows, &self.data.locations, &self.view)
    }

    /// Animation speed of the flow at `index` within the current derived set.
    pub fn animation_speed(&self, index: usize) -> Option<Result<f64>> {
        self.derived
            .flows
            .get(index)
            .map(|flow| animation_speed(flow, &self.derived.flows))
    }

    /// Re-derive the flow set under a new distance threshold.
    ///
    /// If the new set would be empty the previous set and options stay in place.
    #[instrument(skip(self))]
    pub fn set_max_distance(&mut self, max_distance_km: Option<f64>) -> Result<FilterReport> {
        let options = self.filter_options.clone().with_max_distance(max_distance_km);
        match Pipeline::derive(&self.data, &options) {
            Ok(outcome) => {
                info!("Re-derived {} flows", outcome.flows.len());
                self.filter_options = options;
                self.derived = outcome;
                Ok(self.derived.report)
            }
            Err(e) => {
                warn!("Keeping previous flow set: {}", e);
                Err(e)
            }
        }
    }

    pub fn on_hover(&mut self, handler: impl FnMut(&PickEvent) + Send + 'static) {
        self.hooks.on_hover(handler);
    }

    pub fn on_click(&mut self, handler: impl FnMut(&PickEvent) + Send + 'static) {
        self.hooks.on_click(handler);
    }

    /// Forward an event the renderer has already resolved.
    pub fn forward(&mut self, event: &PickEvent) -> bool {
        self.hooks.dispatch(event)
    }

    /// Resolve a renderer pick against the current layers and forward it.
    pub fn handle_pick(&mut self, kind: PickKind, target: PickTarget<'_>) -> Result<bool> {
        let layers = self.layer_description()?;
        let event = PickEvent::resolve(kind, target, &layers);
        Ok(self.hooks.dispatch(&event))
    }

    pub fn summary(&self) -> PipelineSummary {
        PipelineSummary::new(&self.data, &self.derived)
    }
}
