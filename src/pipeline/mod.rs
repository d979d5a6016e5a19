// Data pipeline: ingestion (tabular loading) and processing (parse, filter, normalize)

pub mod ingestion;
pub mod processing;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::app::ports::ResourceFetcher;
use crate::constants::{FLOWS_DATASET, LOCATIONS_DATASET};
use crate::domain::{Flow, Location};
use crate::error::{FlowMapError, Result};
use crate::observability::metrics;
use processing::filter::{filter_flows, FilterOptions, FilterOutcome, FilterReport};
use processing::parser::{parse_flows, parse_locations, ParseReport, ParsedFlows, ParsedLocations};

/// Parsed datasets as loaded at startup. Immutable once built.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub locations: Vec<Location>,
    pub flows: Vec<Flow>,
    pub location_report: ParseReport,
    pub flow_report: ParseReport,
    pub loaded_at: DateTime<Utc>,
}

impl LoadedData {
    pub fn from_parsed(locations: ParsedLocations, flows: ParsedFlows) -> Self {
        metrics::parser::report_recorded(LOCATIONS_DATASET, &locations.report);
        metrics::parser::report_recorded(FLOWS_DATASET, &flows.report);
        for (dataset, report) in [(LOCATIONS_DATASET, &locations.report), (FLOWS_DATASET, &flows.report)] {
            if !report.rejected.is_empty() {
                warn!("{}: dropped {} of {} rows", dataset, report.rejected.len(), report.total_rows);
            }
        }
        Self {
            locations: locations.locations,
            flows: flows.flows,
            location_report: locations.report,
            flow_report: flows.report,
            loaded_at: Utc::now(),
        }
    }
}

/// Summary of one pipeline run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineSummary {
    pub locations: usize,
    pub locations_rejected: usize,
    pub duplicate_location_ids: usize,
    pub flows: usize,
    pub flows_rejected: usize,
    pub filter: FilterReport,
    pub loaded_at: DateTime<Utc>,
}

impl PipelineSummary {
    pub fn new(data: &LoadedData, derived: &FilterOutcome) -> Self {
        Self {
            locations: data.locations.len(),
            locations_rejected: data.location_report.rejected.len(),
            duplicate_location_ids: data.location_report.duplicates,
            flows: data.flows.len(),
            flows_rejected: data.flow_report.rejected.len(),
            filter: derived.report,
            loaded_at: data.loaded_at,
        }
    }
}

pub struct Pipeline;

impl Pipeline {
    /// Fetch and parse both datasets. The two fetches run concurrently.
    #[instrument(skip(fetcher))]
    pub async fn load(
        fetcher: &dyn ResourceFetcher,
        locations_resource: &str,
        flows_resource: &str,
    ) -> Result<LoadedData> {
        let (location_table, flow_table) = tokio::try_join!(
            ingestion::load(fetcher, locations_resource, LOCATIONS_DATASET),
            ingestion::load(fetcher, flows_resource, FLOWS_DATASET),
        )?;

        let data = LoadedData::from_parsed(parse_locations(&location_table), parse_flows(&flow_table));
        info!(
            "Parsed {} locations and {} flows",
            data.locations.len(),
            data.flows.len()
        );
        Ok(data)
    }

    /// Derive the filtered flow set. An empty result is an `EmptyDataset` error.
    pub fn derive(data: &LoadedData, opts: &FilterOptions) -> Result<FilterOutcome> {
        let outcome = filter_flows(&data.flows, &data.locations, opts);
        metrics::filter::report_recorded(&outcome.report);
        if outcome.is_empty() {
            return Err(FlowMapError::empty(format!(
                "none of the {} flows reference two known locations within the configured limits",
                data.flows.len()
            )));
        }
        Ok(outcome)
    }
}
