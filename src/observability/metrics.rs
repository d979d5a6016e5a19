//! Metrics for the flowmap pipeline
//!
//! Metric names live in one enum so call sites never spell raw strings.
//! Recording functions are grouped by pipeline phase.

use std::fmt;
use std::sync::Once;
use tracing::{info, warn};

use crate::constants::METRICS_ADDR_ENV_VAR;

/// Enum representing all metric names used in the system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricName {
    // Loader metrics
    LoaderResourcesLoaded,
    LoaderResourcesFailed,
    LoaderDuration,
    LoaderBytes,

    // Parser metrics
    ParserRowsAccepted,
    ParserRowsRejected,
    ParserDuplicateIds,

    // Filter metrics
    FilterFlowsKept,
    FilterDanglingReferences,
    FilterSelfLoops,
    FilterDistancePruned,
    FilterMagnitudeClamped,

    // Config metrics
    ConfigKnobSet,
    ConfigResets,
    ConfigLayerBuilds,
}

impl MetricName {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricName::LoaderResourcesLoaded => "flowmap_loader_resources_loaded_total",
            MetricName::LoaderResourcesFailed => "flowmap_loader_resources_failed_total",
            MetricName::LoaderDuration => "flowmap_loader_duration_seconds",
            MetricName::LoaderBytes => "flowmap_loader_bytes",

            MetricName::ParserRowsAccepted => "flowmap_parser_rows_accepted_total",
            MetricName::ParserRowsRejected => "flowmap_parser_rows_rejected_total",
            MetricName::ParserDuplicateIds => "flowmap_parser_duplicate_ids_total",

            MetricName::FilterFlowsKept => "flowmap_filter_flows_kept_total",
            MetricName::FilterDanglingReferences => "flowmap_filter_dangling_references_total",
            MetricName::FilterSelfLoops => "flowmap_filter_self_loops_total",
            MetricName::FilterDistancePruned => "flowmap_filter_distance_pruned_total",
            MetricName::FilterMagnitudeClamped => "flowmap_filter_magnitude_clamped_total",

            MetricName::ConfigKnobSet => "flowmap_config_knob_set_total",
            MetricName::ConfigResets => "flowmap_config_resets_total",
            MetricName::ConfigLayerBuilds => "flowmap_config_layer_builds_total",
        }
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

static INIT: Once = Once::new();

/// Install the Prometheus recorder.
///
/// Idempotent. Starts an HTTP exporter only when `FLOWMAP_METRICS_ADDR` is set;
/// otherwise metrics are recorded in-process. Must run inside a tokio runtime.
pub fn init_metrics() {
    INIT.call_once(|| {
        let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
        match std::env::var(METRICS_ADDR_ENV_VAR) {
            Ok(addr_str) if !addr_str.trim().is_empty() => {
                match addr_str.trim().parse::<std::net::SocketAddr>() {
                    Ok(addr) => match builder.with_http_listener(addr).install() {
                        Ok(()) => info!("Prometheus HTTP exporter started at http://{}/metrics", addr),
                        Err(e) => warn!("Failed to install Prometheus exporter: {}", e),
                    },
                    Err(_) => warn!("Invalid metrics addr '{}', exporter disabled", addr_str),
                }
            }
            _ => match builder.install_recorder() {
                Ok(_handle) => info!("Prometheus recorder installed (no HTTP listener)"),
                Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
            },
        }
    });
}

pub mod loader {
    use super::MetricName;

    pub fn resource_loaded(dataset: &str, bytes: usize, duration_secs: f64) {
        ::metrics::counter!(MetricName::LoaderResourcesLoaded.as_str(), "dataset" => dataset.to_string())
            .increment(1);
        ::metrics::histogram!(MetricName::LoaderBytes.as_str(), "dataset" => dataset.to_string())
            .record(bytes as f64);
        ::metrics::histogram!(MetricName::LoaderDuration.as_str(), "dataset" => dataset.to_string())
            .record(duration_secs);
    }

    pub fn resource_failed(dataset: &str) {
        ::metrics::counter!(MetricName::LoaderResourcesFailed.as_str(), "dataset" => dataset.to_string())
            .increment(1);
    }
}

pub mod parser {
    use super::MetricName;
    use crate::pipeline::processing::parser::ParseReport;

    pub fn report_recorded(dataset: &str, report: &ParseReport) {
        ::metrics::counter!(MetricName::ParserRowsAccepted.as_str(), "dataset" => dataset.to_string())
            .increment(report.accepted as u64);
        ::metrics::counter!(MetricName::ParserRowsRejected.as_str(), "dataset" => dataset.to_string())
            .increment(report.rejected.len() as u64);
        ::metrics::counter!(MetricName::ParserDuplicateIds.as_str(), "dataset" => dataset.to_string())
            .increment(report.duplicates as u64);
    }
}

pub mod filter {
    use super::MetricName;
    use crate::pipeline::processing::filter::FilterReport;

    pub fn report_recorded(report: &FilterReport) {
        ::metrics::counter!(MetricName::FilterFlowsKept.as_str()).increment(report.kept as u64);
        ::metrics::counter!(MetricName::FilterDanglingReferences.as_str()).increment(report.dangling as u64);
        ::metrics::counter!(MetricName::FilterSelfLoops.as_str()).increment(report.self_loops as u64);
        ::metrics::counter!(MetricName::FilterDistancePruned.as_str()).increment(report.too_far as u64);
        ::metrics::counter!(MetricName::FilterMagnitudeClamped.as_str()).increment(report.clamped as u64);
    }
}

pub mod config {
    use super::MetricName;

    pub fn knob_set(knob: &'static str) {
        ::metrics::counter!(MetricName::ConfigKnobSet.as_str(), "knob" => knob).increment(1);
    }

    pub fn reset() {
        ::metrics::counter!(MetricName::ConfigResets.as_str()).increment(1);
    }

    pub fn layer_built() {
        ::metrics::counter!(MetricName::ConfigLayerBuilds.as_str()).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_share_prefix() {
        let names = [
            MetricName::LoaderResourcesLoaded,
            MetricName::ParserRowsRejected,
            MetricName::FilterDanglingReferences,
            MetricName::ConfigResets,
        ];
        for name in names {
            assert!(name.as_str().starts_with("flowmap_"));
            assert_eq!(name.to_string(), name.as_str());
        }
    }

    #[test]
    fn test_counters_end_with_total() {
        assert!(MetricName::FilterDistancePruned.as_str().ends_with("_total"));
        assert!(MetricName::ConfigKnobSet.as_str().ends_with("_total"));
    }
}
