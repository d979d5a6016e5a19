use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, instrument};

use crate::constants::DEFAULT_MIN_FLOW_THRESHOLD;
use crate::domain::{FilteredFlow, Flow, Location};
use crate::geo::distance_between;

/// Options controlling which flows survive validation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    /// Drop flows longer than this great-circle distance. `None` disables the check.
    pub max_distance_km: Option<f64>,
    /// Visual floor applied to every surviving flow's display magnitude.
    /// Never below `DEFAULT_MIN_FLOW_THRESHOLD`.
    pub min_flow_threshold: u64,
    /// Drop flows whose origin equals their destination
    pub drop_self_loops: bool,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            max_distance_km: None,
            min_flow_threshold: DEFAULT_MIN_FLOW_THRESHOLD,
            drop_self_loops: false,
        }
    }
}

impl FilterOptions {
    pub fn with_max_distance(mut self, km: Option<f64>) -> Self {
        self.max_distance_km = km;
        self
    }

    pub fn with_min_flow_threshold(mut self, threshold: u64) -> Self {
        self.min_flow_threshold = threshold.max(DEFAULT_MIN_FLOW_THRESHOLD);
        self
    }
}

/// Counts of what the filter removed or adjusted.
///
/// Dangling references are an expected outcome and are only ever counted here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FilterReport {
    pub input: usize,
    pub dangling: usize,
    pub self_loops: usize,
    pub too_far: usize,
    pub clamped: usize,
    pub kept: usize,
}

#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub flows: Vec<FilteredFlow>,
    pub report: FilterReport,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    /// The raw flows that survived, suitable for re-filtering.
    pub fn raw_flows(&self) -> Vec<Flow> {
        self.flows.iter().map(|f| f.flow.clone()).collect()
    }
}

/// Join flows against the known locations, prune by distance and clamp magnitudes.
///
/// The identity join runs first so distance is only ever computed between
/// resolved locations. Output preserves input order.
#[instrument(skip_all, fields(flows = flows.len(), locations = locations.len()))]
pub fn filter_flows(flows: &[Flow], locations: &[Location], opts: &FilterOptions) -> FilterOutcome {
    let by_id: HashMap<&str, &Location> = locations.iter().map(|l| (l.id.as_str(), l)).collect();
    let mut report = FilterReport {
        input: flows.len(),
        ..Default::default()
    };
    let mut kept = Vec::with_capacity(flows.len());
    let floor = opts.min_flow_threshold.max(DEFAULT_MIN_FLOW_THRESHOLD);

    for flow in flows {
        let (origin, dest) = match (by_id.get(flow.origin.as_str()), by_id.get(flow.dest.as_str())) {
            (Some(o), Some(d)) => (*o, *d),
            _ => {
                debug!("Dropping {} -> {}: unknown location", flow.origin, flow.dest);
                report.dangling += 1;
                continue;
            }
        };

        if opts.drop_self_loops && flow.is_self_loop() {
            report.self_loops += 1;
            continue;
        }

        let distance_km = distance_between(origin, dest);
        if let Some(max) = opts.max_distance_km {
            // A NaN threshold keeps nothing
            if !(distance_km <= max) {
                debug!("Dropping {} -> {}: {:.1} km exceeds {} km", flow.origin, flow.dest, distance_km, max);
                report.too_far += 1;
                continue;
            }
        }

        if flow.count < floor {
            report.clamped += 1;
        }

        kept.push(FilteredFlow {
            flow: flow.clone(),
            origin: origin.clone(),
            dest: dest.clone(),
            distance_km,
            display_magnitude: flow.count.max(floor),
        });
    }

    report.kept = kept.len();

    info!(
        "Filtered flows: {} kept of {} ({} dangling, {} self-loops, {} too far, {} clamped)",
        report.kept, report.input, report.dangling, report.self_loops, report.too_far, report.clamped
    );

    FilterOutcome { flows: kept, report }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{MAX_SPEED, MIN_SPEED};
    use crate::pipeline::processing::normalize::animation_speed;

    fn locations() -> Vec<Location> {
        vec![Location::new("A", 0.0, 0.0), Location::new("B", 0.0, 1.0)]
    }

    #[test]
    fn test_dangling_references_are_counted_not_raised() {
        let flows = vec![Flow::new("A", "B", 10), Flow::new("A", "C", 5), Flow::new("Z", "B", 1)];
        let outcome = filter_flows(&flows, &locations(), &FilterOptions::default());

        assert_eq!(outcome.flows.len(), 1);
        assert_eq!(outcome.flows[0].flow, Flow::new("A", "B", 10));
        assert_eq!(outcome.report.dangling, 2);
        assert_eq!(outcome.report.kept, 1);
    }

    #[test]
    fn test_every_survivor_resolves_to_a_known_location() {
        let locs = locations();
        let flows = vec![Flow::new("B", "A", 1), Flow::new("A", "X", 2), Flow::new("A", "A", 3)];
        let outcome = filter_flows(&flows, &locs, &FilterOptions::default());

        for f in &outcome.flows {
            assert!(locs.iter().any(|l| l.id == f.flow.origin && *l == f.origin));
            assert!(locs.iter().any(|l| l.id == f.flow.dest && *l == f.dest));
        }
    }

    #[test]
    fn test_magnitude_floor() {
        let flows = vec![Flow::new("A", "B", 0), Flow::new("B", "A", 7)];
        let opts = FilterOptions::default().with_min_flow_threshold(5);
        let outcome = filter_flows(&flows, &locations(), &opts);

        assert_eq!(outcome.flows[0].display_magnitude, 5);
        assert_eq!(outcome.flows[1].display_magnitude, 7);
        assert_eq!(outcome.report.clamped, 1);
        assert!(outcome.flows.iter().all(|f| f.display_magnitude >= 5));
    }

    #[test]
    fn test_self_loops_only_dropped_on_request() {
        let flows = vec![Flow::new("A", "A", 4), Flow::new("A", "B", 2)];
        let kept = filter_flows(&flows, &locations(), &FilterOptions::default());
        assert_eq!(kept.flows.len(), 2);
        assert_eq!(kept.flows[0].distance_km, 0.0);

        let opts = FilterOptions {
            drop_self_loops: true,
            ..Default::default()
        };
        let dropped = filter_flows(&flows, &locations(), &opts);
        assert_eq!(dropped.flows.len(), 1);
        assert_eq!(dropped.report.self_loops, 1);
    }

    #[test]
    fn test_distance_filter_keeps_order_and_is_idempotent() {
        let locs = vec![
            Location::new("SEA", 47.6062, -122.3321),
            Location::new("PDX", 45.5152, -122.6784),
            Location::new("NYC", 40.7128, -74.0060),
        ];
        let flows = vec![
            Flow::new("PDX", "SEA", 3),
            Flow::new("SEA", "NYC", 9),
            Flow::new("SEA", "PDX", 5),
        ];
        let opts = FilterOptions::default().with_max_distance(Some(500.0));
        let first = filter_flows(&flows, &locs, &opts);

        assert_eq!(first.raw_flows(), vec![Flow::new("PDX", "SEA", 3), Flow::new("SEA", "PDX", 5)]);
        assert_eq!(first.report.too_far, 1);

        let second = filter_flows(&first.raw_flows(), &locs, &opts);
        assert_eq!(second.flows, first.flows);
        assert_eq!(second.report.too_far, 0);
    }

    #[test]
    fn test_speeds_scale_against_survivors_only() {
        let flows = vec![Flow::new("A", "B", 10), Flow::new("B", "A", 5), Flow::new("A", "C", 1000)];
        let outcome = filter_flows(&flows, &locations(), &FilterOptions::default());

        let fastest = animation_speed(&outcome.flows[0], &outcome.flows).unwrap();
        let slower = animation_speed(&outcome.flows[1], &outcome.flows).unwrap();
        assert!((fastest - MAX_SPEED).abs() < 1e-12);
        assert!(slower > MIN_SPEED && slower < MAX_SPEED);
    }

    #[test]
    fn test_zero_threshold_keeps_the_visual_floor() {
        let flows = vec![Flow::new("A", "B", 0)];
        let opts = FilterOptions::default().with_min_flow_threshold(0);
        assert_eq!(opts.min_flow_threshold, 1);

        let raw = FilterOptions {
            min_flow_threshold: 0,
            ..Default::default()
        };
        let outcome = filter_flows(&flows, &locations(), &raw);
        assert_eq!(outcome.flows[0].display_magnitude, 1);
        assert_eq!(outcome.report.clamped, 1);
    }

    #[test]
    fn test_near_antipodal_flow_survives_a_generous_limit() {
        let locs = vec![Location::new("A", 2.5, 0.0), Location::new("B", -2.5, 180.0)];
        let flows = vec![Flow::new("A", "B", 8)];
        let opts = FilterOptions::default().with_max_distance(Some(50_000.0));
        let outcome = filter_flows(&flows, &locs, &opts);

        assert_eq!(outcome.report.kept, 1);
        assert_eq!(outcome.report.too_far, 0);
        assert!(outcome.flows[0].distance_km.is_finite());
    }

    #[test]
    fn test_empty_input_yields_empty_outcome() {
        let outcome = filter_flows(&[], &locations(), &FilterOptions::default());
        assert!(outcome.is_empty());
        assert_eq!(outcome.report, FilterReport::default());
    }
}
