use crate::constants::{MAX_SPEED, MIN_SPEED};
use crate::domain::FilteredFlow;
use crate::error::{FlowMapError, Result};

/// Linear map from a flow's count to its animation speed, scaled against the
/// largest count in one flow set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedScale {
    pub max_count: u64,
}

impl SpeedScale {
    /// Fails with `EmptyDataset` when there is no flow to take a maximum over.
    pub fn from_flows(flows: &[FilteredFlow]) -> Result<Self> {
        flows
            .iter()
            .map(FilteredFlow::count)
            .max()
            .map(|max_count| Self { max_count })
            .ok_or_else(|| FlowMapError::empty("cannot derive animation speed from an empty flow set"))
    }

    /// `MIN_SPEED + (count / max_count) * (MAX_SPEED - MIN_SPEED)`, clamped to the speed range.
    /// A set whose counts are all zero animates every flow at `MIN_SPEED`.
    pub fn speed_for(&self, count: u64) -> f64 {
        if self.max_count == 0 {
            return MIN_SPEED;
        }
        (MIN_SPEED + self.ratio(count) * (MAX_SPEED - MIN_SPEED)).clamp(MIN_SPEED, MAX_SPEED)
    }

    /// `count / max_count` in `[0, 1]`; zero when every count is zero.
    pub fn ratio(&self, count: u64) -> f64 {
        if self.max_count == 0 {
            return 0.0;
        }
        (count as f64 / self.max_count as f64).clamp(0.0, 1.0)
    }
}

/// Animation speed of `flow` relative to the maximum count in `all`.
///
/// Computed on every call. Fails with `EmptyDataset` if `all` is empty.
pub fn animation_speed(flow: &FilteredFlow, all: &[FilteredFlow]) -> Result<f64> {
    Ok(SpeedScale::from_flows(all)?.speed_for(flow.count()))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Flow, Location};

    fn filtered(count: u64) -> FilteredFlow {
        FilteredFlow {
            flow: Flow::new("A", "B", count),
            origin: Location::new("A", 0.0, 0.0),
            dest: Location::new("B", 0.0, 1.0),
            distance_km: 111.19,
            display_magnitude: count.max(1),
        }
    }

    #[test]
    fn test_speed_endpoints() {
        let flows = vec![filtered(0), filtered(50), filtered(100)];
        assert_eq!(animation_speed(&flows[0], &flows).unwrap(), MIN_SPEED);
        assert!((animation_speed(&flows[1], &flows).unwrap() - 1.05).abs() < 1e-12);
        assert!((animation_speed(&flows[2], &flows).unwrap() - MAX_SPEED).abs() < 1e-12);
    }

    #[test]
    fn test_speed_is_monotone_and_bounded() {
        let flows: Vec<FilteredFlow> = [7, 0, 3, 250, 3, 99, 1].into_iter().map(filtered).collect();
        let scale = SpeedScale::from_flows(&flows).unwrap();

        let mut by_count = flows.clone();
        by_count.sort_by_key(|f| f.count());
        for pair in by_count.windows(2) {
            assert!(scale.speed_for(pair[0].count()) <= scale.speed_for(pair[1].count()));
        }
        for f in &flows {
            let speed = animation_speed(f, &flows).unwrap();
            assert!((MIN_SPEED..=MAX_SPEED).contains(&speed));
        }
    }

    #[test]
    fn test_empty_set_is_an_error() {
        let lone = filtered(5);
        let err = animation_speed(&lone, &[]).unwrap_err();
        assert!(matches!(err, FlowMapError::EmptyDataset { .. }));
    }

    #[test]
    fn test_all_zero_counts_use_min_speed() {
        let flows = vec![filtered(0), filtered(0)];
        for f in &flows {
            assert_eq!(animation_speed(f, &flows).unwrap(), MIN_SPEED);
        }
    }
}
