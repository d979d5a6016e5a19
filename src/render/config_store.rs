//! Mutable visualization knobs and the store that owns them.
//!
//! Every numeric knob has a fixed range. Assignments are clamped into it,
//! and a NaN assignment stores the knob's default.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

use crate::domain::{FilteredFlow, Location};
use crate::error::{FlowMapError, Result};
use crate::observability::metrics;
use crate::render::color::ColorScheme;
use crate::render::layers::{LayerDescription, ViewOptions};

/// Valid interval and default for one numeric knob
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnobRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl KnobRange {
    pub fn clamp(&self, value: f64) -> f64 {
        if value.is_nan() {
            self.default
        } else {
            value.clamp(self.min, self.max)
        }
    }
}

pub const OPACITY: KnobRange = KnobRange { min: 0.0, max: 1.0, default: 0.8 };
pub const ANIMATION_SPEED: KnobRange = KnobRange { min: 0.1, max: 5.0, default: 1.0 };
pub const MAX_PARTICLES: KnobRange = KnobRange { min: 0.0, max: 10_000.0, default: 1000.0 };
pub const FLOW_THICKNESS: KnobRange = KnobRange { min: 0.5, max: 10.0, default: 2.0 };
pub const POINT_RADIUS: KnobRange = KnobRange { min: 1.0, max: 20.0, default: 4.0 };

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub opacity: f64,
    pub animation_enabled: bool,
    /// Multiplier applied to every flow's animation speed
    pub animation_speed: f64,
    pub max_particles: u32,
    pub flow_thickness: f64,
    pub draw_points: bool,
    pub point_radius: f64,
    pub color_scheme: ColorScheme,
    pub dark_mode: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            opacity: OPACITY.default,
            animation_enabled: true,
            animation_speed: ANIMATION_SPEED.default,
            max_particles: MAX_PARTICLES.default as u32,
            flow_thickness: FLOW_THICKNESS.default,
            draw_points: true,
            point_radius: POINT_RADIUS.default,
            color_scheme: ColorScheme::Default,
            dark_mode: false,
        }
    }
}

impl RenderConfig {
    /// Clamp every numeric knob into its range.
    pub fn sanitized(mut self) -> Self {
        self.opacity = OPACITY.clamp(self.opacity);
        self.animation_speed = ANIMATION_SPEED.clamp(self.animation_speed);
        self.max_particles = clamp_particles(self.max_particles as f64);
        self.flow_thickness = FLOW_THICKNESS.clamp(self.flow_thickness);
        self.point_radius = POINT_RADIUS.clamp(self.point_radius);
        self
    }

    fn apply(&mut self, edit: ConfigEdit) {
        match edit {
            ConfigEdit::Opacity(v) => self.opacity = OPACITY.clamp(v),
            ConfigEdit::AnimationEnabled(v) => self.animation_enabled = v,
            ConfigEdit::AnimationSpeed(v) => self.animation_speed = ANIMATION_SPEED.clamp(v),
            ConfigEdit::MaxParticles(v) => self.max_particles = clamp_particles(v as f64),
            ConfigEdit::FlowThickness(v) => self.flow_thickness = FLOW_THICKNESS.clamp(v),
            ConfigEdit::DrawPoints(v) => self.draw_points = v,
            ConfigEdit::PointRadius(v) => self.point_radius = POINT_RADIUS.clamp(v),
            ConfigEdit::ColorScheme(v) => self.color_scheme = v,
            ConfigEdit::DarkMode(v) => self.dark_mode = v,
        }
    }
}

fn clamp_particles(value: f64) -> u32 {
    MAX_PARTICLES.clamp(value).round() as u32
}

/// One discrete edit to a single knob
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfigEdit {
    Opacity(f64),
    AnimationEnabled(bool),
    AnimationSpeed(f64),
    MaxParticles(i64),
    FlowThickness(f64),
    DrawPoints(bool),
    PointRadius(f64),
    ColorScheme(ColorScheme),
    DarkMode(bool),
}

impl ConfigEdit {
    pub fn knob(&self) -> &'static str {
        match self {
            ConfigEdit::Opacity(_) => "opacity",
            ConfigEdit::AnimationEnabled(_) => "animation_enabled",
            ConfigEdit::AnimationSpeed(_) => "animation_speed",
            ConfigEdit::MaxParticles(_) => "max_particles",
            ConfigEdit::FlowThickness(_) => "flow_thickness",
            ConfigEdit::DrawPoints(_) => "draw_points",
            ConfigEdit::PointRadius(_) => "point_radius",
            ConfigEdit::ColorScheme(_) => "color_scheme",
            ConfigEdit::DarkMode(_) => "dark_mode",
        }
    }
}

pub(crate) fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses `knob=value`, e.g. `opacity=0.5` or `dark-mode=on`.
impl FromStr for ConfigEdit {
    type Err = FlowMapError;

    fn from_str(s: &str) -> Result<Self> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| FlowMapError::Config(format!("expected knob=value, got '{}'", s)))?;
        let key = key.trim().to_ascii_lowercase().replace('-', "_");
        let value = value.trim();

        let number = || {
            value
                .parse::<f64>()
                .map_err(|_| FlowMapError::Config(format!("'{}' is not a number for {}", value, key)))
        };
        let flag = || {
            parse_flag(value)
                .ok_or_else(|| FlowMapError::Config(format!("'{}' is not a boolean for {}", value, key)))
        };

        let edit = match key.as_str() {
            "opacity" => ConfigEdit::Opacity(number()?),
            "animation_enabled" | "animate" => ConfigEdit::AnimationEnabled(flag()?),
            "animation_speed" | "speed" => ConfigEdit::AnimationSpeed(number()?),
            "max_particles" | "particles" => {
                let n = number()?;
                if n.is_nan() {
                    return Err(FlowMapError::Config("max_particles must be a number".to_string()));
                }
                ConfigEdit::MaxParticles(n.round() as i64)
            }
            "flow_thickness" | "thickness" => ConfigEdit::FlowThickness(number()?),
            "draw_points" | "points" => ConfigEdit::DrawPoints(flag()?),
            "point_radius" => ConfigEdit::PointRadius(number()?),
            "color_scheme" => ConfigEdit::ColorScheme(value.parse()?),
            "dark_mode" => ConfigEdit::DarkMode(flag()?),
            other => return Err(FlowMapError::Config(format!("unknown knob '{}'", other))),
        };
        Ok(edit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConfigState {
    Default,
    Edited,
}

/// Owns the current knobs and the snapshot they reset to.
///
/// `set` and `reset_to_default` are the only mutation paths.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    current: RenderConfig,
    defaults: RenderConfig,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose reset target is `defaults` (clamped into range first).
    pub fn with_defaults(defaults: RenderConfig) -> Self {
        let defaults = defaults.sanitized();
        Self {
            current: defaults.clone(),
            defaults,
        }
    }

    pub fn current(&self) -> &RenderConfig {
        &self.current
    }

    pub fn defaults(&self) -> &RenderConfig {
        &self.defaults
    }

    pub fn state(&self) -> ConfigState {
        if self.current == self.defaults {
            ConfigState::Default
        } else {
            ConfigState::Edited
        }
    }

    pub fn set(&mut self, edit: ConfigEdit) {
        debug!(knob = edit.knob(), "Applying config edit {:?}", edit);
        self.current.apply(edit);
        metrics::config::knob_set(edit.knob());
    }

    pub fn reset_to_default(&mut self) {
        debug!("Resetting render config to defaults");
        self.current = self.defaults.clone();
        metrics::config::reset();
    }

    /// Project the current knobs plus the data into the renderer's layer structure.
    ///
    /// Never mutates the store. Fails with `EmptyDataset` when `flows` is empty.
    pub fn build_layer_description(
        &self,
        flows: &[FilteredFlow],
        locations: &[Location],
        view: &ViewOptions,
    ) -> Result<LayerDescription> {
        let description = LayerDescription::build(&self.current, flows, locations, view)?;
        metrics::config::layer_built();
        Ok(description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let mut store = ConfigStore::new();
        store.set(ConfigEdit::Opacity(3.0));
        store.set(ConfigEdit::MaxParticles(-50));
        store.set(ConfigEdit::FlowThickness(0.0));
        store.set(ConfigEdit::PointRadius(f64::INFINITY));
        store.set(ConfigEdit::AnimationSpeed(1000.0));

        let cfg = store.current();
        assert_eq!(cfg.opacity, 1.0);
        assert_eq!(cfg.max_particles, 0);
        assert_eq!(cfg.flow_thickness, FLOW_THICKNESS.min);
        assert_eq!(cfg.point_radius, POINT_RADIUS.max);
        assert_eq!(cfg.animation_speed, ANIMATION_SPEED.max);
    }

    #[test]
    fn test_nan_stores_the_default() {
        let mut store = ConfigStore::new();
        store.set(ConfigEdit::Opacity(0.2));
        store.set(ConfigEdit::Opacity(f64::NAN));
        assert_eq!(store.current().opacity, OPACITY.default);
    }

    #[test]
    fn test_state_transitions() {
        let mut store = ConfigStore::new();
        assert_eq!(store.state(), ConfigState::Default);

        store.set(ConfigEdit::DarkMode(true));
        assert_eq!(store.state(), ConfigState::Edited);

        store.set(ConfigEdit::DarkMode(false));
        assert_eq!(store.state(), ConfigState::Default);

        store.set(ConfigEdit::ColorScheme(ColorScheme::Viridis));
        store.set(ConfigEdit::MaxParticles(42));
        store.reset_to_default();
        assert_eq!(store.state(), ConfigState::Default);
        assert_eq!(store.current(), &RenderConfig::default());
    }

    #[test]
    fn test_custom_defaults_are_sanitized_and_restored() {
        let snapshot = RenderConfig {
            opacity: 9.0,
            draw_points: false,
            ..Default::default()
        };
        let mut store = ConfigStore::with_defaults(snapshot);
        assert_eq!(store.defaults().opacity, 1.0);

        store.set(ConfigEdit::DrawPoints(true));
        store.reset_to_default();
        assert!(!store.current().draw_points);
    }

    #[test]
    fn test_parse_edits() {
        assert_eq!("opacity=0.25".parse::<ConfigEdit>().unwrap(), ConfigEdit::Opacity(0.25));
        assert_eq!("dark-mode=on".parse::<ConfigEdit>().unwrap(), ConfigEdit::DarkMode(true));
        assert_eq!("particles=12.6".parse::<ConfigEdit>().unwrap(), ConfigEdit::MaxParticles(13));
        assert_eq!(
            "color_scheme=Blues".parse::<ConfigEdit>().unwrap(),
            ConfigEdit::ColorScheme(ColorScheme::Blues)
        );
        assert!("opacity".parse::<ConfigEdit>().is_err());
        assert!("opacity=lots".parse::<ConfigEdit>().is_err());
        assert!("glow=1".parse::<ConfigEdit>().is_err());
        assert!("draw_points=maybe".parse::<ConfigEdit>().is_err());
    }
}
