//! The structure handed to the external renderer on every refresh.
//!
//! Layers are addressed by role (`base_layer`, `flow_layer`), never by position.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_BASE_MAP, DEFAULT_CENTER_LAT, DEFAULT_CENTER_LON, DEFAULT_TITLE, DEFAULT_ZOOM};
use crate::domain::{FilteredFlow, Location};
use crate::error::Result;
use crate::pipeline::processing::normalize::SpeedScale;
use crate::render::color::ColorScheme;
use crate::render::config_store::RenderConfig;

/// Startup view settings that are not live-editable knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewOptions {
    pub title: String,
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub base_map: String,
    pub show_controls: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            center_lon: DEFAULT_CENTER_LON,
            center_lat: DEFAULT_CENTER_LAT,
            zoom: DEFAULT_ZOOM,
            base_map: DEFAULT_BASE_MAP.to_string(),
            show_controls: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDescription {
    pub title: String,
    pub show_controls: bool,
    pub base_layer: BaseLayer,
    pub flow_layer: FlowLayer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseLayer {
    pub base_map: String,
    pub dark_mode: bool,
    /// `[lon, lat]`
    pub center: [f64; 2],
    pub zoom: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowLayer {
    pub locations: Vec<LocationPoint>,
    pub flows: Vec<FlowSegment>,
    pub visuals: FlowVisuals,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationPoint {
    pub id: String,
    pub label: String,
    /// `[lon, lat]`
    pub position: [f64; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSegment {
    pub origin: String,
    pub dest: String,
    pub source_position: [f64; 2],
    pub target_position: [f64; 2],
    pub count: u64,
    pub magnitude: u64,
    pub distance_km: f64,
    /// Base animation speed in `[0.1, 2.0]`, before the global multiplier
    pub speed: f64,
    pub color: [u8; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowVisuals {
    pub opacity: f64,
    pub thickness: f64,
    pub max_particles: u32,
    pub animation_enabled: bool,
    pub speed_multiplier: f64,
    pub draw_points: bool,
    pub point_radius: f64,
    pub color_scheme: ColorScheme,
    pub dark_mode: bool,
}

impl From<&RenderConfig> for FlowVisuals {
    fn from(cfg: &RenderConfig) -> Self {
        Self {
            opacity: cfg.opacity,
            thickness: cfg.flow_thickness,
            max_particles: cfg.max_particles,
            animation_enabled: cfg.animation_enabled,
            speed_multiplier: cfg.animation_speed,
            draw_points: cfg.draw_points,
            point_radius: cfg.point_radius,
            color_scheme: cfg.color_scheme,
            dark_mode: cfg.dark_mode,
        }
    }
}

fn position(location: &Location) -> [f64; 2] {
    [location.lon, location.lat]
}

impl LayerDescription {
    pub(crate) fn build(
        cfg: &RenderConfig,
        flows: &[FilteredFlow],
        locations: &[Location],
        view: &ViewOptions,
    ) -> Result<Self> {
        let scale = SpeedScale::from_flows(flows)?;

        let segments = flows
            .iter()
            .map(|f| FlowSegment {
                origin: f.origin.id.clone(),
                dest: f.dest.id.clone(),
                source_position: position(&f.origin),
                target_position: position(&f.dest),
                count: f.count(),
                magnitude: f.display_magnitude,
                distance_km: f.distance_km,
                speed: scale.speed_for(f.count()),
                color: cfg.color_scheme.color_at(scale.ratio(f.count())),
            })
            .collect();

        let points = locations
            .iter()
            .map(|l| LocationPoint {
                id: l.id.clone(),
                label: l.label().to_string(),
                position: position(l),
            })
            .collect();

        Ok(Self {
            title: view.title.clone(),
            show_controls: view.show_controls,
            base_layer: BaseLayer {
                base_map: view.base_map.clone(),
                dark_mode: cfg.dark_mode,
                center: [view.center_lon, view.center_lat],
                zoom: view.zoom,
            },
            flow_layer: FlowLayer {
                locations: points,
                flows: segments,
                visuals: FlowVisuals::from(cfg),
            },
        })
    }

    pub fn location(&self, id: &str) -> Option<&LocationPoint> {
        self.flow_layer.locations.iter().find(|l| l.id == id)
    }

    pub fn flow(&self, index: usize) -> Option<&FlowSegment> {
        self.flow_layer.flows.get(index)
    }

    /// Flows leaving the given location, in dataset order
    pub fn flows_from<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a FlowSegment> + 'a {
        self.flow_layer.flows.iter().filter(move |f| f.origin == id)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
