use serde::{Deserialize, Serialize};

/// A named geographic point. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
    pub name: Option<String>,
}

impl Location {
    pub fn new(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            lat,
            lon,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Label shown by the renderer: the name when present, otherwise the id.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A directed, magnitude-weighted relationship between two location ids
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Flow {
    pub origin: String,
    pub dest: String,
    pub count: u64,
}

impl Flow {
    pub fn new(origin: impl Into<String>, dest: impl Into<String>, count: u64) -> Self {
        Self {
            origin: origin.into(),
            dest: dest.into(),
            count,
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.origin == self.dest
    }
}

/// A flow that passed the identity join and optional distance validation,
/// annotated with the fields the renderer needs. Animation speed depends on
/// the whole set and is computed on demand by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredFlow {
    pub flow: Flow,
    pub origin: Location,
    pub dest: Location,
    /// Great-circle distance between origin and dest
    pub distance_km: f64,
    /// `max(count, min_flow_threshold)`
    pub display_magnitude: u64,
}

impl FilteredFlow {
    pub fn count(&self) -> u64 {
        self.flow.count
    }
}
