/// Constants shared by the pipeline stages and the render-config model.

// Geodesy
pub const EARTH_RADIUS_KM: f64 = 6371.0;

// Animation speed bounds for the normalizer
pub const MIN_SPEED: f64 = 0.1;
pub const MAX_SPEED: f64 = 2.0;

// Default visual floor for rendered flow magnitudes
pub const DEFAULT_MIN_FLOW_THRESHOLD: u64 = 1;

// Canonical column layouts, used when a header does not name the column
pub const LOCATION_COLUMNS: [&str; 4] = ["id", "lat", "lon", "name"];
pub const FLOW_COLUMNS: [&str; 3] = ["origin", "dest", "count"];

// Dataset labels used in logs and metrics
pub const LOCATIONS_DATASET: &str = "locations";
pub const FLOWS_DATASET: &str = "flows";

// Initial configuration defaults
pub const DEFAULT_LOCATIONS_FILE: &str = "locations.csv";
pub const DEFAULT_FLOWS_FILE: &str = "flows.csv";
pub const DEFAULT_CENTER_LON: f64 = 0.0;
pub const DEFAULT_CENTER_LAT: f64 = 20.0;
pub const DEFAULT_ZOOM: f64 = 2.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 22.0;
pub const DEFAULT_BASE_MAP: &str = "light";
pub const DARK_BASE_MAP: &str = "dark";
pub const DEFAULT_TITLE: &str = "Flow Map";

// Configuration file discovery
pub const DEFAULT_CONFIG_FILE: &str = "flowmap.toml";
pub const CONFIG_ENV_VAR: &str = "FLOWMAP_CONFIG";
pub const METRICS_ADDR_ENV_VAR: &str = "FLOWMAP_METRICS_ADDR";
