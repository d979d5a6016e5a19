use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::{
    CONFIG_ENV_VAR, DARK_BASE_MAP, DEFAULT_BASE_MAP, DEFAULT_CENTER_LAT, DEFAULT_CENTER_LON,
    DEFAULT_CONFIG_FILE, DEFAULT_FLOWS_FILE, DEFAULT_LOCATIONS_FILE, DEFAULT_MIN_FLOW_THRESHOLD,
    DEFAULT_TITLE, DEFAULT_ZOOM, MAX_ZOOM, MIN_ZOOM,
};
use crate::error::{FlowMapError, Result};
use crate::pipeline::processing::filter::FilterOptions;
use crate::render::color::ColorScheme;
use crate::render::config_store::{parse_flag, RenderConfig};
use crate::render::layers::ViewOptions;

/// Initial settings, materialized from a flat `key -> value` mapping.
///
/// Keys match case-insensitively and ignore `_`/`-`, so `centerLat`,
/// `center_lat` and `center-lat` are the same key.
#[derive(Debug, Clone, PartialEq)]
pub struct AppOptions {
    pub locations_file: String,
    pub flows_file: String,
    pub center_lon: f64,
    pub center_lat: f64,
    pub zoom: f64,
    pub base_map: String,
    pub color_scheme: ColorScheme,
    pub title: String,
    pub min_flow: u64,
    pub max_distance_km: Option<f64>,
    pub show_controls: bool,
    pub show_points: bool,
    pub drop_self_loops: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            locations_file: DEFAULT_LOCATIONS_FILE.to_string(),
            flows_file: DEFAULT_FLOWS_FILE.to_string(),
            center_lon: DEFAULT_CENTER_LON,
            center_lat: DEFAULT_CENTER_LAT,
            zoom: DEFAULT_ZOOM,
            base_map: DEFAULT_BASE_MAP.to_string(),
            color_scheme: ColorScheme::Default,
            title: DEFAULT_TITLE.to_string(),
            min_flow: DEFAULT_MIN_FLOW_THRESHOLD,
            max_distance_km: None,
            show_controls: true,
            show_points: true,
            drop_self_loops: false,
        }
    }
}

fn normalize_key(key: &str) -> String {
    key.trim()
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn finite(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl AppOptions {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut options = Self::default();
        for (key, value) in pairs {
            options.apply(key.as_ref(), value.as_ref());
        }
        options
    }

    /// Apply one setting. Unknown keys and unparsable values leave the
    /// current value in place and return false.
    pub fn apply(&mut self, key: &str, value: &str) -> bool {
        let value = value.trim();
        let applied = match normalize_key(key).as_str() {
            "locationsfile" if !value.is_empty() => {
                self.locations_file = value.to_string();
                true
            }
            "flowsfile" if !value.is_empty() => {
                self.flows_file = value.to_string();
                true
            }
            "centerlon" => finite(value)
                .map(|v| self.center_lon = v.clamp(-180.0, 180.0))
                .is_some(),
            "centerlat" => finite(value)
                .map(|v| self.center_lat = v.clamp(-90.0, 90.0))
                .is_some(),
            "zoom" => finite(value)
                .map(|v| self.zoom = v.clamp(MIN_ZOOM, MAX_ZOOM))
                .is_some(),
            "basemap" if !value.is_empty() => {
                self.base_map = value.to_ascii_lowercase();
                true
            }
            "colorscheme" => value.parse::<ColorScheme>().map(|s| self.color_scheme = s).is_ok(),
            "title" => {
                self.title = value.to_string();
                true
            }
            "minflow" => value
                .parse::<u64>()
                .map(|v| self.min_flow = v.max(DEFAULT_MIN_FLOW_THRESHOLD))
                .is_ok(),
            "maxdistance" => {
                if value.is_empty() || value.eq_ignore_ascii_case("none") {
                    self.max_distance_km = None;
                    true
                } else {
                    match value.parse::<f64>() {
                        Ok(v) if v >= 0.0 => {
                            self.max_distance_km = Some(v);
                            true
                        }
                        Ok(_) => {
                            self.max_distance_km = None;
                            true
                        }
                        Err(_) => false,
                    }
                }
            }
            "showcontrols" => parse_flag(value).map(|v| self.show_controls = v).is_some(),
            "showpoints" => parse_flag(value).map(|v| self.show_points = v).is_some(),
            "dropselfloops" => parse_flag(value).map(|v| self.drop_self_loops = v).is_some(),
            _ => false,
        };

        if !applied {
            warn!("Ignoring option {}='{}'", key, value);
        }
        applied
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions {
            max_distance_km: self.max_distance_km,
            min_flow_threshold: self.min_flow,
            drop_self_loops: self.drop_self_loops,
        }
    }

    pub fn view(&self) -> ViewOptions {
        ViewOptions {
            title: self.title.clone(),
            center_lon: self.center_lon,
            center_lat: self.center_lat,
            zoom: self.zoom,
            base_map: self.base_map.clone(),
            show_controls: self.show_controls,
        }
    }

    /// The knob snapshot the session starts from and resets to.
    pub fn initial_render_config(&self) -> RenderConfig {
        RenderConfig {
            draw_points: self.show_points,
            color_scheme: self.color_scheme,
            dark_mode: self.base_map == DARK_BASE_MAP,
            ..RenderConfig::default()
        }
    }

    /// Build options from an optional TOML file overlaid with `key=value` overrides.
    pub fn resolve(config_path: Option<&Path>, overrides: &[(String, String)]) -> Result<Self> {
        let mut options = Self::default();
        if let Some(path) = discover_config_file(config_path)? {
            info!("Loading options from {}", path.display());
            for (key, value) in read_option_file(&path)? {
                options.apply(&key, &value);
            }
        }
        for (key, value) in overrides {
            options.apply(key, value);
        }
        debug!("Resolved options: {:?}", options);
        Ok(options)
    }
}

/// Explicit path, then `FLOWMAP_CONFIG`, then `flowmap.toml` if present.
fn discover_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    let named = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_ENV_VAR).ok().filter(|v| !v.trim().is_empty()).map(PathBuf::from));

    match named {
        Some(path) if path.is_file() => Ok(Some(path)),
        Some(path) => Err(FlowMapError::Config(format!(
            "Config file '{}' does not exist",
            path.display()
        ))),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
            Ok(fallback.is_file().then_some(fallback))
        }
    }
}

/// Read a flat TOML table into string pairs.
pub fn read_option_file(path: &Path) -> Result<Vec<(String, String)>> {
    let content = fs::read_to_string(path).map_err(|e| {
        FlowMapError::Config(format!("Failed to read config file '{}': {}", path.display(), e))
    })?;
    let table: toml::Table = toml::from_str(&content)?;

    table
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                other => {
                    return Err(FlowMapError::Config(format!(
                        "Option '{}' must be a scalar, got {}",
                        key,
                        other.type_str()
                    )))
                }
            };
            Ok((key, value))
        })
        .collect()
}

/// Split a CLI `key=value` override.
pub fn parse_override(raw: &str) -> Result<(String, String)> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| FlowMapError::Config(format!("expected key=value, got '{}'", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_mapping_is_empty() {
        let options = AppOptions::from_pairs(Vec::<(String, String)>::new());
        assert_eq!(options, AppOptions::default());
        assert_eq!(options.locations_file, "locations.csv");
        assert_eq!(options.center_lat, 20.0);
        assert_eq!(options.min_flow, 1);
        assert!(options.max_distance_km.is_none());
    }

    #[test]
    fn test_keys_are_normalized() {
        let options = AppOptions::from_pairs([
            ("centerLat", "45.5"),
            ("center-lon", "-122.6"),
            ("COLOR_SCHEME", "viridis"),
            ("maxDistance", "500"),
        ]);
        assert_eq!(options.center_lat, 45.5);
        assert_eq!(options.center_lon, -122.6);
        assert_eq!(options.color_scheme, ColorScheme::Viridis);
        assert_eq!(options.max_distance_km, Some(500.0));
    }

    #[test]
    fn test_bad_values_fall_back_and_view_values_clamp() {
        let options = AppOptions::from_pairs([
            ("zoom", "99"),
            ("centerLat", "abc"),
            ("minFlow", "-3"),
            ("colorScheme", "rainbow"),
            ("showPoints", "maybe"),
        ]);
        assert_eq!(options.zoom, MAX_ZOOM);
        assert_eq!(options.center_lat, DEFAULT_CENTER_LAT);
        assert_eq!(options.min_flow, DEFAULT_MIN_FLOW_THRESHOLD);
        assert_eq!(options.color_scheme, ColorScheme::Default);
        assert!(options.show_points);
    }

    #[test]
    fn test_zero_min_flow_keeps_the_floor() {
        let options = AppOptions::from_pairs([("minFlow", "0")]);
        assert_eq!(options.min_flow, DEFAULT_MIN_FLOW_THRESHOLD);
        assert_eq!(options.filter_options().min_flow_threshold, 1);

        let options = AppOptions::from_pairs([("minFlow", "4")]);
        assert_eq!(options.min_flow, 4);
    }

    #[test]
    fn test_max_distance_none_and_negative() {
        let mut options = AppOptions::default();
        assert!(options.apply("maxDistance", "100"));
        assert!(options.apply("maxDistance", "none"));
        assert!(options.max_distance_km.is_none());
        assert!(options.apply("maxDistance", "-5"));
        assert!(options.max_distance_km.is_none());
        assert!(!options.apply("maxDistance", "far"));
    }

    #[test]
    fn test_dark_base_map_starts_dark() {
        let options = AppOptions::from_pairs([("baseMap", "Dark"), ("showPoints", "false")]);
        let cfg = options.initial_render_config();
        assert!(cfg.dark_mode);
        assert!(!cfg.draw_points);
        assert_eq!(cfg.opacity, RenderConfig::default().opacity);
    }

    #[test]
    fn test_unknown_key_is_ignored() {
        let mut options = AppOptions::default();
        assert!(!options.apply("fancy", "1"));
        assert_eq!(options, AppOptions::default());
    }

    #[test]
    fn test_resolve_reads_file_then_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "title = \"Migration\"\nzoom = 4\nshowControls = false").unwrap();

        let overrides = vec![("zoom".to_string(), "6".to_string())];
        let options = AppOptions::resolve(Some(file.path()), &overrides).unwrap();
        assert_eq!(options.title, "Migration");
        assert_eq!(options.zoom, 6.0);
        assert!(!options.show_controls);
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = AppOptions::resolve(Some(Path::new("/definitely/not/here.toml")), &[]).unwrap_err();
        assert!(matches!(err, FlowMapError::Config(_)));
    }

    #[test]
    fn test_nested_tables_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[view]\nzoom = 3").unwrap();
        assert!(read_option_file(file.path()).is_err());
    }

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("minFlow = 5").unwrap(),
            ("minFlow".to_string(), "5".to_string())
        );
        assert!(parse_override("minFlow").is_err());
        assert!(parse_override("=5").is_err());
    }
}
