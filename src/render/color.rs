use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FlowMapError;

/// Named flow colour ramps
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    #[default]
    Default,
    Blues,
    Oranges,
    Viridis,
}

const DEFAULT_RAMP: [[u8; 3]; 3] = [[254, 235, 226], [247, 104, 161], [122, 1, 119]];
const BLUES_RAMP: [[u8; 3]; 3] = [[198, 219, 239], [66, 146, 198], [8, 48, 107]];
const ORANGES_RAMP: [[u8; 3]; 3] = [[253, 208, 162], [241, 105, 19], [127, 39, 4]];
const VIRIDIS_RAMP: [[u8; 3]; 3] = [[68, 1, 84], [33, 145, 140], [253, 231, 37]];

impl ColorScheme {
    pub const ALL: [ColorScheme; 4] = [
        ColorScheme::Default,
        ColorScheme::Blues,
        ColorScheme::Oranges,
        ColorScheme::Viridis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Default => "default",
            ColorScheme::Blues => "blues",
            ColorScheme::Oranges => "oranges",
            ColorScheme::Viridis => "viridis",
        }
    }

    fn ramp(&self) -> &'static [[u8; 3]; 3] {
        match self {
            ColorScheme::Default => &DEFAULT_RAMP,
            ColorScheme::Blues => &BLUES_RAMP,
            ColorScheme::Oranges => &ORANGES_RAMP,
            ColorScheme::Viridis => &VIRIDIS_RAMP,
        }
    }

    /// Colour at position `t` along the ramp; `t` is clamped to `[0, 1]`.
    pub fn color_at(&self, t: f64) -> [u8; 3] {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let ramp = self.ramp();
        let (from, to, local) = if t <= 0.5 {
            (ramp[0], ramp[1], t * 2.0)
        } else {
            (ramp[1], ramp[2], (t - 0.5) * 2.0)
        };
        let mut out = [0u8; 3];
        for i in 0..3 {
            let a = from[i] as f64;
            let b = to[i] as f64;
            out[i] = (a + (b - a) * local).round() as u8;
        }
        out
    }
}

impl fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorScheme {
    type Err = FlowMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ColorScheme::ALL
            .into_iter()
            .find(|scheme| scheme.as_str() == wanted)
            .ok_or_else(|| FlowMapError::Config(format!("unknown color scheme '{}'", s.trim())))
    }
}
