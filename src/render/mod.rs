// Render-config model: live knobs, layer projection and pick forwarding

pub mod color;
pub mod config_store;
pub mod events;
pub mod layers;

pub use color::ColorScheme;
pub use config_store::{ConfigEdit, ConfigState, ConfigStore, RenderConfig};
pub use events::{EventHooks, PickEvent, PickKind, PickTarget, PickedRecord};
pub use layers::{LayerDescription, ViewOptions};
