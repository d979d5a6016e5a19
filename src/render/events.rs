//! Hover and click notifications from the renderer.
//!
//! Events are forwarded to the registered handler as-is, on the caller's thread.

use serde::Serialize;
use tracing::trace;

use crate::render::layers::{FlowSegment, LayerDescription, LocationPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PickKind {
    Hover,
    Click,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PickedRecord {
    Location(LocationPoint),
    Flow(FlowSegment),
}

/// Where the pointer landed, as reported by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickTarget<'a> {
    Location(&'a str),
    Flow(usize),
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PickEvent {
    pub kind: PickKind,
    /// `None` when the pointer is over empty map
    pub picked: Option<PickedRecord>,
}

impl PickEvent {
    /// Resolve a renderer pick against the description it was drawn from.
    pub fn resolve(kind: PickKind, target: PickTarget<'_>, layers: &LayerDescription) -> Self {
        let picked = match target {
            PickTarget::Location(id) => layers.location(id).cloned().map(PickedRecord::Location),
            PickTarget::Flow(index) => layers.flow(index).cloned().map(PickedRecord::Flow),
            PickTarget::Nothing => None,
        };
        Self { kind, picked }
    }
}

pub type PickHandler = Box<dyn FnMut(&PickEvent) + Send>;

#[derive(Default)]
pub struct EventHooks {
    on_hover: Option<PickHandler>,
    on_click: Option<PickHandler>,
}

impl EventHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_hover(&mut self, handler: impl FnMut(&PickEvent) + Send + 'static) {
        self.on_hover = Some(Box::new(handler));
    }

    pub fn on_click(&mut self, handler: impl FnMut(&PickEvent) + Send + 'static) {
        self.on_click = Some(Box::new(handler));
    }

    /// Deliver the event to the matching handler. Returns false when none is registered.
    pub fn dispatch(&mut self, event: &PickEvent) -> bool {
        let handler = match event.kind {
            PickKind::Hover => self.on_hover.as_mut(),
            PickKind::Click => self.on_click.as_mut(),
        };
        match handler {
            Some(handler) => {
                trace!(kind = ?event.kind, "Dispatching pick event");
                handler(event);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for EventHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHooks")
            .field("on_hover", &self.on_hover.is_some())
            .field("on_click", &self.on_click.is_some())
            .finish()
    }
}
