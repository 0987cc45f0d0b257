//! Marker events and caller-supplied handlers.
//!
//! Handlers never see the scene, only the event. A handler that returns an
//! error or panics is logged and skipped; the remaining handlers still run.

use std::collections::HashMap;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use bevy::log::warn;
use bevy::math::DVec2;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::engine::error::MarkerError;
use crate::engine::geodesy::Cartographic;
use crate::engine::record::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Click,
    RightClick,
    Select,
    Deselect,
    HoverStart,
    HoverEnd,
    DragStart,
    Drag,
    DragEnd,
    AnimationEnd,
    Expired,
}

impl EventKind {
    /// JSON-RPC notification method for this event.
    pub fn method(self) -> &'static str {
        match self {
            Self::Click => "marker_click",
            Self::RightClick => "marker_right_click",
            Self::Select => "marker_select",
            Self::Deselect => "marker_deselect",
            Self::HoverStart => "marker_hover_start",
            Self::HoverEnd => "marker_hover_end",
            Self::DragStart => "marker_drag_start",
            Self::Drag => "marker_drag",
            Self::DragEnd => "marker_drag_end",
            Self::AnimationEnd => "marker_animation_end",
            Self::Expired => "marker_expired",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Click => "click",
            Self::RightClick => "rightclick",
            Self::Select => "select",
            Self::Deselect => "deselect",
            Self::HoverStart => "hoverstart",
            Self::HoverEnd => "hoverend",
            Self::DragStart => "dragstart",
            Self::Drag => "drag",
            Self::DragEnd => "dragend",
            Self::AnimationEnd => "animationend",
            Self::Expired => "expired",
        };
        f.write_str(name)
    }
}

/// What an event is about: a record, or a bare point on the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum EventTarget {
    Record(RecordId),
    Surface(Cartographic),
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerEvent {
    pub kind: EventKind,
    pub target: EventTarget,
    /// Pointer position in screen pixels, for pointer-driven events.
    pub screen: Option<DVec2>,
    /// Geographic position associated with the event, if any.
    pub position: Option<Cartographic>,
}

impl MarkerEvent {
    pub fn for_record(kind: EventKind, id: RecordId) -> Self {
        Self {
            kind,
            target: EventTarget::Record(id),
            screen: None,
            position: None,
        }
    }

    pub fn at_screen(mut self, screen: DVec2) -> Self {
        self.screen = Some(screen);
        self
    }

    pub fn at_position(mut self, position: Cartographic) -> Self {
        self.position = Some(position);
        self
    }

    pub fn record_id(&self) -> Option<&RecordId> {
        match &self.target {
            EventTarget::Record(id) => Some(id),
            EventTarget::Surface(_) => None,
        }
    }

    /// Notification params in the shape the frontend expects.
    pub fn to_params(&self) -> serde_json::Value {
        let target = match &self.target {
            EventTarget::Record(id) => json!({ "record": id }),
            EventTarget::Surface(position) => json!({ "surface": position }),
        };
        json!({
            "event": self.kind.to_string(),
            "target": target,
            "screen": self.screen.map(|s| [s.x, s.y]),
            "position": self.position,
        })
    }
}

pub type HandlerResult = Result<(), Box<dyn std::error::Error>>;
type Handler = Box<dyn FnMut(&MarkerEvent) -> HandlerResult>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

struct Subscription {
    id: HandlerId,
    kind: Option<EventKind>,
    handler: Handler,
}

/// Per-record and scene-wide event handlers.
#[derive(Default)]
pub struct EventBus {
    next: u64,
    by_record: HashMap<RecordId, Vec<Subscription>>,
    scene: Vec<Subscription>,
}

impl EventBus {
    fn next_id(&mut self) -> HandlerId {
        self.next += 1;
        HandlerId(self.next)
    }

    pub fn on(
        &mut self,
        record: RecordId,
        kind: EventKind,
        handler: impl FnMut(&MarkerEvent) -> HandlerResult + 'static,
    ) -> HandlerId {
        let id = self.next_id();
        self.by_record.entry(record).or_default().push(Subscription {
            id,
            kind: Some(kind),
            handler: Box::new(handler),
        });
        id
    }

    /// Scene-wide handler; `None` receives every kind.
    pub fn on_any(
        &mut self,
        kind: Option<EventKind>,
        handler: impl FnMut(&MarkerEvent) -> HandlerResult + 'static,
    ) -> HandlerId {
        let id = self.next_id();
        self.scene.push(Subscription {
            id,
            kind,
            handler: Box::new(handler),
        });
        id
    }

    pub fn off(&mut self, handler: HandlerId) -> bool {
        let before = self.handler_count();
        self.scene.retain(|s| s.id != handler);
        for subscriptions in self.by_record.values_mut() {
            subscriptions.retain(|s| s.id != handler);
        }
        self.by_record.retain(|_, subscriptions| !subscriptions.is_empty());
        self.handler_count() < before
    }

    /// Drops every handler bound to a record.
    pub fn clear_record(&mut self, record: &RecordId) {
        self.by_record.remove(record);
    }

    pub fn handler_count(&self) -> usize {
        self.scene.len() + self.by_record.values().map(Vec::len).sum::<usize>()
    }

    /// Runs matching handlers, record handlers first. Returns how many failed.
    pub fn dispatch(&mut self, event: &MarkerEvent) -> usize {
        let record_handlers = event
            .record_id()
            .and_then(|id| self.by_record.get_mut(id))
            .into_iter()
            .flatten();
        let mut failures = 0;
        for subscription in record_handlers.chain(self.scene.iter_mut()) {
            if subscription.kind.is_some_and(|kind| kind != event.kind) {
                continue;
            }
            let outcome = catch_unwind(AssertUnwindSafe(|| (subscription.handler)(event)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => err.to_string(),
                Err(payload) => payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "handler panicked".to_string()),
            };
            failures += 1;
            warn!(
                "{}",
                MarkerError::EventHandler {
                    kind: event.kind,
                    message
                }
            );
        }
        failures
    }
}
