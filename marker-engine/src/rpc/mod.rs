//! JSON-RPC 2.0 notifications for hosts that forward marker events to a frontend.
//!
//! ## Message Flow
//!
//! ```text
//! MarkerScene ──emit──> EventBus (handlers)
//!      │
//!      └──────────────> NotificationQueue ──drain_notifications()──> host ──> frontend
//! ```
//!
//! Every event kind maps to one method name (`marker_click`, `marker_drag_end`, ...)
//! with params of the form:
//!
//! ```json
//! { "event": "dragend", "target": { "record": "pin-7" }, "screen": [412.0, 300.0], "position": null }
//! ```
//!
//! The queue is enabled through `SceneConfig::notifications`.

pub mod notifications;

pub use notifications::{NotificationQueue, RpcNotification};
