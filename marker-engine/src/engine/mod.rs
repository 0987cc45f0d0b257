/// Field diffing, easing and the per-frame animation scheduler.
pub mod animation;

/// Scene context, tick loop and configuration.
pub mod core;

pub mod error;

/// Marker events and the handler bus.
pub mod events;

/// One-shot per-frame task registrations.
pub mod frame;

/// WGS84 conversions, tangent frames and ray intersections.
pub mod geodesy;

/// Height modes, terrain sampling and camera-height visibility.
pub mod height;

/// Mount, update, delete and the registry behind them.
pub mod lifecycle;

/// Tangent frame, posture and spin composition.
pub mod orientation;

/// The record model and its capability traits.
pub mod record;

/// Render engine seam and the headless implementation.
pub mod render;
