//! Shared tuning constants for the marker engine workspace.

pub mod animation;
pub mod coordinate_system;
pub mod interaction;
pub mod render_settings;
