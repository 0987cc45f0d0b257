/// Default animation duration (seconds) when a caller asks for one without a length.
pub const DEFAULT_ANIMATION_SECONDS: f64 = 0.5;

/// Durations at or below this are applied immediately.
pub const MIN_ANIMATION_SECONDS: f64 = 1.0e-6;
