/// Screen-space distance (pixels) a pressed pointer must travel before a drag starts.
pub const DRAG_THRESHOLD_PX: f64 = 3.0;

/// Two records in the same group closer than this (degrees, per axis) occupy the same spot.
pub const DUPLICATE_POSITION_TOLERANCE_DEG: f64 = 1.0e-7;

/// Terrain samples are cached on a lon/lat grid of this many degrees.
pub const TERRAIN_SAMPLE_QUANTUM_DEG: f64 = 1.0e-5;

/// Notifications kept for the host before the oldest are dropped.
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 1024;

/// Seconds to wait before re-requesting a terrain sample that failed.
pub const TERRAIN_RETRY_SECONDS: f64 = 1.0;
