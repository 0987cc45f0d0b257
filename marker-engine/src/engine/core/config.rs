use std::fs;
use std::path::Path;

use constants::interaction::{
    DRAG_THRESHOLD_PX, DUPLICATE_POSITION_TOLERANCE_DEG, NOTIFICATION_QUEUE_CAPACITY,
    TERRAIN_RETRY_SECONDS, TERRAIN_SAMPLE_QUANTUM_DEG,
};
use constants::render_settings::{SELECTION_HIGHLIGHT_COLOR, SELECTION_HIGHLIGHT_SCALE};
use serde::{Deserialize, Serialize};

use crate::engine::animation::easing::{Easing, TemporalMode};
use crate::engine::error::{MarkerError, Result};

/// Style applied to a record while it is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionStyle {
    pub color: String,
    pub scale: f64,
}

impl Default for SelectionStyle {
    fn default() -> Self {
        Self {
            color: SELECTION_HIGHLIGHT_COLOR.to_string(),
            scale: SELECTION_HIGHLIGHT_SCALE,
        }
    }
}

/// Scene tuning, loadable from JSON. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneConfig {
    pub drag_threshold_px: f64,
    pub duplicate_tolerance_deg: f64,
    pub terrain_sample_quantum_deg: f64,
    /// Back-off before a failed terrain sample is requested again.
    pub terrain_retry_seconds: f64,
    pub default_easing: Easing,
    pub default_mode: TemporalMode,
    pub selection: SelectionStyle,
    /// Queue every event as a JSON-RPC notification. The host is expected
    /// to call `drain_notifications` every frame; past
    /// `notification_capacity` the oldest entries are dropped.
    pub notifications: bool,
    pub notification_capacity: usize,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            drag_threshold_px: DRAG_THRESHOLD_PX,
            duplicate_tolerance_deg: DUPLICATE_POSITION_TOLERANCE_DEG,
            terrain_sample_quantum_deg: TERRAIN_SAMPLE_QUANTUM_DEG,
            terrain_retry_seconds: TERRAIN_RETRY_SECONDS,
            default_easing: Easing::default(),
            default_mode: TemporalMode::default(),
            selection: SelectionStyle::default(),
            notifications: false,
            notification_capacity: NOTIFICATION_QUEUE_CAPACITY,
        }
    }
}

impl SceneConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.drag_threshold_px.is_finite() || self.drag_threshold_px < 0.0 {
            return Err(MarkerError::Config("dragThresholdPx must be a non-negative number".into()));
        }
        if !self.duplicate_tolerance_deg.is_finite() || self.duplicate_tolerance_deg < 0.0 {
            return Err(MarkerError::Config("duplicateToleranceDeg must be a non-negative number".into()));
        }
        if !self.terrain_sample_quantum_deg.is_finite() || self.terrain_sample_quantum_deg <= 0.0 {
            return Err(MarkerError::Config("terrainSampleQuantumDeg must be positive".into()));
        }
        if !self.terrain_retry_seconds.is_finite() || self.terrain_retry_seconds < 0.0 {
            return Err(MarkerError::Config("terrainRetrySeconds must be a non-negative number".into()));
        }
        if self.notification_capacity == 0 {
            return Err(MarkerError::Config("notificationCapacity must be positive".into()));
        }
        if !self.selection.scale.is_finite() || self.selection.scale <= 0.0 {
            return Err(MarkerError::Config("selection.scale must be positive".into()));
        }
        Ok(())
    }
}
