use constants::animation::DEFAULT_ANIMATION_SECONDS;

use super::easing::{Easing, TemporalMode};
use crate::engine::geodesy::Cartographic;
use crate::engine::record::fields::{Field, FieldMap, FieldValue};

/// Target values and timing for one animation, ready for the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingAnimation {
    pub duration: f64,
    /// `None` uses the scene's configured default.
    pub mode: Option<TemporalMode>,
    /// `None` uses the scene's configured default.
    pub easing: Option<Easing>,
    pub changes: FieldMap,
}

/// Collects target values for [`crate::MarkerScene::animate`].
///
/// ```rust,ignore
/// let pending = AnimationBuilder::new(0.8)
///     .position(Cartographic::new(24.11, 56.95, 0.0))
///     .opacity(0.5)
///     .build();
/// scene.animate(&id, pending)?;
/// ```
#[derive(Debug, Clone)]
pub struct AnimationBuilder {
    pending: PendingAnimation,
}

impl Default for AnimationBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_ANIMATION_SECONDS)
    }
}

impl AnimationBuilder {
    pub fn new(duration: f64) -> Self {
        Self {
            pending: PendingAnimation {
                duration,
                mode: None,
                easing: None,
                changes: FieldMap::new(),
            },
        }
    }

    pub fn set(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.pending.changes.set(field, value);
        self
    }

    pub fn mode(mut self, mode: TemporalMode) -> Self {
        self.pending.mode = Some(mode);
        self
    }

    pub fn looping(self) -> Self {
        self.mode(TemporalMode::PingPong)
    }

    pub fn repeating(self) -> Self {
        self.mode(TemporalMode::Repeat)
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.pending.easing = Some(easing);
        self
    }

    pub fn position(self, position: Cartographic) -> Self {
        self.set(Field::Position, position)
    }

    pub fn color(self, color: impl Into<String>) -> Self {
        self.set(Field::Color, FieldValue::color(color))
    }

    pub fn opacity(self, opacity: f64) -> Self {
        self.set(Field::Opacity, opacity)
    }

    pub fn scale(self, scale: f64) -> Self {
        self.set(Field::Scale, scale)
    }

    pub fn rotation(self, degrees: f64) -> Self {
        self.set(Field::Rotation, degrees)
    }

    pub fn height_offset(self, offset: f64) -> Self {
        self.set(Field::HeightOffset, offset)
    }

    pub fn spin_angle(self, degrees: f64) -> Self {
        self.set(Field::SpinAngle, degrees)
    }

    pub fn build(self) -> PendingAnimation {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_changes_without_applying_them() {
        let pending = AnimationBuilder::new(2.0)
            .opacity(0.2)
            .spin_angle(360.0)
            .repeating()
            .build();
        assert_eq!(pending.duration, 2.0);
        assert_eq!(pending.mode, Some(TemporalMode::Repeat));
        assert_eq!(pending.easing, None);
        assert_eq!(pending.changes.len(), 2);
        assert_eq!(pending.changes.get(Field::SpinAngle), Some(&FieldValue::Number(360.0)));
    }

    #[test]
    fn default_builder_uses_the_short_duration() {
        assert_eq!(AnimationBuilder::default().build().duration, DEFAULT_ANIMATION_SECONDS);
    }
}
