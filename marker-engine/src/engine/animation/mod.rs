//! Property-diffing animation.
//!
//! ```text
//!   animate(id, pending)
//!     ├─ cancel running animation (deregister its frame task)
//!     ├─ start  = snapshot(current values)
//!     ├─ target = snapshot(clone with pending applied)
//!     ├─ keep only fields where start != target
//!     └─ register frame task
//!
//!   each frame
//!     ├─ progress = mode(elapsed, duration) → easing
//!     ├─ per field: lerp | snap colour once | snap at end
//!     └─ finished ? force exact target, emit AnimationEnd : re-register
//! ```

pub mod builder;
pub mod easing;
pub mod scheduler;

use crate::engine::frame::FrameHandle;
use crate::engine::record::fields::{FieldMap, FieldValue};
use easing::{Easing, Progress, TemporalMode};

/// State of the animation currently running on a record.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationContext {
    pub(crate) frame: FrameHandle,
    pub(crate) started_at: f64,
    pub(crate) duration: f64,
    pub(crate) mode: TemporalMode,
    pub(crate) easing: Easing,
    pub(crate) start: FieldMap,
    pub(crate) target: FieldMap,
    pub(crate) colors_applied: bool,
}

impl AnimationContext {
    pub fn progress(&self, now: f64) -> Progress {
        self.mode.progress(now - self.started_at, self.duration, self.easing)
    }

    pub fn mode(&self) -> TemporalMode {
        self.mode
    }

    pub fn target(&self) -> &FieldMap {
        &self.target
    }
}

/// What one frame does with one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Interpolated {
    Value(FieldValue),
    /// Colours jump straight to the target on the first frame.
    SnapOnFirst,
    /// Enums, flags, text and mismatched shapes change only at completion.
    SnapAtEnd,
}

fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Interpolation chosen by the shape of the values, not the field name.
pub fn interpolate(start: &FieldValue, end: &FieldValue, t: f64) -> Interpolated {
    match (start, end) {
        (FieldValue::Number(a), FieldValue::Number(b)) => Interpolated::Value(FieldValue::Number(lerp(*a, *b, t))),
        (FieldValue::Array(a), FieldValue::Array(b)) if a.len() == b.len() => Interpolated::Value(FieldValue::Array(
            a.iter().zip(b).map(|(a, b)| lerp(*a, *b, t)).collect(),
        )),
        (FieldValue::Path(a), FieldValue::Path(b)) if a.len() == b.len() => Interpolated::Value(FieldValue::Path(
            a.iter()
                .zip(b)
                .map(|(a, b)| [lerp(a[0], b[0], t), lerp(a[1], b[1], t), lerp(a[2], b[2], t)])
                .collect(),
        )),
        (FieldValue::Color(_), _) | (_, FieldValue::Color(_)) => Interpolated::SnapOnFirst,
        _ => Interpolated::SnapAtEnd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_and_equal_arrays_lerp() {
        assert_eq!(
            interpolate(&FieldValue::Number(0.0), &FieldValue::Number(10.0), 0.25),
            Interpolated::Value(FieldValue::Number(2.5))
        );
        assert_eq!(
            interpolate(
                &FieldValue::Array(vec![0.0, 10.0]),
                &FieldValue::Array(vec![10.0, 20.0]),
                0.5
            ),
            Interpolated::Value(FieldValue::Array(vec![5.0, 15.0]))
        );
    }

    #[test]
    fn colours_snap_first_and_others_snap_last() {
        assert_eq!(
            interpolate(&FieldValue::color("#000000"), &FieldValue::color("#ffffff"), 0.1),
            Interpolated::SnapOnFirst
        );
        assert_eq!(
            interpolate(&FieldValue::Bool(false), &FieldValue::Bool(true), 0.9),
            Interpolated::SnapAtEnd
        );
        assert_eq!(
            interpolate(&FieldValue::Path(vec![[0.0; 3]]), &FieldValue::Path(vec![]), 0.5),
            Interpolated::SnapAtEnd
        );
    }
}
