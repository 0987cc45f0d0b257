//! Orientation composition for tilted and spinning shapes.
//!
//! ```text
//!   final = tangentFrame ⊗ posture ⊗ spin
//!
//!   tangentFrame  east-north-up basis at the record's current position
//!   posture       static user tilt about a local axis
//!   spin          continuous rotation about the object's own (tilted) axis
//! ```
//!
//! Quaternion products do not commute, so this order is fixed. Position can
//! change every frame (drag, animation), so values are recomputed once per
//! tick from declared inputs and never cached across frames.

use bevy::math::DQuat;
use serde::Serialize;

use crate::engine::geodesy::{Cartographic, cartographic_to_cartesian, enu_quat};
use crate::engine::record::Record;
use crate::engine::record::capabilities::Orientable;
use crate::engine::record::kind::AxisRotation;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationInputs {
    /// Placement with resolved altitude.
    pub anchor: Cartographic,
    pub posture: AxisRotation,
    pub spin: AxisRotation,
}

pub fn compose_orientation(tangent: DQuat, posture: DQuat, spin: DQuat) -> DQuat {
    (tangent * posture * spin).normalize()
}

impl OrientationInputs {
    pub fn orientation(&self) -> DQuat {
        compose_orientation(
            enu_quat(&self.anchor),
            self.posture.to_quat(),
            self.spin.to_quat(),
        )
    }
}

/// Properties a record asks the scene to recompute each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DerivedProperty {
    Position,
    Orientation,
}

/// Per-tick values pushed to the primitive's derived fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct DerivedValues {
    /// ECEF position of the placement.
    pub position: Option<[f64; 3]>,
    /// Unit quaternion `[x, y, z, w]`.
    pub orientation: Option<[f64; 4]>,
}

/// Evaluates the record's declared derived properties for this tick.
pub fn evaluate(record: &Record) -> DerivedValues {
    let mut values = DerivedValues::default();
    for property in record.derived_properties() {
        match property {
            DerivedProperty::Position => {
                values.position = Some(cartographic_to_cartesian(&record.placement()).to_array());
            }
            DerivedProperty::Orientation => {
                values.orientation = record
                    .orientation_inputs()
                    .map(|inputs| inputs.orientation().to_array());
            }
        }
    }
    values
}
