use bevy::math::DQuat;
use constants::render_settings::{
    DEFAULT_LABEL_FONT, DEFAULT_MARKER_COLOR, DEFAULT_POINT_PIXEL_SIZE, LAYER_BILLBOARD,
    LAYER_LABEL, LAYER_SHAPE,
};
use serde::{Deserialize, Serialize};

use crate::engine::error::{MarkerError, Result};

/// Local axis of a shape's own frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
    #[default]
    Z,
}

/// Rotation of `angle` degrees about a local axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisRotation {
    pub axis: Axis,
    pub angle: f64,
}

impl AxisRotation {
    pub const fn new(axis: Axis, angle: f64) -> Self {
        Self { axis, angle }
    }

    /// Y is negated to match the handedness of the east-north-up frame.
    pub fn to_quat(&self) -> DQuat {
        let radians = self.angle.to_radians();
        match self.axis {
            Axis::X => DQuat::from_rotation_x(radians),
            Axis::Y => DQuat::from_rotation_y(-radians),
            Axis::Z => DQuat::from_rotation_z(radians),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GeometryVariant {
    Box {
        dimensions: [f64; 3],
    },
    Sphere {
        radius: f64,
    },
    #[serde(rename_all = "camelCase")]
    Cylinder {
        length: f64,
        top_radius: f64,
        bottom_radius: f64,
    },
    Ellipsoid {
        radii: [f64; 3],
    },
    #[serde(rename_all = "camelCase")]
    Sector {
        radius: f64,
        start_angle: f64,
        end_angle: f64,
    },
    Polyline {
        vertices: Vec<[f64; 3]>,
        width: f64,
    },
}

impl GeometryVariant {
    pub fn tag(&self) -> KindTag {
        match self {
            Self::Box { .. } => KindTag::Box,
            Self::Sphere { .. } => KindTag::Sphere,
            Self::Cylinder { .. } => KindTag::Cylinder,
            Self::Ellipsoid { .. } => KindTag::Ellipsoid,
            Self::Sector { .. } => KindTag::Sector,
            Self::Polyline { .. } => KindTag::Polyline,
        }
    }

    /// A single size every variant can be rebuilt from.
    pub fn characteristic_radius(&self) -> f64 {
        match self {
            Self::Box { dimensions } => dimensions.iter().copied().fold(0.0, f64::max) * 0.5,
            Self::Sphere { radius } | Self::Sector { radius, .. } => *radius,
            Self::Cylinder {
                top_radius,
                bottom_radius,
                ..
            } => top_radius.max(*bottom_radius),
            Self::Ellipsoid { radii } => radii.iter().copied().fold(0.0, f64::max),
            Self::Polyline { width, .. } => *width * 0.5,
        }
    }

    fn rebuilt(tag: KindTag, radius: f64, previous: &GeometryVariant) -> Option<Self> {
        let variant = match tag {
            KindTag::Box => Self::Box {
                dimensions: [radius * 2.0; 3],
            },
            KindTag::Sphere => Self::Sphere { radius },
            KindTag::Cylinder => Self::Cylinder {
                length: radius * 2.0,
                top_radius: radius,
                bottom_radius: radius,
            },
            KindTag::Ellipsoid => Self::Ellipsoid { radii: [radius; 3] },
            KindTag::Sector => Self::Sector {
                radius,
                start_angle: 0.0,
                end_angle: 90.0,
            },
            KindTag::Polyline => match previous {
                Self::Polyline { .. } => previous.clone(),
                _ => Self::Polyline {
                    vertices: Vec::new(),
                    width: radius * 2.0,
                },
            },
            _ => return None,
        };
        Some(variant)
    }

    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        let ok = match self {
            Self::Box { dimensions } => dimensions.iter().all(|d| positive(*d)),
            Self::Sphere { radius } => positive(*radius),
            Self::Cylinder {
                length,
                top_radius,
                bottom_radius,
            } => {
                positive(*length)
                    && top_radius.is_finite()
                    && bottom_radius.is_finite()
                    && *top_radius >= 0.0
                    && *bottom_radius >= 0.0
                    && (*top_radius > 0.0 || *bottom_radius > 0.0)
            }
            Self::Ellipsoid { radii } => radii.iter().all(|r| positive(*r)),
            Self::Sector {
                radius,
                start_angle,
                end_angle,
            } => positive(*radius) && start_angle.is_finite() && end_angle.is_finite(),
            Self::Polyline { vertices, width } => {
                positive(*width) && vertices.iter().flatten().all(|v| v.is_finite())
            }
        };
        if ok {
            Ok(())
        } else {
            Err(format!("{:?} has non-positive or non-finite dimensions", self.tag()))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointShape {
    pub pixel_size: f64,
    pub outline_color: String,
    pub outline_width: f64,
}

impl Default for PointShape {
    fn default() -> Self {
        Self {
            pixel_size: DEFAULT_POINT_PIXEL_SIZE,
            outline_color: DEFAULT_MARKER_COLOR.to_string(),
            outline_width: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillboardShape {
    pub image: String,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelShape {
    pub text: String,
    pub font: String,
    pub pixel_offset: [f64; 2],
}

impl LabelShape {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: DEFAULT_LABEL_FONT.to_string(),
            pixel_offset: [0.0, 0.0],
        }
    }
}

/// Volumetric shape plus its static tilt and continuous spin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeometryShape {
    pub variant: GeometryVariant,
    pub posture: AxisRotation,
    pub spin: AxisRotation,
}

impl GeometryShape {
    pub fn new(variant: GeometryVariant) -> Self {
        Self {
            variant,
            posture: AxisRotation::default(),
            spin: AxisRotation::default(),
        }
    }
}

/// Discriminant of [`RecordKind`], flattened over geometry variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KindTag {
    Point,
    Billboard,
    Label,
    Box,
    Sphere,
    Cylinder,
    Ellipsoid,
    Sector,
    Polyline,
}

/// Kind discriminant plus kind-specific payload.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    Point(PointShape),
    Billboard(BillboardShape),
    Label(LabelShape),
    Geometry(GeometryShape),
}

impl RecordKind {
    pub fn tag(&self) -> KindTag {
        match self {
            Self::Point(_) => KindTag::Point,
            Self::Billboard(_) => KindTag::Billboard,
            Self::Label(_) => KindTag::Label,
            Self::Geometry(shape) => shape.variant.tag(),
        }
    }

    /// Mount order inside a composition collection.
    pub fn layer(&self) -> u8 {
        match self {
            Self::Billboard(_) => LAYER_BILLBOARD,
            Self::Point(_) | Self::Geometry(_) => LAYER_SHAPE,
            Self::Label(_) => LAYER_LABEL,
        }
    }

    /// Shapes that can be tilted and spun about their own axes.
    pub fn is_rotatable(&self) -> bool {
        matches!(self, Self::Geometry(shape) if !matches!(shape.variant, GeometryVariant::Polyline { .. }))
    }

    pub fn geometry(&self) -> Option<&GeometryShape> {
        match self {
            Self::Geometry(shape) => Some(shape),
            _ => None,
        }
    }

    /// Rebuilds the payload for another kind from what the current one shares.
    ///
    /// Geometry keeps its tilt and spin and is resized from its characteristic
    /// radius. Billboards and labels carry data no other kind has, so they can
    /// only be retagged to themselves.
    pub fn retag(&self, tag: KindTag) -> Result<RecordKind> {
        if tag == self.tag() {
            return Ok(self.clone());
        }

        let fallback = PointShape::default().pixel_size * 0.5;
        let radius = match self {
            Self::Geometry(shape) => shape.variant.characteristic_radius(),
            Self::Point(point) => point.pixel_size * 0.5,
            _ => fallback,
        };

        match (self, tag) {
            (_, KindTag::Billboard | KindTag::Label) => Err(MarkerError::validation(
                format!("{:?}", self.tag()),
                format!("cannot retag to {tag:?} without its source data"),
            )),
            (Self::Billboard(_) | Self::Label(_), _) => Err(MarkerError::validation(
                format!("{:?}", self.tag()),
                format!("cannot retag to {tag:?}"),
            )),
            (_, KindTag::Point) => Ok(Self::Point(PointShape {
                pixel_size: (radius * 2.0).max(1.0),
                ..PointShape::default()
            })),
            (Self::Geometry(shape), _) => {
                let variant = GeometryVariant::rebuilt(tag, radius, &shape.variant)
                    .ok_or_else(|| MarkerError::validation(format!("{tag:?}"), "not a geometry kind"))?;
                Ok(Self::Geometry(GeometryShape {
                    variant,
                    ..shape.clone()
                }))
            }
            (Self::Point(_), _) => {
                let placeholder = GeometryVariant::Sphere { radius };
                let variant = GeometryVariant::rebuilt(tag, radius, &placeholder)
                    .ok_or_else(|| MarkerError::validation(format!("{tag:?}"), "not a geometry kind"))?;
                Ok(Self::Geometry(GeometryShape::new(variant)))
            }
        }
    }
}
