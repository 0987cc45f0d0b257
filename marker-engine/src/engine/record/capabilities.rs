//! Capability traits implemented once on [`Record`] and answered per kind.

use super::fields::{Field, FieldMap, FieldValue};
use super::kind::{GeometryVariant, RecordKind};
use super::{Record, Style};
use crate::engine::error::{MarkerError, Result};
use crate::engine::geodesy::Cartographic;
use crate::engine::height::HeightMode;
use crate::engine::orientation::{DerivedProperty, OrientationInputs};

pub trait Positioned {
    fn position(&self) -> Cartographic;
    fn set_position(&mut self, position: Cartographic) -> Result<()>;
    fn height_mode(&self) -> HeightMode;
    fn set_height_mode(&mut self, mode: HeightMode);
    fn height_offset(&self) -> f64;
    fn set_height_offset(&mut self, offset: f64) -> Result<()>;
}

pub trait Stylable {
    fn style(&self) -> &Style;
    fn set_color(&mut self, color: impl Into<String>);
    fn set_opacity(&mut self, opacity: f64) -> Result<()>;
    fn set_scale(&mut self, scale: f64) -> Result<()>;
    fn set_rotation(&mut self, degrees: f64);
    fn is_hidden(&self) -> bool;
    fn set_hidden(&mut self, hidden: bool);
}

/// Field-level access used by `update`, the animation scheduler and saved state.
pub trait Animatable {
    /// `None` when the field does not apply to this record's kind.
    fn read_field(&self, field: Field) -> Option<FieldValue>;
    fn write_field(&mut self, field: Field, value: &FieldValue) -> Result<()>;

    fn snapshot(&self, fields: &[Field]) -> FieldMap {
        fields
            .iter()
            .filter_map(|field| self.read_field(*field).map(|value| (*field, value)))
            .collect()
    }
}

pub trait Orientable {
    /// Derived properties the scene recomputes for this record every tick.
    fn derived_properties(&self) -> &'static [DerivedProperty];
    /// `None` for kinds that cannot be tilted or spun.
    fn orientation_inputs(&self) -> Option<OrientationInputs>;
}

impl Positioned for Record {
    fn position(&self) -> Cartographic {
        self.position
    }

    fn set_position(&mut self, position: Cartographic) -> Result<()> {
        if !position.is_in_range() {
            return Err(MarkerError::validation(&self.id, "position out of range or not finite"));
        }
        self.position = position;
        self.refresh_altitude();
        Ok(())
    }

    fn height_mode(&self) -> HeightMode {
        self.height_mode
    }

    /// Leaves the offset untouched, even when forcing clamp-to-ground.
    fn set_height_mode(&mut self, mode: HeightMode) {
        self.height_mode = mode;
        self.refresh_altitude();
    }

    fn height_offset(&self) -> f64 {
        self.height_offset
    }

    /// A positive offset on a clamped record promotes it to relative-to-ground.
    fn set_height_offset(&mut self, offset: f64) -> Result<()> {
        if !offset.is_finite() {
            return Err(MarkerError::validation(&self.id, "height offset must be finite"));
        }
        self.height_offset = offset;
        if offset > 0.0 && self.height_mode == HeightMode::ClampToGround {
            self.height_mode = HeightMode::RelativeToGround;
        }
        self.refresh_altitude();
        Ok(())
    }
}

impl Stylable for Record {
    fn style(&self) -> &Style {
        &self.style
    }

    fn set_color(&mut self, color: impl Into<String>) {
        self.style.color = color.into();
    }

    fn set_opacity(&mut self, opacity: f64) -> Result<()> {
        if !(0.0..=1.0).contains(&opacity) {
            return Err(MarkerError::validation(&self.id, "opacity must lie in [0, 1]"));
        }
        self.style.opacity = opacity;
        Ok(())
    }

    fn set_scale(&mut self, scale: f64) -> Result<()> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(MarkerError::validation(&self.id, "scale must be positive"));
        }
        self.style.scale = scale;
        Ok(())
    }

    fn set_rotation(&mut self, degrees: f64) {
        self.style.rotation = degrees;
    }

    fn is_hidden(&self) -> bool {
        self.visibility.hidden
    }

    fn set_hidden(&mut self, hidden: bool) {
        self.visibility.hidden = hidden;
    }
}

impl Animatable for Record {
    fn read_field(&self, field: Field) -> Option<FieldValue> {
        use FieldValue as V;

        let value = match (field, &self.kind) {
            (Field::Label | Field::Billboard, _) => return None,
            (Field::Position, _) => V::Array(self.position.to_array().to_vec()),
            (Field::HeightMode, _) => V::HeightMode(self.height_mode),
            (Field::HeightOffset, _) => V::Number(self.height_offset),
            (Field::Group, _) => V::Group(self.group.clone()),
            (Field::Kind, kind) => V::Kind(kind.tag()),
            (Field::Ttl, _) => V::Seconds(self.ttl),
            (Field::HeightRange, _) => V::HeightRange(self.visibility.height_range),
            (Field::Draggable, _) => V::Bool(self.draggable),
            (Field::Hidden, _) => V::Bool(self.visibility.hidden),
            (Field::Color, _) => V::Color(self.style.color.clone()),
            (Field::Opacity, _) => V::Number(self.style.opacity),
            (Field::Scale, _) => V::Number(self.style.scale),
            (Field::Rotation, _) => V::Number(self.style.rotation),

            (Field::PixelSize, RecordKind::Point(p)) => V::Number(p.pixel_size),
            (Field::OutlineColor, RecordKind::Point(p)) => V::Color(p.outline_color.clone()),
            (Field::OutlineWidth, RecordKind::Point(p)) => V::Number(p.outline_width),

            (Field::Image, RecordKind::Billboard(b)) => V::Text(b.image.clone()),
            (Field::Width, RecordKind::Billboard(b)) => V::Number(b.width),
            (Field::Height, RecordKind::Billboard(b)) => V::Number(b.height),

            (Field::Text, RecordKind::Label(l)) => V::Text(l.text.clone()),
            (Field::Font, RecordKind::Label(l)) => V::Text(l.font.clone()),
            (Field::PixelOffset, RecordKind::Label(l)) => V::Array(l.pixel_offset.to_vec()),

            (Field::RotationAxis, RecordKind::Geometry(g)) => V::Axis(g.posture.axis),
            (Field::RotationAngle, RecordKind::Geometry(g)) => V::Number(g.posture.angle),
            (Field::SpinAxis, RecordKind::Geometry(g)) => V::Axis(g.spin.axis),
            (Field::SpinAngle, RecordKind::Geometry(g)) => V::Number(g.spin.angle),

            (field, RecordKind::Geometry(g)) => match (field, &g.variant) {
                (Field::Dimensions, GeometryVariant::Box { dimensions }) => V::Array(dimensions.to_vec()),
                (
                    Field::Radius,
                    GeometryVariant::Sphere { radius } | GeometryVariant::Sector { radius, .. },
                ) => V::Number(*radius),
                (Field::Length, GeometryVariant::Cylinder { length, .. }) => V::Number(*length),
                (Field::TopRadius, GeometryVariant::Cylinder { top_radius, .. }) => V::Number(*top_radius),
                (Field::BottomRadius, GeometryVariant::Cylinder { bottom_radius, .. }) => {
                    V::Number(*bottom_radius)
                }
                (Field::Radii, GeometryVariant::Ellipsoid { radii }) => V::Array(radii.to_vec()),
                (Field::StartAngle, GeometryVariant::Sector { start_angle, .. }) => V::Number(*start_angle),
                (Field::EndAngle, GeometryVariant::Sector { end_angle, .. }) => V::Number(*end_angle),
                (Field::Vertices, GeometryVariant::Polyline { vertices, .. }) => V::Path(vertices.clone()),
                (Field::LineWidth, GeometryVariant::Polyline { width, .. }) => V::Number(*width),
                _ => return None,
            },
            _ => return None,
        };
        Some(value)
    }

    fn write_field(&mut self, field: Field, value: &FieldValue) -> Result<()> {
        if field.route() == super::fields::FieldRoute::Composition {
            return Err(MarkerError::validation(
                &self.id,
                format!("{field} is applied through the composition collection"),
            ));
        }
        if self.read_field(field).is_none() {
            return Err(MarkerError::validation(
                &self.id,
                format!("{field} does not apply to {:?}", self.kind.tag()),
            ));
        }

        let id = self.id.clone();
        let mismatch = || MarkerError::validation(&id, format!("{field} does not accept {value:?}"));
        let number = || value.as_number().filter(|v| v.is_finite()).ok_or_else(mismatch);
        let text = || value.as_str().map(str::to_string).ok_or_else(mismatch);

        match field {
            Field::Position => {
                let values = value.as_array().ok_or_else(mismatch)?;
                let mut position = Cartographic::from_slice(values).ok_or_else(mismatch)?;
                if values.len() == 2 {
                    position.height = self.position.height;
                }
                self.set_position(position)?;
            }
            Field::HeightMode => match value {
                FieldValue::HeightMode(mode) => self.set_height_mode(*mode),
                _ => return Err(mismatch()),
            },
            Field::HeightOffset => self.set_height_offset(number()?)?,
            Field::Group => match value {
                FieldValue::Group(group) => self.set_group(group.clone()),
                FieldValue::Text(group) => self.set_group(Some(group.clone())),
                _ => return Err(mismatch()),
            },
            Field::Kind => match value {
                FieldValue::Kind(tag) => self.set_kind(*tag)?,
                _ => return Err(mismatch()),
            },
            Field::Ttl => match value {
                FieldValue::Seconds(ttl) => self.set_ttl(*ttl)?,
                FieldValue::Number(ttl) => self.set_ttl(Some(*ttl))?,
                _ => return Err(mismatch()),
            },
            Field::HeightRange => match value {
                FieldValue::HeightRange(range) => self.set_height_range(*range)?,
                _ => return Err(mismatch()),
            },
            Field::Draggable => self.draggable = value.as_bool().ok_or_else(mismatch)?,
            Field::Hidden => self.visibility.hidden = value.as_bool().ok_or_else(mismatch)?,
            Field::Color => self.style.color = text()?,
            Field::Opacity => self.style.opacity = number()?,
            Field::Scale => self.style.scale = number()?,
            Field::Rotation => self.style.rotation = number()?,
            _ => self.write_shape_field(field, value)?,
        }
        Ok(())
    }
}

impl Record {
    fn write_shape_field(&mut self, field: Field, value: &FieldValue) -> Result<()> {
        let id = self.id.clone();
        let mismatch = || MarkerError::validation(&id, format!("{field} does not accept {value:?}"));
        let number = || value.as_number().filter(|v| v.is_finite()).ok_or_else(mismatch);
        let text = || value.as_str().map(str::to_string).ok_or_else(mismatch);
        let triple = || match value.as_array() {
            Some([a, b, c]) => Ok([*a, *b, *c]),
            _ => Err(mismatch()),
        };
        let axis = || match value {
            FieldValue::Axis(axis) => Ok(*axis),
            _ => Err(mismatch()),
        };

        match (&mut self.kind, field) {
            (RecordKind::Point(p), Field::PixelSize) => p.pixel_size = number()?,
            (RecordKind::Point(p), Field::OutlineColor) => p.outline_color = text()?,
            (RecordKind::Point(p), Field::OutlineWidth) => p.outline_width = number()?,

            (RecordKind::Billboard(b), Field::Image) => b.image = text()?,
            (RecordKind::Billboard(b), Field::Width) => b.width = number()?,
            (RecordKind::Billboard(b), Field::Height) => b.height = number()?,

            (RecordKind::Label(l), Field::Text) => l.text = text()?,
            (RecordKind::Label(l), Field::Font) => l.font = text()?,
            (RecordKind::Label(l), Field::PixelOffset) => match value.as_array() {
                Some([x, y]) => l.pixel_offset = [*x, *y],
                _ => return Err(mismatch()),
            },

            (RecordKind::Geometry(g), Field::RotationAxis) => g.posture.axis = axis()?,
            (RecordKind::Geometry(g), Field::RotationAngle) => g.posture.angle = number()?,
            (RecordKind::Geometry(g), Field::SpinAxis) => g.spin.axis = axis()?,
            (RecordKind::Geometry(g), Field::SpinAngle) => g.spin.angle = number()?,

            (RecordKind::Geometry(g), field) => match (&mut g.variant, field) {
                (GeometryVariant::Box { dimensions }, Field::Dimensions) => *dimensions = triple()?,
                (
                    GeometryVariant::Sphere { radius } | GeometryVariant::Sector { radius, .. },
                    Field::Radius,
                ) => *radius = number()?,
                (GeometryVariant::Cylinder { length, .. }, Field::Length) => *length = number()?,
                (GeometryVariant::Cylinder { top_radius, .. }, Field::TopRadius) => *top_radius = number()?,
                (GeometryVariant::Cylinder { bottom_radius, .. }, Field::BottomRadius) => {
                    *bottom_radius = number()?
                }
                (GeometryVariant::Ellipsoid { radii }, Field::Radii) => *radii = triple()?,
                (GeometryVariant::Sector { start_angle, .. }, Field::StartAngle) => *start_angle = number()?,
                (GeometryVariant::Sector { end_angle, .. }, Field::EndAngle) => *end_angle = number()?,
                (GeometryVariant::Polyline { vertices, .. }, Field::Vertices) => match value {
                    FieldValue::Path(path) => *vertices = path.clone(),
                    _ => return Err(mismatch()),
                },
                (GeometryVariant::Polyline { width, .. }, Field::LineWidth) => *width = number()?,
                _ => return Err(mismatch()),
            },
            _ => return Err(mismatch()),
        }
        Ok(())
    }
}

impl Orientable for Record {
    fn derived_properties(&self) -> &'static [DerivedProperty] {
        if self.kind.is_rotatable() {
            &[DerivedProperty::Position, DerivedProperty::Orientation]
        } else {
            &[DerivedProperty::Position]
        }
    }

    fn orientation_inputs(&self) -> Option<OrientationInputs> {
        let shape = self.kind.geometry().filter(|_| self.kind.is_rotatable())?;
        Some(OrientationInputs {
            anchor: self.placement(),
            posture: shape.posture,
            spin: shape.spin,
        })
    }
}
