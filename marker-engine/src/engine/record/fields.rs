use std::fmt;

use serde::{Deserialize, Serialize};

use super::kind::{Axis, KindTag};
use super::options::{BillboardOptions, LabelOptions};
use super::HeightRange;
use crate::engine::geodesy::Cartographic;
use crate::engine::height::HeightMode;

/// Addressable record field, as used by `update` and the animation builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Field {
    // Sub-components living in the composition collection.
    Label,
    Billboard,

    // Fields with dedicated setters.
    Position,
    HeightMode,
    HeightOffset,
    Group,
    Kind,
    Ttl,
    HeightRange,

    // Pass-through style and shape fields.
    Draggable,
    Hidden,
    Color,
    Opacity,
    Scale,
    Rotation,
    PixelSize,
    OutlineColor,
    OutlineWidth,
    Image,
    Width,
    Height,
    Text,
    Font,
    PixelOffset,
    Dimensions,
    Radius,
    Length,
    TopRadius,
    BottomRadius,
    Radii,
    StartAngle,
    EndAngle,
    Vertices,
    LineWidth,
    RotationAxis,
    RotationAngle,
    SpinAxis,
    SpinAngle,
}

/// How `update` applies a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRoute {
    Composition,
    Setter,
    PassThrough,
}

impl Field {
    /// Fields captured by `save_state` and consumed by `restore_state`.
    pub const SAVED_STATE: [Field; 4] = [Field::Color, Field::Opacity, Field::Scale, Field::Hidden];

    pub fn route(self) -> FieldRoute {
        match self {
            Self::Label | Self::Billboard => FieldRoute::Composition,
            Self::Position
            | Self::HeightMode
            | Self::HeightOffset
            | Self::Group
            | Self::Kind
            | Self::Ttl
            | Self::HeightRange => FieldRoute::Setter,
            _ => FieldRoute::PassThrough,
        }
    }

    /// Angles keep counting up across repeat cycles instead of wrapping.
    pub fn is_angular(self) -> bool {
        matches!(
            self,
            Self::Rotation | Self::StartAngle | Self::EndAngle | Self::RotationAngle | Self::SpinAngle
        )
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Number(f64),
    Array(Vec<f64>),
    Path(Vec<[f64; 3]>),
    Color(String),
    Text(String),
    Bool(bool),
    HeightMode(HeightMode),
    Axis(Axis),
    Kind(KindTag),
    Group(Option<String>),
    Seconds(Option<f64>),
    HeightRange(Option<HeightRange>),
    Label(Option<LabelOptions>),
    Billboard(Option<BillboardOptions>),
}

impl FieldValue {
    pub fn color(value: impl Into<String>) -> Self {
        Self::Color(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[f64]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Color(s) | Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<[f64; 3]> for FieldValue {
    fn from(value: [f64; 3]) -> Self {
        Self::Array(value.to_vec())
    }
}

impl From<Cartographic> for FieldValue {
    fn from(value: Cartographic) -> Self {
        Self::Array(value.to_array().to_vec())
    }
}

impl From<HeightMode> for FieldValue {
    fn from(value: HeightMode) -> Self {
        Self::HeightMode(value)
    }
}

impl From<Axis> for FieldValue {
    fn from(value: Axis) -> Self {
        Self::Axis(value)
    }
}

impl From<KindTag> for FieldValue {
    fn from(value: KindTag) -> Self {
        Self::Kind(value)
    }
}

/// Ordered field/value list. Setting a field twice keeps its first slot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap(Vec<(Field, FieldValue)>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.set(field, value);
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<FieldValue>) {
        let value = value.into();
        match self.0.iter_mut().find(|(f, _)| *f == field) {
            Some(slot) => slot.1 = value,
            None => self.0.push((field, value)),
        }
    }

    pub fn get(&self, field: Field) -> Option<&FieldValue> {
        self.0.iter().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    pub fn remove(&mut self, field: Field) -> Option<FieldValue> {
        let index = self.0.iter().position(|(f, _)| *f == field)?;
        Some(self.0.remove(index).1)
    }

    pub fn contains(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().map(|(f, _)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &FieldValue)> + '_ {
        self.0.iter().map(|(f, v)| (*f, v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Field, FieldValue)> for FieldMap {
    fn from_iter<T: IntoIterator<Item = (Field, FieldValue)>>(iter: T) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl Extend<(Field, FieldValue)> for FieldMap {
    fn extend<T: IntoIterator<Item = (Field, FieldValue)>>(&mut self, iter: T) {
        for (field, value) in iter {
            self.set(field, value);
        }
    }
}

impl IntoIterator for FieldMap {
    type Item = (Field, FieldValue);
    type IntoIter = std::vec::IntoIter<(Field, FieldValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
