use constants::render_settings::DEFAULT_LABEL_FONT;
use serde::{Deserialize, Serialize};

use super::capabilities::Positioned;
use super::fields::{Field, FieldMap, FieldValue};
use super::kind::{
    AxisRotation, BillboardShape, GeometryShape, GeometryVariant, KindTag, LabelShape, PointShape,
    RecordKind,
};
use super::{HeightRange, Record, RecordId};
use crate::engine::error::{MarkerError, Result};
use crate::engine::geodesy::Cartographic;
use crate::engine::height::HeightMode;

/// Declarative description of a marker, as accepted by [`Record::factory`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MarkerOptions {
    pub id: Option<String>,
    pub kind: Option<KindTag>,
    pub position: Option<Cartographic>,
    pub height_mode: HeightMode,
    pub height_offset: f64,
    pub group: Option<String>,
    pub draggable: bool,
    pub color: Option<String>,
    pub opacity: Option<f64>,
    pub scale: Option<f64>,
    pub rotation: f64,
    pub hidden: bool,
    pub height_range: Option<HeightRange>,
    pub ttl: Option<f64>,

    pub pixel_size: Option<f64>,
    pub image: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub text: Option<String>,
    pub font: Option<String>,
    pub geometry: Option<GeometryVariant>,
    pub posture: Option<AxisRotation>,
    pub spin: Option<AxisRotation>,

    pub label: Option<LabelOptions>,
    pub billboard: Option<BillboardOptions>,
}

impl MarkerOptions {
    pub fn point(id: impl Into<String>, position: Cartographic) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some(KindTag::Point),
            position: Some(position),
            ..Self::default()
        }
    }

    pub fn geometry(id: impl Into<String>, position: Cartographic, variant: GeometryVariant) -> Self {
        Self {
            id: Some(id.into()),
            kind: Some(variant.tag()),
            position: Some(position),
            geometry: Some(variant),
            ..Self::default()
        }
    }

    pub fn in_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn draggable(mut self, draggable: bool) -> Self {
        self.draggable = draggable;
        self
    }

    pub fn with_height(mut self, mode: HeightMode, offset: f64) -> Self {
        self.height_mode = mode;
        self.height_offset = offset;
        self
    }

    pub fn with_label(mut self, label: LabelOptions) -> Self {
        self.label = Some(label);
        self
    }

    pub fn with_billboard(mut self, billboard: BillboardOptions) -> Self {
        self.billboard = Some(billboard);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Label attached to another record through its composition collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelOptions {
    pub text: String,
    pub font: Option<String>,
    pub color: Option<String>,
    pub pixel_offset: [f64; 2],
}

impl LabelOptions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub(crate) fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new()
            .with(Field::Text, FieldValue::text(self.text.clone()))
            .with(Field::PixelOffset, FieldValue::Array(self.pixel_offset.to_vec()));
        if let Some(font) = &self.font {
            fields.set(Field::Font, FieldValue::text(font.clone()));
        }
        if let Some(color) = &self.color {
            fields.set(Field::Color, FieldValue::color(color.clone()));
        }
        fields
    }
}

/// Billboard image attached to another record through its composition collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BillboardOptions {
    pub image: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub color: Option<String>,
}

impl BillboardOptions {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::default()
        }
    }

    pub(crate) fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new().with(Field::Image, FieldValue::text(self.image.clone()));
        if let Some(width) = self.width {
            fields.set(Field::Width, width);
        }
        if let Some(height) = self.height {
            fields.set(Field::Height, height);
        }
        if let Some(color) = &self.color {
            fields.set(Field::Color, FieldValue::color(color.clone()));
        }
        fields
    }
}

/// Records produced together by one factory call, sharing a composition collection.
#[derive(Debug, Clone)]
pub struct MarkerBundle {
    pub(crate) primary: RecordId,
    pub(crate) members: Vec<Record>,
}

impl MarkerBundle {
    pub fn primary(&self) -> &RecordId {
        &self.primary
    }

    pub fn members(&self) -> &[Record] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl From<Record> for MarkerBundle {
    fn from(record: Record) -> Self {
        Self {
            primary: record.id.clone(),
            members: vec![record],
        }
    }
}

impl Record {
    /// Builds an unmounted record (plus any attached label/billboard peers).
    pub fn factory(options: MarkerOptions) -> Result<MarkerBundle> {
        let id = options
            .id
            .clone()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| MarkerError::validation("<unnamed>", "an id is required"))?;
        let position = options
            .position
            .ok_or_else(|| MarkerError::validation(&id, "a position is required"))?;

        let tag = options
            .kind
            .or_else(|| options.geometry.as_ref().map(GeometryVariant::tag))
            .unwrap_or(KindTag::Point);
        let kind = primary_kind(&id, tag, &options)?;

        let mut primary = Record::new(id.as_str(), kind, position);
        primary.set_height_mode(options.height_mode);
        primary.set_height_offset(options.height_offset)?;
        primary.group = options.group.clone();
        primary.draggable = options.draggable;
        primary.style.rotation = options.rotation;
        if let Some(color) = &options.color {
            primary.style.color = color.clone();
        }
        if let Some(opacity) = options.opacity {
            primary.style.opacity = opacity;
        }
        if let Some(scale) = options.scale {
            primary.style.scale = scale;
        }
        primary.visibility.hidden = options.hidden;
        primary.visibility.height_range = options.height_range;
        primary.ttl = options.ttl;
        primary.validate()?;

        let mut members = Vec::new();
        if let Some(billboard) = &options.billboard {
            members.push(Record::billboard_peer(&primary, billboard)?);
        }
        if let Some(label) = &options.label {
            members.push(Record::label_peer(&primary, label)?);
        }
        if !members.is_empty() {
            primary.composition = Some(primary.id.clone());
        }

        let primary_id = primary.id.clone();
        members.insert(0, primary);
        Ok(MarkerBundle {
            primary: primary_id,
            members,
        })
    }

    pub(crate) fn label_peer(owner: &Record, options: &LabelOptions) -> Result<Record> {
        let mut shape = LabelShape::new(options.text.clone());
        shape.font = options
            .font
            .clone()
            .unwrap_or_else(|| DEFAULT_LABEL_FONT.to_string());
        shape.pixel_offset = options.pixel_offset;
        let mut peer = owner.peer("label", RecordKind::Label(shape));
        if let Some(color) = &options.color {
            peer.style.color = color.clone();
        }
        peer.validate()?;
        Ok(peer)
    }

    pub(crate) fn billboard_peer(owner: &Record, options: &BillboardOptions) -> Result<Record> {
        let shape = BillboardShape {
            image: options.image.clone(),
            width: options.width.unwrap_or(32.0),
            height: options.height.unwrap_or(32.0),
        };
        let mut peer = owner.peer("billboard", RecordKind::Billboard(shape));
        if let Some(color) = &options.color {
            peer.style.color = color.clone();
        }
        peer.validate()?;
        Ok(peer)
    }

    /// Peer sharing placement with `self`, owned by the same composition.
    fn peer(&self, role: &str, kind: RecordKind) -> Record {
        let owner = self.composition.clone().unwrap_or_else(|| self.id.clone());
        let mut peer = Record::new(owner.peer(role), kind, self.position);
        peer.set_height_mode(self.height_mode);
        peer.height_offset = self.height_offset;
        peer.refresh_altitude();
        peer.visibility.height_range = self.visibility.height_range;
        peer.composition = Some(owner);
        peer
    }
}

fn primary_kind(id: &str, tag: KindTag, options: &MarkerOptions) -> Result<RecordKind> {
    let kind = match tag {
        KindTag::Point => RecordKind::Point(PointShape {
            pixel_size: options
                .pixel_size
                .unwrap_or(PointShape::default().pixel_size),
            ..PointShape::default()
        }),
        KindTag::Billboard => {
            let image = options
                .image
                .clone()
                .ok_or_else(|| MarkerError::validation(id, "a billboard needs an image source"))?;
            RecordKind::Billboard(BillboardShape {
                image,
                width: options.width.unwrap_or(32.0),
                height: options.height.unwrap_or(32.0),
            })
        }
        KindTag::Label => {
            let text = options
                .text
                .clone()
                .ok_or_else(|| MarkerError::validation(id, "a label needs text"))?;
            let mut shape = LabelShape::new(text);
            if let Some(font) = &options.font {
                shape.font = font.clone();
            }
            RecordKind::Label(shape)
        }
        _ => {
            let variant = options
                .geometry
                .clone()
                .ok_or_else(|| MarkerError::validation(id, format!("{tag:?} needs geometry parameters")))?;
            if variant.tag() != tag {
                return Err(MarkerError::validation(
                    id,
                    format!("geometry {:?} does not match kind {tag:?}", variant.tag()),
                ));
            }
            let mut shape = GeometryShape::new(variant);
            if let Some(posture) = options.posture {
                shape.posture = posture;
            }
            if let Some(spin) = options.spin {
                shape.spin = spin;
            }
            RecordKind::Geometry(shape)
        }
    };
    Ok(kind)
}
