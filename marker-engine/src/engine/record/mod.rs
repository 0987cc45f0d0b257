//! Record model: one entity type for every marker kind.
//!
//! ```text
//!   Record ─┬─ RecordKind (tagged payload: point / billboard / label / geometry)
//!           ├─ placement  (position, height mode, offset, resolved altitude)
//!           ├─ Style      (color, opacity, scale, rotation)
//!           ├─ Visibility (hidden, height-range visible)
//!           └─ runtime    (render handle, animation, saved state, hover/select)
//! ```
//!
//! Behaviour is split into capability traits (see [`capabilities`]) instead of
//! per-kind subtypes. Changing kind is a pure [`RecordKind::retag`].

pub mod capabilities;
pub mod fields;
pub mod kind;
pub mod options;

use std::fmt;

use constants::render_settings::DEFAULT_MARKER_COLOR;
use serde::{Deserialize, Serialize};

use crate::engine::animation::AnimationContext;
use crate::engine::error::{MarkerError, Result};
use crate::engine::geodesy::Cartographic;
use crate::engine::height::visibility::SubscriptionId;
use crate::engine::height::{HeightMode, resolve_altitude};
use crate::engine::render::PrimitiveHandle;
use fields::FieldMap;
use kind::{KindTag, RecordKind};

/// Stable record identifier, unique within a scene.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Id of a composition peer playing `role` for this record.
    pub fn peer(&self, role: &str) -> RecordId {
        RecordId(format!("{}#{role}", self.0))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for RecordId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&RecordId> for RecordId {
    fn from(id: &RecordId) -> Self {
        id.clone()
    }
}

/// Camera heights (metres) between which a record is shown.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightRange {
    pub min: f64,
    pub max: f64,
}

impl HeightRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, height: f64) -> bool {
        height >= self.min && height <= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    pub color: String,
    pub opacity: f64,
    pub scale: f64,
    /// Screen-plane rotation in degrees.
    pub rotation: f64,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            color: DEFAULT_MARKER_COLOR.to_string(),
            opacity: 1.0,
            scale: 1.0,
            rotation: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Visibility {
    pub hidden: bool,
    pub height_range_visible: bool,
    pub height_range: Option<HeightRange>,
}

impl Default for Visibility {
    fn default() -> Self {
        Self {
            hidden: false,
            height_range_visible: true,
            height_range: None,
        }
    }
}

impl Visibility {
    pub fn is_shown(&self) -> bool {
        !self.hidden && self.height_range_visible
    }
}

#[derive(Debug, Clone)]
pub struct Record {
    pub(crate) id: RecordId,
    pub(crate) kind: RecordKind,
    pub(crate) position: Cartographic,
    pub(crate) height_mode: HeightMode,
    pub(crate) height_offset: f64,
    pub(crate) group: Option<String>,
    pub(crate) draggable: bool,
    pub(crate) style: Style,
    pub(crate) visibility: Visibility,
    pub(crate) ttl: Option<f64>,

    pub(crate) saved_state: Option<FieldMap>,
    pub(crate) animation: Option<AnimationContext>,
    pub(crate) handle: Option<PrimitiveHandle>,
    /// Owner id of the composition collection this record belongs to.
    pub(crate) composition: Option<RecordId>,
    pub(crate) ground_height: Option<f64>,
    pub(crate) resolved_altitude: f64,
    pub(crate) height_subscription: Option<SubscriptionId>,
    pub(crate) hovered: bool,
    pub(crate) selected: bool,
}

impl Record {
    pub fn new(id: impl Into<RecordId>, kind: RecordKind, position: Cartographic) -> Self {
        Self {
            id: id.into(),
            kind,
            position,
            height_mode: HeightMode::None,
            height_offset: 0.0,
            group: None,
            draggable: false,
            style: Style::default(),
            visibility: Visibility::default(),
            ttl: None,
            saved_state: None,
            animation: None,
            handle: None,
            composition: None,
            ground_height: None,
            resolved_altitude: position.height,
            height_subscription: None,
            hovered: false,
            selected: false,
        }
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn kind(&self) -> &RecordKind {
        &self.kind
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    pub fn ttl(&self) -> Option<f64> {
        self.ttl
    }

    pub fn composition(&self) -> Option<&RecordId> {
        self.composition.as_ref()
    }

    pub fn handle(&self) -> Option<PrimitiveHandle> {
        self.handle
    }

    pub fn is_mounted(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn has_saved_state(&self) -> bool {
        self.saved_state.is_some()
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }

    pub fn ground_height(&self) -> Option<f64> {
        self.ground_height
    }

    pub fn resolved_altitude(&self) -> f64 {
        self.resolved_altitude
    }

    /// Position with the height replaced by the resolved altitude.
    pub fn placement(&self) -> Cartographic {
        self.position.with_height(self.resolved_altitude)
    }

    pub(crate) fn refresh_altitude(&mut self) {
        self.resolved_altitude = resolve_altitude(
            self.height_mode,
            self.position.height,
            self.height_offset,
            self.ground_height,
        );
    }

    pub fn set_group(&mut self, group: Option<String>) {
        self.group = group.filter(|g| !g.is_empty());
    }

    pub fn set_draggable(&mut self, draggable: bool) {
        self.draggable = draggable;
    }

    pub fn set_ttl(&mut self, ttl: Option<f64>) -> Result<()> {
        if let Some(seconds) = ttl {
            if !seconds.is_finite() || seconds <= 0.0 {
                return Err(MarkerError::validation(&self.id, "ttl must be a positive number of seconds"));
            }
        }
        self.ttl = ttl;
        Ok(())
    }

    pub fn set_height_range(&mut self, range: Option<HeightRange>) -> Result<()> {
        if let Some(range) = range {
            if !(range.min.is_finite() && range.max.is_finite()) || range.min > range.max {
                return Err(MarkerError::validation(&self.id, "height range must be finite with min <= max"));
            }
        }
        self.visibility.height_range = range;
        if range.is_none() {
            self.visibility.height_range_visible = true;
        }
        Ok(())
    }

    /// Swaps the kind payload, keeping id and placement.
    pub fn set_kind(&mut self, tag: KindTag) -> Result<()> {
        self.kind = self
            .kind
            .retag(tag)
            .map_err(|err| match err {
                MarkerError::Validation { reason, .. } => MarkerError::validation(&self.id, reason),
                other => other,
            })?;
        Ok(())
    }

    /// Checks everything the factory and `add` require before mounting.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: &str| Err(MarkerError::validation(&self.id, reason));

        if self.id.as_str().trim().is_empty() {
            return fail("an id is required");
        }
        if !self.position.is_in_range() {
            return fail("position must be finite with latitude in [-90, 90] and longitude in [-180, 180]");
        }
        if !self.height_offset.is_finite() {
            return fail("height offset must be finite");
        }
        if !(0.0..=1.0).contains(&self.style.opacity) {
            return fail("opacity must lie in [0, 1]");
        }
        if !self.style.scale.is_finite() || self.style.scale <= 0.0 {
            return fail("scale must be positive");
        }
        if !self.style.rotation.is_finite() {
            return fail("rotation must be finite");
        }
        match &self.kind {
            RecordKind::Point(point) if !(point.pixel_size.is_finite() && point.pixel_size > 0.0) => {
                fail("point pixel size must be positive")
            }
            RecordKind::Billboard(billboard) if billboard.image.trim().is_empty() => {
                fail("a billboard needs an image source")
            }
            RecordKind::Label(label) if label.text.is_empty() => fail("a label needs text"),
            RecordKind::Geometry(shape) => shape
                .variant
                .validate()
                .map_err(|reason| MarkerError::validation(&self.id, reason)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::capabilities::Positioned;
    use super::kind::PointShape;
    use super::*;

    fn point() -> Record {
        Record::new("p", RecordKind::Point(PointShape::default()), Cartographic::new(10.0, 20.0, 0.0))
    }

    #[test]
    fn peer_ids_are_derived_from_owner() {
        assert_eq!(RecordId::from("tower").peer("label").as_str(), "tower#label");
    }

    #[test]
    fn positive_offset_promotes_clamp_to_relative() {
        let mut record = point();
        record.set_height_mode(HeightMode::ClampToGround);
        record.set_height_offset(50.0).unwrap();
        assert_eq!(record.height_mode(), HeightMode::RelativeToGround);
    }

    #[test]
    fn forcing_clamp_back_keeps_the_offset() {
        let mut record = point();
        record.set_height_mode(HeightMode::ClampToGround);
        record.set_height_offset(50.0).unwrap();
        record.set_height_mode(HeightMode::ClampToGround);

        assert_eq!(record.height_mode(), HeightMode::ClampToGround);
        assert_eq!(record.height_offset(), 50.0);
        record.ground_height = Some(7.0);
        record.refresh_altitude();
        assert_eq!(record.resolved_altitude(), 7.0);
    }

    #[test]
    fn validation_rejects_out_of_range_positions() {
        let mut record = point();
        record.position.latitude = 91.0;
        assert!(record.validate().is_err());
        record.position.latitude = f64::NAN;
        assert!(record.validate().is_err());
    }

    #[test]
    fn hidden_or_out_of_range_is_not_shown() {
        let mut visibility = Visibility::default();
        assert!(visibility.is_shown());
        visibility.height_range_visible = false;
        assert!(!visibility.is_shown());
    }
}
