//! Seam to the external rendering engine.
//!
//! The marker engine never draws. It describes primitives, pushes per-tick
//! derived values, asks for picks and rays, and requests terrain samples.
//! [`headless::HeadlessEngine`] is an in-memory implementation for tests and
//! hosts without a renderer.

pub mod headless;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use bevy::math::{DVec2, DVec3};
use serde::Serialize;
use thiserror::Error;

use crate::engine::geodesy::{self, Cartographic, Plane, Ray, cartographic_to_cartesian};
use crate::engine::height::terrain::SampleKey;
use crate::engine::orientation::{self, DerivedValues};
use crate::engine::record::capabilities::Stylable;
use crate::engine::record::kind::{KindTag, RecordKind};
use crate::engine::record::{Record, RecordId};

/// Opaque handle the engine returns for a created primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveHandle(pub u64);

/// Static description of a primitive, as sent on create/update.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrimitiveSpec {
    pub id: RecordId,
    pub kind: KindTag,
    pub shape: RecordKind,
    /// ECEF position at mount time; tracked afterwards through derived values.
    pub position: [f64; 3],
    pub orientation: Option<[f64; 4]>,
    pub color: String,
    pub opacity: f64,
    pub scale: f64,
    pub rotation: f64,
    pub show: bool,
    pub layer: u8,
}

impl PrimitiveSpec {
    pub fn from_record(record: &Record) -> Self {
        let derived = orientation::evaluate(record);
        let style = record.style();
        Self {
            id: record.id().clone(),
            kind: record.kind().tag(),
            shape: record.kind().clone(),
            position: derived
                .position
                .unwrap_or_else(|| cartographic_to_cartesian(&record.placement()).to_array()),
            orientation: derived.orientation,
            color: style.color.clone(),
            opacity: style.opacity,
            scale: style.scale,
            rotation: style.rotation,
            show: record.visibility().is_shown(),
            layer: record.kind().layer(),
        }
    }

    /// Hash of the full configuration, retained by the engine for adoption checks.
    pub fn config_hash(&self) -> u64 {
        let encoded = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = DefaultHasher::new();
        encoded.hash(&mut hasher);
        hasher.finish()
    }
}

/// One pick-list entry. `id` is `None` for engine content that is not a record.
#[derive(Debug, Clone, PartialEq)]
pub struct PickHit {
    pub id: Option<RecordId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
    Grabbing,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("terrain sample failed: {0}")]
pub struct SampleError(pub String);

/// Result of an asynchronous terrain request.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightSample {
    pub key: SampleKey,
    pub result: Result<f64, SampleError>,
}

/// What the marker engine needs from a renderer.
pub trait RenderEngine {
    /// Existing primitive for `id` and its retained configuration hash.
    fn find_primitive(&self, id: &RecordId) -> Option<(PrimitiveHandle, u64)>;
    fn create_primitive(&mut self, spec: &PrimitiveSpec) -> PrimitiveHandle;
    fn update_primitive(&mut self, handle: PrimitiveHandle, spec: &PrimitiveSpec);
    fn update_derived(&mut self, handle: PrimitiveHandle, derived: &DerivedValues);
    fn destroy_primitive(&mut self, handle: PrimitiveHandle);

    /// Hits under a screen point, topmost first.
    fn pick(&self, screen: DVec2) -> Vec<PickHit>;
    fn project(&self, screen: DVec2) -> Option<Ray>;

    fn intersect_ray_plane(&self, ray: &Ray, plane: &Plane) -> Option<DVec3> {
        geodesy::ray_plane_intersection(ray, plane)
    }

    fn intersect_ray_surface(&self, ray: &Ray) -> Option<DVec3> {
        geodesy::ray_surface_intersection(ray)
    }

    /// Fire-and-forget; the answer arrives through [`RenderEngine::poll_height_samples`].
    fn request_height_sample(&mut self, key: SampleKey, at: Cartographic);
    fn poll_height_samples(&mut self) -> Vec<HeightSample>;

    fn camera_height(&self) -> f64;
    fn set_cursor(&mut self, cursor: CursorStyle);
}
