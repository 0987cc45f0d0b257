use std::collections::HashMap;

use bevy::math::{DVec2, DVec3};

use super::{CursorStyle, HeightSample, PickHit, PrimitiveHandle, PrimitiveSpec, RenderEngine, SampleError};
use crate::engine::geodesy::{Cartographic, Ray, cartesian_to_cartographic, cartographic_to_cartesian, enu_frame};
use crate::engine::height::terrain::SampleKey;
use crate::engine::orientation::DerivedValues;
use crate::engine::record::RecordId;

/// Top-down orthographic camera looking straight down at `centre`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadlessCamera {
    pub centre: Cartographic,
    pub altitude: f64,
    pub metres_per_pixel: f64,
    pub viewport: DVec2,
}

impl Default for HeadlessCamera {
    fn default() -> Self {
        Self {
            centre: Cartographic::new(0.0, 0.0, 0.0),
            altitude: 1_000.0,
            metres_per_pixel: 1.0,
            viewport: DVec2::new(800.0, 600.0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeadlessPrimitive {
    pub spec: PrimitiveSpec,
    pub hash: u64,
    pub derived: DerivedValues,
    raised: u64,
}

impl HeadlessPrimitive {
    /// Current ECEF position, derived value first.
    pub fn position(&self) -> DVec3 {
        DVec3::from_array(self.derived.position.unwrap_or(self.spec.position))
    }
}

/// In-memory render engine: keeps primitives, answers picks from screen
/// footprints and samples terrain from a height function.
pub struct HeadlessEngine {
    pub camera: HeadlessCamera,
    /// Screen radius (pixels) within which a primitive is hit.
    pub pick_radius_px: f64,
    /// When set, terrain requests stay outstanding until released.
    pub hold_samples: bool,
    /// When set, terrain requests resolve with an error.
    pub fail_samples: bool,
    terrain: Box<dyn Fn(&Cartographic) -> f64>,
    primitives: HashMap<PrimitiveHandle, HeadlessPrimitive>,
    by_id: HashMap<RecordId, PrimitiveHandle>,
    foreign: Vec<(DVec2, f64)>,
    outstanding: Vec<(SampleKey, Cartographic)>,
    sample_log: Vec<SampleKey>,
    cursor: CursorStyle,
    next_handle: u64,
    next_raise: u64,
    created: usize,
    updated: usize,
    destroyed: usize,
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new(HeadlessCamera::default())
    }
}

impl HeadlessEngine {
    pub fn new(camera: HeadlessCamera) -> Self {
        Self {
            camera,
            pick_radius_px: 6.0,
            hold_samples: false,
            fail_samples: false,
            terrain: Box::new(|_| 0.0),
            primitives: HashMap::new(),
            by_id: HashMap::new(),
            foreign: Vec::new(),
            outstanding: Vec::new(),
            sample_log: Vec::new(),
            cursor: CursorStyle::Default,
            next_handle: 0,
            next_raise: 0,
            created: 0,
            updated: 0,
            destroyed: 0,
        }
    }

    pub fn with_terrain(mut self, terrain: impl Fn(&Cartographic) -> f64 + 'static) -> Self {
        self.terrain = Box::new(terrain);
        self
    }

    pub fn primitive(&self, id: &RecordId) -> Option<&HeadlessPrimitive> {
        self.by_id.get(id).and_then(|handle| self.primitives.get(handle))
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn created_count(&self) -> usize {
        self.created
    }

    pub fn updated_count(&self) -> usize {
        self.updated
    }

    pub fn destroyed_count(&self) -> usize {
        self.destroyed
    }

    pub fn sample_requests(&self) -> &[SampleKey] {
        &self.sample_log
    }

    pub fn cursor(&self) -> CursorStyle {
        self.cursor
    }

    /// Non-record content drawn above every primitive (e.g. a tileset).
    pub fn add_foreign_footprint(&mut self, centre: DVec2, radius_px: f64) {
        self.foreign.push((centre, radius_px));
    }

    pub fn screen_of_cartesian(&self, point: DVec3) -> DVec2 {
        let frame = enu_frame(&self.camera.centre);
        let origin = cartographic_to_cartesian(&self.camera.centre.with_height(0.0));
        let offset = point - origin;
        let half = self.camera.viewport * 0.5;
        DVec2::new(
            half.x + offset.dot(frame.x_axis) / self.camera.metres_per_pixel,
            half.y - offset.dot(frame.y_axis) / self.camera.metres_per_pixel,
        )
    }

    pub fn screen_of(&self, position: &Cartographic) -> DVec2 {
        self.screen_of_cartesian(cartographic_to_cartesian(position))
    }

    /// Geographic point on the surface below a screen point.
    pub fn geographic_under(&self, screen: DVec2) -> Option<Cartographic> {
        let ray = self.project(screen)?;
        self.intersect_ray_surface(&ray).and_then(cartesian_to_cartographic)
    }
}

impl RenderEngine for HeadlessEngine {
    fn find_primitive(&self, id: &RecordId) -> Option<(PrimitiveHandle, u64)> {
        let handle = *self.by_id.get(id)?;
        self.primitives.get(&handle).map(|p| (handle, p.hash))
    }

    fn create_primitive(&mut self, spec: &PrimitiveSpec) -> PrimitiveHandle {
        self.next_handle += 1;
        self.next_raise += 1;
        self.created += 1;
        let handle = PrimitiveHandle(self.next_handle);
        self.primitives.insert(
            handle,
            HeadlessPrimitive {
                spec: spec.clone(),
                hash: spec.config_hash(),
                derived: DerivedValues::default(),
                raised: self.next_raise,
            },
        );
        self.by_id.insert(spec.id.clone(), handle);
        handle
    }

    fn update_primitive(&mut self, handle: PrimitiveHandle, spec: &PrimitiveSpec) {
        if let Some(primitive) = self.primitives.get_mut(&handle) {
            primitive.hash = spec.config_hash();
            primitive.spec = spec.clone();
            self.updated += 1;
        }
    }

    fn update_derived(&mut self, handle: PrimitiveHandle, derived: &DerivedValues) {
        if let Some(primitive) = self.primitives.get_mut(&handle) {
            primitive.derived = *derived;
        }
    }

    fn destroy_primitive(&mut self, handle: PrimitiveHandle) {
        if let Some(primitive) = self.primitives.remove(&handle) {
            if self.by_id.get(&primitive.spec.id) == Some(&handle) {
                self.by_id.remove(&primitive.spec.id);
            }
            self.destroyed += 1;
        }
    }

    fn pick(&self, screen: DVec2) -> Vec<PickHit> {
        let mut hits: Vec<(u8, u64, &RecordId)> = self
            .primitives
            .values()
            .filter(|p| p.spec.show)
            .filter(|p| self.screen_of_cartesian(p.position()).distance(screen) <= self.pick_radius_px)
            .map(|p| (p.spec.layer, p.raised, &p.spec.id))
            .collect();
        hits.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

        let foreign = self
            .foreign
            .iter()
            .filter(|(centre, radius)| centre.distance(screen) <= *radius)
            .map(|_| PickHit { id: None });
        foreign
            .chain(hits.into_iter().map(|(_, _, id)| PickHit { id: Some(id.clone()) }))
            .collect()
    }

    fn project(&self, screen: DVec2) -> Option<Ray> {
        let frame = enu_frame(&self.camera.centre);
        let half = self.camera.viewport * 0.5;
        let d = (screen - half) * self.camera.metres_per_pixel;
        let above = cartographic_to_cartesian(&self.camera.centre.with_height(self.camera.altitude));
        let origin = above + frame.x_axis * d.x - frame.y_axis * d.y;
        Some(Ray::new(origin, -frame.z_axis))
    }

    fn request_height_sample(&mut self, key: SampleKey, at: Cartographic) {
        self.sample_log.push(key);
        self.outstanding.push((key, at));
    }

    fn poll_height_samples(&mut self) -> Vec<HeightSample> {
        if self.hold_samples {
            return Vec::new();
        }
        std::mem::take(&mut self.outstanding)
            .into_iter()
            .map(|(key, at)| HeightSample {
                key,
                result: if self.fail_samples {
                    Err(SampleError(format!("no terrain at {:.6}, {:.6}", at.longitude, at.latitude)))
                } else {
                    Ok((self.terrain)(&at))
                },
            })
            .collect()
    }

    fn camera_height(&self) -> f64 {
        self.camera.altitude
    }

    fn set_cursor(&mut self, cursor: CursorStyle) {
        self.cursor = cursor;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screen_centre_projects_onto_camera_centre() {
        let engine = HeadlessEngine::new(HeadlessCamera {
            centre: Cartographic::new(24.0, 56.0, 0.0),
            ..HeadlessCamera::default()
        });
        let under = engine.geographic_under(engine.camera.viewport * 0.5).unwrap();
        assert!(under.same_spot(&engine.camera.centre, 1e-9));
    }

    #[test]
    fn screen_of_inverts_project_near_the_centre() {
        let engine = HeadlessEngine::default();
        let screen = DVec2::new(420.0, 280.0);
        let ground = engine.geographic_under(screen).unwrap();
        let back = engine.screen_of(&ground);
        assert!(back.distance(screen) < 1e-3);
    }

    #[test]
    fn held_samples_stay_outstanding() {
        let mut engine = HeadlessEngine::default().with_terrain(|_| 42.0);
        engine.hold_samples = true;
        let key = SampleKey { lon: 1, lat: 2 };
        engine.request_height_sample(key, Cartographic::default());
        assert!(engine.poll_height_samples().is_empty());

        engine.hold_samples = false;
        let samples = engine.poll_height_samples();
        assert_eq!(samples, vec![HeightSample { key, result: Ok(42.0) }]);
    }
}
