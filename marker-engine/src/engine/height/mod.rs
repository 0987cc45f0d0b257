//! Height resolution: height mode + offset (+ terrain sample) → altitude.
//!
//! ```text
//!   none              altitude = position.height
//!   clampToGround     altitude = ground
//!   relativeToGround  altitude = ground + offset
//! ```
//!
//! Ground heights come from the render engine asynchronously. Until a sample
//! lands the record keeps using the last cached ground height (or zero).

pub mod terrain;
pub mod visibility;

use bevy::log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::engine::record::Record;
use crate::engine::render::{HeightSample, RenderEngine};
use terrain::TerrainCache;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HeightMode {
    #[default]
    None,
    ClampToGround,
    RelativeToGround,
}

impl HeightMode {
    pub fn needs_ground(self) -> bool {
        self != Self::None
    }
}

pub fn resolve_altitude(mode: HeightMode, height: f64, offset: f64, ground: Option<f64>) -> f64 {
    match mode {
        HeightMode::None => height,
        HeightMode::ClampToGround => ground.unwrap_or(0.0),
        HeightMode::RelativeToGround => ground.unwrap_or(0.0) + offset,
    }
}

/// Resolves record altitudes against the shared terrain cache.
#[derive(Debug)]
pub struct HeightResolver {
    cache: TerrainCache,
}

impl HeightResolver {
    pub fn new(quantum_deg: f64, retry_seconds: f64) -> Self {
        Self {
            cache: TerrainCache::new(quantum_deg, retry_seconds),
        }
    }

    pub fn cache(&self) -> &TerrainCache {
        &self.cache
    }

    /// Updates the record's ground height from cache and fires a sample
    /// request if this spot is neither cached, in flight, nor backing off.
    pub fn resolve<E: RenderEngine>(&mut self, record: &mut Record, engine: &mut E, now: f64) {
        if !record.height_mode.needs_ground() {
            record.refresh_altitude();
            return;
        }

        let key = self.cache.key_for(&record.position);
        match self.cache.cached(key) {
            Some(ground) => record.ground_height = Some(ground),
            None => {
                if self.cache.begin_request(key, now) {
                    debug!("Requesting terrain sample for {} at {:?}", record.id, key);
                    engine.request_height_sample(key, record.position);
                }
            }
        }
        record.refresh_altitude();
    }

    /// Folds finished samples into the cache. Returns how many succeeded.
    pub fn absorb(&mut self, samples: Vec<HeightSample>, now: f64) -> usize {
        let mut landed = 0;
        for sample in samples {
            match sample.result {
                Ok(height) => {
                    self.cache.complete(sample.key, Some(height), now);
                    landed += 1;
                }
                Err(err) => {
                    warn!("Terrain sample at {:?} failed, keeping cached height: {}", sample.key, err);
                    self.cache.complete(sample.key, None, now);
                }
            }
        }
        landed
    }
}
