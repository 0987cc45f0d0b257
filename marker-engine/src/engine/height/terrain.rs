use std::collections::{HashMap, HashSet};

use crate::engine::geodesy::Cartographic;

/// Terrain cache key: longitude/latitude snapped to a fixed grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleKey {
    pub lon: i64,
    pub lat: i64,
}

/// Ground heights keyed by grid cell, plus the cells with a request in flight
/// and the cells backing off after a failed sample.
#[derive(Debug)]
pub struct TerrainCache {
    quantum: f64,
    retry_seconds: f64,
    samples: HashMap<SampleKey, f64>,
    pending: HashSet<SampleKey>,
    retry_at: HashMap<SampleKey, f64>,
}

impl TerrainCache {
    pub fn new(quantum_deg: f64, retry_seconds: f64) -> Self {
        Self {
            quantum: quantum_deg,
            retry_seconds,
            samples: HashMap::new(),
            pending: HashSet::new(),
            retry_at: HashMap::new(),
        }
    }

    pub fn key_for(&self, position: &Cartographic) -> SampleKey {
        SampleKey {
            lon: (position.longitude / self.quantum).round() as i64,
            lat: (position.latitude / self.quantum).round() as i64,
        }
    }

    pub fn cached(&self, key: SampleKey) -> Option<f64> {
        self.samples.get(&key).copied()
    }

    pub fn is_pending(&self, key: SampleKey) -> bool {
        self.pending.contains(&key)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Marks the key as in flight. `false` if a request is already
    /// outstanding or the key is still backing off from a failure.
    pub fn begin_request(&mut self, key: SampleKey, now: f64) -> bool {
        if self.pending.contains(&key) {
            return false;
        }
        if self.retry_at.get(&key).is_some_and(|at| now < *at) {
            return false;
        }
        self.retry_at.remove(&key);
        self.pending.insert(key)
    }

    /// Clears the in-flight mark. A failed sample (`None`) leaves the old
    /// value and holds the key back for the retry interval.
    pub fn complete(&mut self, key: SampleKey, height: Option<f64>, now: f64) {
        self.pending.remove(&key);
        match height {
            Some(height) => {
                self.samples.insert(key, height);
                self.retry_at.remove(&key);
            }
            None => {
                self.retry_at.insert(key, now + self.retry_seconds);
            }
        }
    }
}
