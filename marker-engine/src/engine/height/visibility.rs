use std::collections::BTreeMap;

use crate::engine::record::{HeightRange, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Camera-height readout fanned out to records with a height range.
#[derive(Debug, Default)]
pub struct CameraHeightFeed {
    next: u64,
    subscribers: BTreeMap<SubscriptionId, (RecordId, HeightRange)>,
    last_height: Option<f64>,
}

impl CameraHeightFeed {
    pub fn subscribe(&mut self, id: RecordId, range: HeightRange) -> SubscriptionId {
        self.next += 1;
        let subscription = SubscriptionId(self.next);
        self.subscribers.insert(subscription, (id, range));
        subscription
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        self.subscribers.remove(&subscription).is_some()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn last_height(&self) -> Option<f64> {
        self.last_height
    }

    /// Visibility of every subscriber at `height`.
    pub fn publish(&mut self, height: f64) -> Vec<(RecordId, bool)> {
        self.last_height = Some(height);
        self.subscribers
            .values()
            .map(|(id, range)| (id.clone(), range.contains(height)))
            .collect()
    }
}
