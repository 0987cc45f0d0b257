//! One-shot per-frame callback slots.
//!
//! A task runs on the next tick only. Work that spans frames re-registers
//! itself from inside the tick, and cancelling is just deregistering.

use std::collections::BTreeMap;

use crate::engine::record::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameTask {
    /// Step the running animation of a record.
    Animation(RecordId),
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next: u64,
    tasks: BTreeMap<FrameHandle, FrameTask>,
}

impl FrameScheduler {
    pub fn register(&mut self, task: FrameTask) -> FrameHandle {
        self.next += 1;
        let handle = FrameHandle(self.next);
        self.tasks.insert(handle, task);
        handle
    }

    pub fn deregister(&mut self, handle: FrameHandle) -> bool {
        self.tasks.remove(&handle).is_some()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Takes every task due this frame, in registration order.
    pub fn take_due(&mut self) -> Vec<(FrameHandle, FrameTask)> {
        std::mem::take(&mut self.tasks).into_iter().collect()
    }
}
