use std::collections::VecDeque;

use bevy::log::warn;
use serde::{Deserialize, Serialize};

use crate::engine::events::MarkerEvent;

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

impl RpcNotification {
    pub fn new(method: &str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        }
    }
}

/// Outbox of notifications waiting for the host to forward them.
///
/// Bounded: once `capacity` notifications are waiting, each new one pushes
/// out the oldest.
#[derive(Debug)]
pub struct NotificationQueue {
    enabled: bool,
    capacity: usize,
    dropped: usize,
    outgoing: VecDeque<RpcNotification>,
}

impl Default for NotificationQueue {
    fn default() -> Self {
        Self::new(false, constants::interaction::NOTIFICATION_QUEUE_CAPACITY)
    }
}

impl NotificationQueue {
    pub fn new(enabled: bool, capacity: usize) -> Self {
        Self {
            enabled,
            capacity: capacity.max(1),
            dropped: 0,
            outgoing: VecDeque::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Queue a notification without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        if !self.enabled {
            return;
        }
        if self.outgoing.len() >= self.capacity {
            self.outgoing.pop_front();
            if self.dropped == 0 {
                warn!(
                    "Notification queue full ({}), dropping oldest until drained",
                    self.capacity
                );
            }
            self.dropped += 1;
        }
        self.outgoing.push_back(RpcNotification::new(method, params));
    }

    pub fn send_event(&mut self, event: &MarkerEvent) {
        if self.enabled {
            self.send_notification(event.kind.method(), event.to_params());
        }
    }

    pub fn len(&self) -> usize {
        self.outgoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outgoing.is_empty()
    }

    /// Notifications dropped since the last drain.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn drain(&mut self) -> Vec<RpcNotification> {
        self.dropped = 0;
        self.outgoing.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::events::EventKind;

    #[test]
    fn events_become_json_rpc_notifications() {
        let mut queue = NotificationQueue::new(true, 8);
        queue.send_event(&MarkerEvent::for_record(EventKind::DragEnd, "pin".into()));

        let sent = queue.drain();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].jsonrpc, "2.0");
        assert_eq!(sent[0].method, "marker_drag_end");
        assert_eq!(sent[0].params["target"]["record"], "pin");
        assert!(queue.is_empty());
    }

    #[test]
    fn disabled_queue_stays_empty() {
        let mut queue = NotificationQueue::new(false, 8);
        queue.send_notification("debug_message", serde_json::json!({ "message": "hi" }));
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_drops_the_oldest() {
        let mut queue = NotificationQueue::new(true, 2);
        for n in 0..3 {
            queue.send_notification("debug_message", serde_json::json!({ "n": n }));
        }
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.dropped(), 1);

        let sent = queue.drain();
        assert_eq!(sent[0].params["n"], 1);
        assert_eq!(sent[1].params["n"], 2);
        assert_eq!(queue.dropped(), 0);
    }
}
