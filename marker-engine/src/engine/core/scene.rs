use bevy::log::{debug, info};

use crate::engine::core::config::SceneConfig;
use crate::engine::error::{MarkerError, Result};
use crate::engine::events::{EventBus, EventKind, HandlerId, HandlerResult, MarkerEvent};
use crate::engine::frame::{FrameScheduler, FrameTask};
use crate::engine::height::HeightResolver;
use crate::engine::height::visibility::CameraHeightFeed;
use crate::engine::lifecycle::registry::{RecordQuery, Registry};
use crate::engine::orientation;
use crate::engine::record::{Record, RecordId};
use crate::engine::render::RenderEngine;
use crate::rpc::{NotificationQueue, RpcNotification};
use crate::tools::interaction::InteractionState;

/// One independent marker scene bound to one render engine.
///
/// ```text
///   tick(now)
///     1. frame tasks (animation steps)
///     2. TTL eviction
///     3. terrain samples → height resolution
///     4. camera height → height-range visibility
///     5. orientation + position → derived fields
/// ```
///
/// Pointer input is fed between ticks through `handle_pointer`.
pub struct MarkerScene<E: RenderEngine> {
    pub(crate) engine: E,
    pub(crate) config: SceneConfig,
    pub(crate) registry: Registry,
    pub(crate) frames: FrameScheduler,
    pub(crate) heights: HeightResolver,
    pub(crate) camera_feed: CameraHeightFeed,
    pub(crate) events: EventBus,
    pub(crate) notifications: NotificationQueue,
    pub(crate) interaction: InteractionState,
    pub(crate) clock: f64,
    pub(crate) frame_count: u64,
}

impl<E: RenderEngine> MarkerScene<E> {
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, SceneConfig::default())
    }

    pub fn with_config(engine: E, config: SceneConfig) -> Self {
        info!(
            "Marker scene created (drag threshold {}px, notifications {})",
            config.drag_threshold_px, config.notifications
        );
        Self {
            engine,
            heights: HeightResolver::new(config.terrain_sample_quantum_deg, config.terrain_retry_seconds),
            notifications: NotificationQueue::new(config.notifications, config.notification_capacity),
            config,
            registry: Registry::default(),
            frames: FrameScheduler::default(),
            camera_feed: CameraHeightFeed::default(),
            events: EventBus::default(),
            interaction: InteractionState::default(),
            clock: 0.0,
            frame_count: 0,
        }
    }

    /// Destroys every mounted primitive and hands the engine back.
    pub fn teardown(mut self) -> E {
        let mut destroyed = 0;
        for record in self.registry.iter() {
            if let Some(handle) = record.handle {
                self.engine.destroy_primitive(handle);
                destroyed += 1;
            }
        }
        info!("Marker scene torn down, {} primitives destroyed", destroyed);
        self.engine
    }

    /// Hands the engine back with its primitives still in place, so a later
    /// scene can adopt them.
    pub fn into_engine(self) -> E {
        self.engine
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn get(&self, id: &RecordId) -> Option<&Record> {
        self.registry.get(id)
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.registry.contains(id)
    }

    pub fn query(&self, criteria: &RecordQuery) -> Vec<RecordId> {
        self.registry.query(criteria)
    }

    pub fn group(&self, name: &str) -> Vec<RecordId> {
        self.registry.group(name)
    }

    pub fn interaction(&self) -> &InteractionState {
        &self.interaction
    }

    /// Scene time (seconds) of the last tick.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn pending_frame_tasks(&self) -> usize {
        self.frames.len()
    }

    pub fn height_subscriptions(&self) -> usize {
        self.camera_feed.len()
    }

    /// Binds a handler to one record's events.
    pub fn on(
        &mut self,
        id: &RecordId,
        kind: EventKind,
        handler: impl FnMut(&MarkerEvent) -> HandlerResult + 'static,
    ) -> Result<HandlerId> {
        if !self.registry.contains(id) {
            return Err(MarkerError::UnknownRecord(id.clone()));
        }
        Ok(self.events.on(id.clone(), kind, handler))
    }

    /// Binds a scene-wide handler; `None` receives every kind.
    pub fn on_any(
        &mut self,
        kind: Option<EventKind>,
        handler: impl FnMut(&MarkerEvent) -> HandlerResult + 'static,
    ) -> HandlerId {
        self.events.on_any(kind, handler)
    }

    pub fn off(&mut self, handler: HandlerId) -> bool {
        self.events.off(handler)
    }

    pub fn drain_notifications(&mut self) -> Vec<RpcNotification> {
        self.notifications.drain()
    }

    pub(crate) fn emit(&mut self, event: MarkerEvent) {
        self.events.dispatch(&event);
        self.notifications.send_event(&event);
    }

    /// Runs one frame of per-frame work at scene time `now` (seconds).
    pub fn tick(&mut self, now: f64) {
        self.clock = now;
        self.frame_count += 1;

        for (handle, task) in self.frames.take_due() {
            match task {
                FrameTask::Animation(id) => self.step_animation(handle, &id, now),
            }
        }

        for id in self.registry.expired(now) {
            if self.registry.contains(&id) {
                debug!("Record {} expired", id);
                self.emit(MarkerEvent::for_record(EventKind::Expired, id.clone()));
                self.delete(&id);
            }
        }

        let samples = self.engine.poll_height_samples();
        if !samples.is_empty() {
            self.heights.absorb(samples, now);
        }
        for record in self.registry.values_mut() {
            if record.height_mode.needs_ground() {
                self.heights.resolve(record, &mut self.engine, now);
            }
        }

        if !self.camera_feed.is_empty() {
            let camera_height = self.engine.camera_height();
            for (id, visible) in self.camera_feed.publish(camera_height) {
                let changed = self.registry.get_mut(&id).is_some_and(|record| {
                    let changed = record.visibility.height_range_visible != visible;
                    record.visibility.height_range_visible = visible;
                    changed
                });
                if changed {
                    self.push(&id);
                }
            }
        }

        for record in self.registry.iter() {
            if let Some(handle) = record.handle {
                self.engine.update_derived(handle, &orientation::evaluate(record));
            }
        }
    }
}
