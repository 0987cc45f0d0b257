use bevy::log::{debug, warn};
use constants::animation::MIN_ANIMATION_SECONDS;

use super::builder::PendingAnimation;
use super::{AnimationContext, Interpolated, interpolate};
use crate::engine::core::scene::MarkerScene;
use crate::engine::error::{MarkerError, Result};
use crate::engine::events::{EventKind, MarkerEvent};
use crate::engine::frame::{FrameHandle, FrameTask};
use crate::engine::record::RecordId;
use crate::engine::record::capabilities::Animatable;
use crate::engine::record::fields::{Field, FieldMap, FieldRoute};
use crate::engine::render::RenderEngine;

impl<E: RenderEngine> MarkerScene<E> {
    /// Starts animating `id` towards the pending values, replacing any
    /// animation already running on it.
    pub fn animate(&mut self, id: &RecordId, pending: PendingAnimation) -> Result<()> {
        if !self.registry.contains(id) {
            return Err(MarkerError::UnknownRecord(id.clone()));
        }
        if !pending.duration.is_finite() || pending.duration <= MIN_ANIMATION_SECONDS {
            return self.update(id, pending.changes, 0.0);
        }

        // Sub-components are attached immediately; they have nothing to interpolate.
        let (composition, animated): (FieldMap, FieldMap) = pending
            .changes
            .into_iter()
            .partition(|(field, _)| field.route() == FieldRoute::Composition);
        if !composition.is_empty() {
            self.update(id, composition, 0.0)?;
        }

        self.cancel_animation(id);

        let record = self.registry.get(id).ok_or_else(|| MarkerError::UnknownRecord(id.clone()))?;
        let mut watched: Vec<Field> = animated.fields().collect();
        if animated.contains(Field::HeightOffset) && !animated.contains(Field::HeightMode) {
            watched.push(Field::HeightMode);
        }
        // Kind first so shape fields of the new kind can be written after it at completion.
        watched.sort_by_key(|field| *field != Field::Kind);

        let mut projected = record.clone();
        for field in &watched {
            if let Some(value) = animated.get(*field) {
                projected.write_field(*field, value)?;
            }
        }
        projected.validate()?;

        let current = record.snapshot(&watched);
        let wanted = projected.snapshot(&watched);
        let mut start = FieldMap::new();
        let mut target = FieldMap::new();
        for field in &watched {
            let Some(end) = wanted.get(*field) else {
                continue;
            };
            match current.get(*field) {
                Some(begin) if begin == end => {}
                Some(begin) => {
                    start.set(*field, begin.clone());
                    target.set(*field, end.clone());
                }
                None => target.set(*field, end.clone()),
            }
        }

        if target.is_empty() {
            debug!("Animation on {} changes nothing, skipped", id);
            return Ok(());
        }

        let frame = self.frames.register(FrameTask::Animation(id.clone()));
        let context = AnimationContext {
            frame,
            started_at: self.clock,
            duration: pending.duration,
            mode: pending.mode.unwrap_or(self.config.default_mode),
            easing: pending.easing.unwrap_or(self.config.default_easing),
            start,
            target,
            colors_applied: false,
        };
        debug!(
            "Animating {} fields of {} over {:.3}s ({:?})",
            context.target.len(),
            id,
            context.duration,
            context.mode
        );
        if let Some(record) = self.registry.get_mut(id) {
            record.animation = Some(context);
        }
        Ok(())
    }

    /// Stops the running animation where it is. Returns `false` if none was running.
    pub fn cancel_animation(&mut self, id: &RecordId) -> bool {
        let Some(context) = self.registry.get_mut(id).and_then(|record| record.animation.take()) else {
            return false;
        };
        self.frames.deregister(context.frame);
        true
    }

    /// Advances one animation by one frame. Stale handles are ignored.
    pub(crate) fn step_animation(&mut self, handle: FrameHandle, id: &RecordId, now: f64) {
        let Some(mut context) = self
            .registry
            .get_mut(id)
            .and_then(|record| record.animation.take_if(|context| context.frame == handle))
        else {
            return;
        };

        let progress = context.progress(now);
        let mut writes: Vec<(Field, _)> = Vec::new();
        for (field, end) in context.target.iter() {
            if progress.finished {
                writes.push((field, end.clone()));
                continue;
            }
            let step = match context.start.get(field) {
                Some(begin) => interpolate(begin, end, progress.for_field(field.is_angular())),
                None => Interpolated::SnapAtEnd,
            };
            match step {
                Interpolated::Value(value) => writes.push((field, value)),
                Interpolated::SnapOnFirst if !context.colors_applied => writes.push((field, end.clone())),
                Interpolated::SnapOnFirst | Interpolated::SnapAtEnd => {}
            }
        }
        context.colors_applied = true;

        let position_moved = writes.iter().any(|(field, _)| *field == Field::Position);
        for (field, value) in &writes {
            if let Err(err) = self.apply_field(id, *field, value) {
                warn!("Animation step on {} could not apply {}: {}", id, field, err);
            }
        }
        self.push(id);

        if progress.finished {
            debug!("Animation on {} finished", id);
            if position_moved {
                self.suppress_duplicates(id, &[]);
            }
            self.emit(MarkerEvent::for_record(EventKind::AnimationEnd, id.clone()));
        } else if let Some(record) = self.registry.get_mut(id) {
            context.frame = self.frames.register(FrameTask::Animation(id.clone()));
            record.animation = Some(context);
        }
    }
}
