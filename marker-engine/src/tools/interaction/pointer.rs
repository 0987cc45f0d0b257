use std::mem;

use bevy::log::{debug, warn};
use bevy::math::{DVec2, DVec3};

use super::state::{DragPhase, PointerButton, PointerInput};
use crate::engine::core::scene::MarkerScene;
use crate::engine::events::{EventKind, EventTarget, MarkerEvent};
use crate::engine::geodesy::{Plane, cartesian_to_cartographic, cartographic_to_cartesian};
use crate::engine::height::HeightMode;
use crate::engine::record::RecordId;
use crate::engine::record::fields::{Field, FieldValue};
use crate::engine::render::{CursorStyle, RenderEngine};

impl<E: RenderEngine> MarkerScene<E> {
    /// Feeds one pointer event through the interaction state machine.
    pub fn handle_pointer(&mut self, input: PointerInput) {
        match input {
            PointerInput::Down { button, position } => self.pointer_down(button, position),
            PointerInput::Move { position } => self.pointer_move(position),
            PointerInput::Up { position, .. } => self.pointer_up(position),
            PointerInput::Click {
                button: PointerButton::Left,
                position,
            } => self.left_click(position),
            PointerInput::Click {
                button: PointerButton::Right,
                position,
            } => self.right_click(position),
        }
    }

    /// Topmost pick hit, if it is a registered record. Foreign content on
    /// top hides whatever lies beneath it.
    pub(crate) fn record_at(&self, screen: DVec2) -> Option<RecordId> {
        self.engine
            .pick(screen)
            .into_iter()
            .next()
            .and_then(|hit| hit.id)
            .filter(|id| self.registry.contains(id))
    }

    fn pointer_down(&mut self, button: PointerButton, position: DVec2) {
        self.interaction.button_down = true;
        self.interaction.drag_occurred = false;
        if button != PointerButton::Left {
            return;
        }
        let Some(id) = self.record_at(position) else {
            return;
        };
        if self.registry.get(&id).is_some_and(|record| record.draggable) {
            debug!("Drag armed on {}", id);
            self.interaction.phase = DragPhase::Armed { id, down: position };
        }
    }

    fn pointer_move(&mut self, position: DVec2) {
        match &self.interaction.phase {
            DragPhase::Armed { id, down } => {
                if down.distance(position) > self.config.drag_threshold_px {
                    let id = id.clone();
                    self.start_drag(id, position);
                }
            }
            DragPhase::Dragging { id, plane, offset } => {
                let (id, plane, offset) = (id.clone(), *plane, *offset);
                self.continue_drag(&id, plane, offset, position);
            }
            DragPhase::Idle if !self.interaction.button_down => self.update_hover(position),
            DragPhase::Idle => {}
        }
    }

    /// Surface point under the pointer: the drag plane if there is one and
    /// the ray meets it, the ground otherwise.
    fn drag_intersection(&self, plane: Option<&Plane>, screen: DVec2) -> Option<DVec3> {
        let ray = self.engine.project(screen)?;
        plane
            .and_then(|plane| self.engine.intersect_ray_plane(&ray, plane))
            .or_else(|| self.engine.intersect_ray_surface(&ray))
    }

    fn start_drag(&mut self, id: RecordId, position: DVec2) {
        let Some(record) = self.registry.get(&id) else {
            self.interaction.phase = DragPhase::Idle;
            return;
        };
        let anchor = record.placement();
        let plane = (record.height_mode != HeightMode::ClampToGround || record.height_offset != 0.0)
            .then(|| Plane::tangent_at(&anchor));

        let Some(hit) = self.drag_intersection(plane.as_ref(), position) else {
            debug!("Drag on {} not started, pointer misses the globe", id);
            return;
        };
        let offset = cartographic_to_cartesian(&anchor) - hit;

        debug!("Drag started on {} ({})", id, if plane.is_some() { "plane" } else { "ground" });
        self.interaction.phase = DragPhase::Dragging {
            id: id.clone(),
            plane,
            offset,
        };
        self.engine.set_cursor(CursorStyle::Grabbing);
        self.emit(
            MarkerEvent::for_record(EventKind::DragStart, id)
                .at_screen(position)
                .at_position(anchor),
        );
    }

    fn continue_drag(&mut self, id: &RecordId, plane: Option<Plane>, offset: DVec3, position: DVec2) {
        let Some(hit) = self.drag_intersection(plane.as_ref(), position) else {
            return;
        };
        let Some(target) = cartesian_to_cartographic(hit + offset) else {
            return;
        };

        let lon_lat = FieldValue::Array(vec![target.longitude, target.latitude]);
        if let Err(err) = self.apply_field(id, Field::Position, &lon_lat) {
            warn!("Drag on {} rejected: {}", id, err);
            return;
        }
        self.push(id);

        let placed = self.registry.get(id).map(|record| record.placement());
        let mut event = MarkerEvent::for_record(EventKind::Drag, id.clone()).at_screen(position);
        event.position = placed;
        self.emit(event);
    }

    fn pointer_up(&mut self, position: DVec2) {
        self.interaction.button_down = false;
        let DragPhase::Dragging { id, .. } = mem::take(&mut self.interaction.phase) else {
            return;
        };

        debug!("Drag ended on {}", id);
        self.interaction.drag_occurred = true;
        let cursor = if self.interaction.hovered.is_some() {
            CursorStyle::Pointer
        } else {
            CursorStyle::Default
        };
        self.engine.set_cursor(cursor);
        if !self.registry.contains(&id) {
            return;
        }
        self.suppress_duplicates(&id, &[]);

        let placed = self.registry.get(&id).map(|record| record.placement());
        let mut event = MarkerEvent::for_record(EventKind::DragEnd, id).at_screen(position);
        event.position = placed;
        self.emit(event);
    }

    fn update_hover(&mut self, position: DVec2) {
        let hit = self.record_at(position);
        if hit == self.interaction.hovered {
            return;
        }

        if let Some(previous) = self.interaction.hovered.take() {
            if let Some(record) = self.registry.get_mut(&previous) {
                record.hovered = false;
            }
            self.emit(MarkerEvent::for_record(EventKind::HoverEnd, previous).at_screen(position));
        }
        match hit {
            Some(id) => {
                if let Some(record) = self.registry.get_mut(&id) {
                    record.hovered = true;
                }
                self.interaction.hovered = Some(id.clone());
                self.engine.set_cursor(CursorStyle::Pointer);
                self.emit(MarkerEvent::for_record(EventKind::HoverStart, id).at_screen(position));
            }
            None => self.engine.set_cursor(CursorStyle::Default),
        }
    }

    fn left_click(&mut self, position: DVec2) {
        if mem::take(&mut self.interaction.drag_occurred) {
            return;
        }
        let Some(id) = self.record_at(position) else {
            self.deselect();
            return;
        };

        self.emit(MarkerEvent::for_record(EventKind::Click, id.clone()).at_screen(position));
        if let Err(err) = self.select(&id) {
            warn!("Selecting {} failed: {}", id, err);
        }
    }

    fn right_click(&mut self, position: DVec2) {
        let target = match self.record_at(position) {
            Some(id) => EventTarget::Record(id),
            None => {
                let surface = self
                    .engine
                    .project(position)
                    .and_then(|ray| self.engine.intersect_ray_surface(&ray))
                    .and_then(cartesian_to_cartographic);
                match surface {
                    Some(point) => EventTarget::Surface(point),
                    None => {
                        debug!("Right click at {:?} hit neither a record nor the globe", position);
                        return;
                    }
                }
            }
        };
        let position_of = match &target {
            EventTarget::Record(id) => self.registry.get(id).map(|record| record.placement()),
            EventTarget::Surface(point) => Some(*point),
        };
        self.emit(MarkerEvent {
            kind: EventKind::RightClick,
            target,
            screen: Some(position),
            position: position_of,
        });
    }
}
