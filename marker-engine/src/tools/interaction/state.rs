use bevy::math::{DVec2, DVec3};

use crate::engine::geodesy::Plane;
use crate::engine::record::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Right,
}

/// Pointer input as reported by the host, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerInput {
    Down { button: PointerButton, position: DVec2 },
    Move { position: DVec2 },
    Up { button: PointerButton, position: DVec2 },
    Click { button: PointerButton, position: DVec2 },
}

impl PointerInput {
    pub fn position(&self) -> DVec2 {
        match *self {
            Self::Down { position, .. }
            | Self::Move { position }
            | Self::Up { position, .. }
            | Self::Click { position, .. } => position,
        }
    }
}

/// Exclusive drag phase. Hover and selection live beside it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DragPhase {
    #[default]
    Idle,
    Armed {
        id: RecordId,
        down: DVec2,
    },
    Dragging {
        id: RecordId,
        /// `None` drags along the ground surface.
        plane: Option<Plane>,
        /// Anchor minus the intersection at drag start (ECEF).
        offset: DVec3,
    },
}

#[derive(Debug, Clone, Default)]
pub struct InteractionState {
    pub(crate) phase: DragPhase,
    pub(crate) hovered: Option<RecordId>,
    pub(crate) selected: Option<RecordId>,
    pub(crate) button_down: bool,
    /// Set when a drag ends so the click that follows the release is ignored.
    pub(crate) drag_occurred: bool,
}

impl InteractionState {
    pub fn phase(&self) -> &DragPhase {
        &self.phase
    }

    pub fn hovered(&self) -> Option<&RecordId> {
        self.hovered.as_ref()
    }

    pub fn selected(&self) -> Option<&RecordId> {
        self.selected.as_ref()
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, DragPhase::Dragging { .. })
    }

    /// Drops every reference to a deleted record. Returns `true` if the
    /// cursor affordance should be reset.
    pub(crate) fn forget(&mut self, id: &RecordId) -> bool {
        let mut reset_cursor = false;
        if self.hovered.as_ref() == Some(id) {
            self.hovered = None;
            reset_cursor = true;
        }
        if self.selected.as_ref() == Some(id) {
            self.selected = None;
        }
        let in_phase = match &self.phase {
            DragPhase::Armed { id: active, .. } | DragPhase::Dragging { id: active, .. } => active == id,
            DragPhase::Idle => false,
        };
        if in_phase {
            reset_cursor |= self.is_dragging();
            self.phase = DragPhase::Idle;
        }
        reset_cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forgetting_the_dragged_record_returns_to_idle() {
        let mut state = InteractionState {
            phase: DragPhase::Dragging {
                id: "a".into(),
                plane: None,
                offset: DVec3::ZERO,
            },
            hovered: Some("a".into()),
            selected: Some("b".into()),
            ..InteractionState::default()
        };
        assert!(state.forget(&"a".into()));
        assert_eq!(state.phase(), &DragPhase::Idle);
        assert!(state.hovered().is_none());
        assert_eq!(state.selected(), Some(&RecordId::from("b")));
        assert!(!state.forget(&"c".into()));
    }
}
