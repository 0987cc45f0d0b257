//! Pointer interaction: hover, click/selection and threshold-gated drag.
//!
//! ## State machine
//!
//! ```text
//!            down on draggable          moved > threshold
//!   Idle ─────────────────────▶ Armed ─────────────────────▶ Dragging
//!    ▲                            │                             │
//!    └──────────── up ────────────┴──────────── up ─────────────┘
//!                 (silent)                   (dragend)
//! ```
//!
//! Hover and selection overlay the drag phase:
//! - Moving with no button pressed tracks the topmost record and switches
//!   the cursor affordance.
//! - A left click that did not end a drag selects the topmost record, or
//!   clears the selection when nothing is hit.
//! - A right click reports the record or surface point under the pointer.
//!
//! ## Dragging
//!
//! The drag runs on the plane tangent to the ellipsoid at the record's anchor,
//! so elevated records do not jump by the parallax between the pointer ray
//! and the ground. Records clamped to the ground with no offset drag along
//! the surface instead. The anchor keeps its initial offset from the pointer
//! intersection, and only longitude/latitude change.

/// Pointer event handling for drag, hover and click.
pub mod pointer;

/// Select, deselect and delete-selected.
pub mod selection;

/// Interaction state and pointer input types.
pub mod state;

pub use state::{DragPhase, InteractionState, PointerButton, PointerInput};
