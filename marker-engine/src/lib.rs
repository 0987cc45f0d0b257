//! Lifecycle, animation and pointer interaction for markers anchored to a
//! geodetic surface.
//!
//! ## Architecture
//!
//! ```text
//!   host input ──▶ MarkerScene::handle_pointer ──┐
//!                                                ▼
//!   Record::factory ─▶ add / update / animate ─▶ Registry ──▶ RenderEngine
//!                                                ▲              (primitives,
//!   host frame ───▶ MarkerScene::tick ───────────┘               picks, rays,
//!                   animations, TTL, terrain,                    terrain)
//!                   height visibility, orientation
//!
//!   events ──▶ handlers (on / on_any)
//!          └─▶ JSON-RPC notification queue
//! ```
//!
//! Everything runs on one thread. A scene owns its render engine; dropping
//! or tearing down the scene is the only global teardown.
//!
//! ```
//! use marker_engine::prelude::*;
//!
//! let mut scene = MarkerScene::new(HeadlessEngine::default());
//! let options = MarkerOptions::point("depot", Cartographic::new(24.1, 56.9, 0.0)).in_group("sites");
//! let id = scene.add(Record::factory(options).unwrap()).unwrap();
//!
//! scene
//!     .animate(&id, AnimationBuilder::new(2.0).opacity(0.2).build())
//!     .unwrap();
//! scene.tick(1.0);
//! scene.tick(2.0);
//! assert_eq!(scene.get(&id).unwrap().style().opacity, 0.2);
//! ```

pub mod engine;
pub mod plugin;
pub mod rpc;
pub mod tools;

pub use engine::animation::builder::{AnimationBuilder, PendingAnimation};
pub use engine::animation::easing::{Easing, TemporalMode};
pub use engine::core::config::{SceneConfig, SelectionStyle};
pub use engine::core::scene::MarkerScene;
pub use engine::error::{MarkerError, Result};
pub use engine::events::{EventKind, EventTarget, HandlerId, HandlerResult, MarkerEvent};
pub use engine::geodesy::Cartographic;
pub use engine::height::HeightMode;
pub use engine::lifecycle::registry::{GeoBounds, RecordQuery};
pub use engine::record::fields::{Field, FieldMap, FieldValue};
pub use engine::record::kind::{Axis, AxisRotation, GeometryVariant, KindTag};
pub use engine::record::options::{BillboardOptions, LabelOptions, MarkerBundle, MarkerOptions};
pub use engine::record::{HeightRange, Record, RecordId};
pub use engine::render::headless::{HeadlessCamera, HeadlessEngine};
pub use engine::render::{CursorStyle, RenderEngine};
pub use plugin::MarkerScenePlugin;
pub use tools::interaction::{PointerButton, PointerInput};

/// Common imports, including the record capability traits.
pub mod prelude {
    pub use crate::engine::record::capabilities::{Animatable, Orientable, Positioned, Stylable};
    pub use crate::{
        AnimationBuilder, Cartographic, Easing, EventKind, Field, FieldMap, FieldValue, GeometryVariant,
        HeadlessEngine, HeightMode, KindTag, MarkerEvent, MarkerOptions, MarkerScene, Record, RecordId,
        SceneConfig, TemporalMode,
    };
}
