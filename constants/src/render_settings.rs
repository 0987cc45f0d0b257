/// Mount priority for billboard peers (drawn first, underneath).
pub const LAYER_BILLBOARD: u8 = 0;

/// Mount priority for points and geometry shapes.
pub const LAYER_SHAPE: u8 = 1;

/// Mount priority for labels (drawn last, on top).
pub const LAYER_LABEL: u8 = 2;

/// Wireframe-style highlight applied to the selected record.
pub const SELECTION_HIGHLIGHT_COLOR: &str = "#ffff00";

/// Scale multiplier applied to the selected record.
pub const SELECTION_HIGHLIGHT_SCALE: f64 = 1.2;

pub const DEFAULT_MARKER_COLOR: &str = "#ffffff";
pub const DEFAULT_POINT_PIXEL_SIZE: f64 = 10.0;
pub const DEFAULT_LABEL_FONT: &str = "14px sans-serif";
