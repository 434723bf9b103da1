use serde::{Deserialize, Serialize};

use crate::shared_str::SharedStr;
use crate::theme::ThemeToken;
use crate::types::{Fill, Point, Rect};

/// A single, stateless render instruction.
///
/// Each canvas records a `Vec<RenderCommand>` per frame. Hosts replay the
/// list sequentially; later commands paint over earlier ones. All
/// coordinates are physical (device) pixels of the recording canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RenderCommand {
    /// Wipe the whole canvas to transparent.
    Clear,

    /// Draw a filled rectangle, optionally tagged with the flamegraph node
    /// it represents (hosts use this for tooltips / accessibility).
    DrawRect {
        rect: Rect,
        fill: Fill,
        frame_id: Option<u32>,
    },

    /// Stroke the outline of a rectangle. The stroke is centered on the
    /// rect's edges.
    StrokeRect {
        rect: Rect,
        color: ThemeToken,
        width: f64,
    },

    /// Draw a text string. `position.y` is the vertical center of the text.
    DrawText {
        position: Point,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    },

    /// Draw a line segment.
    DrawLine {
        from: Point,
        to: Point,
        color: ThemeToken,
        width: f64,
    },

    /// Restrict subsequent drawing to a rectangular region.
    SetClip { rect: Rect },

    /// Remove the active clip region.
    ClearClip,

    /// Begin a logical group (one renderer's output). Hosts may use this
    /// for batching or layer separation.
    BeginGroup { id: SharedStr },

    /// End the current group.
    EndGroup,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}
