use flame_canvas_protocol::Point;
use serde::{Deserialize, Serialize};

/// Pointer gesture the panel is currently in. Exactly one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InteractionState {
    /// Pointer is outside the canvas.
    #[default]
    Idle,
    /// Pointer is over the canvas with no button held.
    Hovering,
    /// Plain drag: pans the view.
    DraggingPan,
    /// Meta/ctrl drag: selects an x range to zoom into.
    DraggingSelect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: false,
    };

    pub const META: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
        meta: true,
    };

    /// Meta on macOS, ctrl elsewhere; hosts report whichever they have.
    pub fn zoom(&self) -> bool {
        self.meta || self.ctrl
    }
}

/// Wheel / trackpad scroll in logical pixels, relative to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelEvent {
    pub point: Point,
    pub delta_x: f64,
    pub delta_y: f64,
    #[serde(default)]
    pub modifiers: Modifiers,
}

/// What the host should do with the native wheel event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelOutcome {
    /// Suppress native page scroll / pinch zoom.
    pub prevent_default: bool,
    /// Whether the view was asked to change.
    pub handled: bool,
}
