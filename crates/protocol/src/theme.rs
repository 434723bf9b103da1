use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    Background,
    Border,

    // Frame labels
    FrameText,
    FrameTextMuted,

    // Timeline / grid
    TimelineBackground,
    TimelineBorder,
    TimelineLabel,
    GridLine,

    // Selection state
    SelectedFrameBorder,
    HoveredFrameBorder,
    SelectionRangeFill,
    SelectionRangeBorder,
}
