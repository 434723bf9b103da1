use flame_canvas_protocol::{Color, ThemeToken};

/// Default resolution of chrome tokens for hosts without their own
/// design system (terminal, SVG, plain JS canvas).
pub fn token_color(token: ThemeToken, dark: bool) -> Color {
    let rgb = if dark {
        match token {
            ThemeToken::Background => (0x1e, 0x1e, 0x2e),
            ThemeToken::Border => (0x31, 0x32, 0x44),
            ThemeToken::FrameText => (0x11, 0x11, 0x1b),
            ThemeToken::FrameTextMuted => (0x45, 0x47, 0x5a),
            ThemeToken::TimelineBackground => (0x18, 0x18, 0x25),
            ThemeToken::TimelineBorder => (0x45, 0x47, 0x5a),
            ThemeToken::TimelineLabel => (0xba, 0xc2, 0xde),
            ThemeToken::GridLine => (0x31, 0x32, 0x44),
            ThemeToken::SelectedFrameBorder => (0x89, 0xdc, 0xeb),
            ThemeToken::HoveredFrameBorder => (0xcd, 0xd6, 0xf4),
            ThemeToken::SelectionRangeFill => {
                return Color::from_rgb8(0x89, 0xb4, 0xfa).with_alpha(0.2);
            }
            ThemeToken::SelectionRangeBorder => (0x89, 0xb4, 0xfa),
        }
    } else {
        match token {
            ThemeToken::Background => (0xff, 0xff, 0xff),
            ThemeToken::Border => (0xdc, 0xe0, 0xe8),
            ThemeToken::FrameText => (0x1a, 0x1a, 0x2e),
            ThemeToken::FrameTextMuted => (0x8c, 0x8f, 0xa1),
            ThemeToken::TimelineBackground => (0xf5, 0xf6, 0xf8),
            ThemeToken::TimelineBorder => (0xdc, 0xe0, 0xe8),
            ThemeToken::TimelineLabel => (0x4c, 0x4f, 0x69),
            ThemeToken::GridLine => (0xe6, 0xe9, 0xef),
            ThemeToken::SelectedFrameBorder => (0x1e, 0x66, 0xf5),
            ThemeToken::HoveredFrameBorder => (0x4c, 0x4f, 0x69),
            ThemeToken::SelectionRangeFill => {
                return Color::from_rgb8(0x1e, 0x66, 0xf5).with_alpha(0.15);
            }
            ThemeToken::SelectionRangeBorder => (0x1e, 0x66, 0xf5),
        }
    };
    Color::from_rgb8(rgb.0, rgb.1, rgb.2)
}
