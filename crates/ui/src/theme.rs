use flame_canvas_core::FlamegraphTheme;
use flame_canvas_protocol::{Color, Fill, ThemeToken};

/// Resolved RGBA color for egui rendering.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl ResolvedColor {
    const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_color32(self) -> egui::Color32 {
        egui::Color32::from_rgba_unmultiplied(self.r, self.g, self.b, self.a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Dark,
    Light,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Dark => ThemeMode::Light,
            ThemeMode::Light => ThemeMode::Dark,
        }
    }

    pub fn visuals(self) -> egui::Visuals {
        match self {
            ThemeMode::Dark => egui::Visuals::dark(),
            ThemeMode::Light => egui::Visuals::light(),
        }
    }

    /// Frame palette and sizes handed to the engine.
    pub fn flamegraph_theme(self) -> FlamegraphTheme {
        match self {
            ThemeMode::Dark => FlamegraphTheme::dark(),
            ThemeMode::Light => FlamegraphTheme::light(),
        }
    }
}

pub fn resolve(token: ThemeToken, mode: ThemeMode) -> egui::Color32 {
    match mode {
        ThemeMode::Dark => resolve_dark(token),
        ThemeMode::Light => resolve_light(token),
    }
    .to_color32()
}

/// Engine-computed colors carry their own alpha (dimmed frames).
pub fn color32(color: Color) -> egui::Color32 {
    let [r, g, b, a] = color.to_rgba8();
    egui::Color32::from_rgba_unmultiplied(r, g, b, a)
}

pub fn fill(fill: Fill, mode: ThemeMode) -> egui::Color32 {
    match fill {
        Fill::Token(token) => resolve(token, mode),
        Fill::Color(color) => color32(color),
    }
}

fn resolve_dark(token: ThemeToken) -> ResolvedColor {
    // Catppuccin Mocha palette
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(0x1e, 0x1e, 0x2e), // Base
        Border => ResolvedColor::rgb(0x31, 0x32, 0x44),     // Surface0

        FrameText => ResolvedColor::rgb(0x11, 0x11, 0x1b), // Crust
        FrameTextMuted => ResolvedColor::rgba(0x11, 0x11, 0x1b, 110),

        TimelineBackground => ResolvedColor::rgb(0x18, 0x18, 0x25), // Mantle
        TimelineBorder => ResolvedColor::rgb(0x45, 0x47, 0x5a),     // Surface1
        TimelineLabel => ResolvedColor::rgb(0xba, 0xc2, 0xde),      // Subtext1
        GridLine => ResolvedColor::rgba(0xcd, 0xd6, 0xf4, 28),

        SelectedFrameBorder => ResolvedColor::rgb(0x89, 0xdc, 0xeb), // Sky
        HoveredFrameBorder => ResolvedColor::rgba(0xcd, 0xd6, 0xf4, 200),

        SelectionRangeFill => ResolvedColor::rgba(0x89, 0xb4, 0xfa, 50), // Blue
        SelectionRangeBorder => ResolvedColor::rgb(0x89, 0xb4, 0xfa),
    }
}

fn resolve_light(token: ThemeToken) -> ResolvedColor {
    // Catppuccin Latte palette
    use ThemeToken::*;
    match token {
        Background => ResolvedColor::rgb(0xef, 0xf1, 0xf5), // Base
        Border => ResolvedColor::rgb(0xcc, 0xd0, 0xda),     // Surface0

        FrameText => ResolvedColor::rgb(0x1a, 0x1a, 0x2e),
        FrameTextMuted => ResolvedColor::rgba(0x1a, 0x1a, 0x2e, 110),

        TimelineBackground => ResolvedColor::rgb(0xe6, 0xe9, 0xef), // Mantle
        TimelineBorder => ResolvedColor::rgb(0xbc, 0xc0, 0xcc),     // Surface1
        TimelineLabel => ResolvedColor::rgb(0x5c, 0x5f, 0x77),      // Subtext1
        GridLine => ResolvedColor::rgba(0x4c, 0x4f, 0x69, 28),

        SelectedFrameBorder => ResolvedColor::rgb(0x1e, 0x66, 0xf5), // Blue
        HoveredFrameBorder => ResolvedColor::rgba(0x4c, 0x4f, 0x69, 200),

        SelectionRangeFill => ResolvedColor::rgba(0x1e, 0x66, 0xf5, 40),
        SelectionRangeBorder => ResolvedColor::rgb(0x1e, 0x66, 0xf5),
    }
}
