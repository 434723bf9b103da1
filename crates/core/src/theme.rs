use flame_canvas_protocol::Color;
use serde::{Deserialize, Serialize};

/// Frame palette and size constants for one panel.
///
/// Semantic chrome colors (grid, labels, borders) are `ThemeToken`s that
/// the host resolves; only colors the core computes per frame live here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlamegraphTheme {
    pub colors: FlamegraphColors,
    pub sizes: FlamegraphSizes,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlamegraphColors {
    /// Saturation of spectrum bucket colors (0..1).
    pub spectrum_saturation: f64,
    /// Lightness of spectrum bucket colors (0..1).
    pub spectrum_lightness: f64,
    /// Starting hue of the spectrum in degrees.
    pub spectrum_hue_offset: f64,
    pub application_frame: Color,
    pub system_frame: Color,
    /// Frames whose symbol already appears on their own stack.
    pub recursion: Color,
    /// Used for frames missing from the color map.
    pub fallback: Color,
    /// Alpha applied to frames outside the active search results.
    pub dimmed_alpha: f32,
}

/// Sizes are logical pixels; renderers multiply by the device pixel ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlamegraphSizes {
    pub bar_height: f64,
    pub bar_font_size: f64,
    pub bar_padding: f64,
    pub frame_border_width: f64,
    /// Minimum characters (before the ellipsis) worth drawing in a label.
    pub min_label_chars: usize,
    pub timeline_height: f64,
    pub timeline_font_size: f64,
    pub timeline_label_padding: f64,
    /// Lower bound on the distance between two grid ticks.
    pub min_tick_spacing: f64,
    pub grid_line_width: f64,
    pub selected_border_width: f64,
    pub hovered_border_width: f64,
}

impl FlamegraphTheme {
    pub fn dark() -> Self {
        Self {
            colors: FlamegraphColors {
                spectrum_saturation: 0.55,
                spectrum_lightness: 0.45,
                spectrum_hue_offset: 200.0,
                application_frame: Color::from_rgb8(0x89, 0xb4, 0xfa),
                system_frame: Color::from_rgb8(0xf3, 0x8b, 0xa8),
                recursion: Color::from_rgb8(0xf9, 0xe2, 0xaf),
                fallback: Color::from_rgb8(0x58, 0x5b, 0x70),
                dimmed_alpha: 0.25,
            },
            sizes: FlamegraphSizes::default(),
        }
    }

    pub fn light() -> Self {
        Self {
            colors: FlamegraphColors {
                spectrum_saturation: 0.65,
                spectrum_lightness: 0.72,
                spectrum_hue_offset: 200.0,
                application_frame: Color::from_rgb8(0x1e, 0x66, 0xf5),
                system_frame: Color::from_rgb8(0xd2, 0x0f, 0x39),
                recursion: Color::from_rgb8(0xdf, 0x8e, 0x1d),
                fallback: Color::from_rgb8(0xbc, 0xc0, 0xcc),
                dimmed_alpha: 0.3,
            },
            sizes: FlamegraphSizes::default(),
        }
    }
}

impl Default for FlamegraphTheme {
    fn default() -> Self {
        Self::dark()
    }
}

impl Default for FlamegraphColors {
    fn default() -> Self {
        FlamegraphTheme::dark().colors
    }
}

impl Default for FlamegraphSizes {
    fn default() -> Self {
        Self {
            bar_height: 20.0,
            bar_font_size: 11.0,
            bar_padding: 4.0,
            frame_border_width: 1.0,
            min_label_chars: 2,
            timeline_height: 20.0,
            timeline_font_size: 10.0,
            timeline_label_padding: 4.0,
            min_tick_spacing: 80.0,
            grid_line_width: 1.0,
            selected_border_width: 2.0,
            hovered_border_width: 1.0,
        }
    }
}
