use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::ColorCoding;
use crate::theme::FlamegraphTheme;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Per-renderer switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererOptions {
    /// Leave a one-pixel gap between neighbouring frames.
    pub draw_border: bool,
    pub color_coding: ColorCoding,
    /// Tint frames whose symbol already appears further up their stack.
    pub highlight_recursion: bool,
    /// Override the flamegraph's own `inverted` flag.
    pub inverted: Option<bool>,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            draw_border: true,
            color_coding: ColorCoding::BySymbolName,
            highlight_recursion: false,
            inverted: None,
        }
    }
}

/// Everything a `FlamegraphZoomView` is configured with.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomViewConfig {
    pub theme: FlamegraphTheme,
    pub options: RendererOptions,
}

impl ZoomViewConfig {
    pub fn from_json(data: &[u8]) -> Result<Self, ConfigError> {
        let config: ZoomViewConfig = serde_json::from_slice(data)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&data)
    }

    /// Reject sizes that would make every frame degenerate.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sizes = &self.theme.sizes;
        let positive = [
            ("bar_height", sizes.bar_height),
            ("bar_font_size", sizes.bar_font_size),
            ("timeline_font_size", sizes.timeline_font_size),
            ("min_tick_spacing", sizes.min_tick_spacing),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("bar_padding", sizes.bar_padding),
            ("frame_border_width", sizes.frame_border_width),
            ("timeline_height", sizes.timeline_height),
            ("selected_border_width", sizes.selected_border_width),
            ("hovered_border_width", sizes.hovered_border_width),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        let alpha = self.theme.colors.dimmed_alpha;
        if !(0.0..=1.0).contains(&alpha) {
            return Err(ConfigError::Invalid(format!(
                "dimmed_alpha must be within 0..1, got {alpha}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        let config = ZoomViewConfig::from_json(b"{}").unwrap_or_else(|_| ZoomViewConfig {
            options: RendererOptions {
                draw_border: false,
                ..RendererOptions::default()
            },
            ..ZoomViewConfig::default()
        });
        assert_eq!(config, ZoomViewConfig::default());
    }

    #[test]
    fn partial_override() {
        let json = br#"{
            "theme": { "sizes": { "bar_height": 16 } },
            "options": { "color_coding": "ByLibrary", "highlight_recursion": true }
        }"#;
        let config = ZoomViewConfig::from_json(json);
        assert!(config.is_ok());
        let config = config.unwrap_or_default();
        assert!((config.theme.sizes.bar_height - 16.0).abs() < f64::EPSILON);
        assert!((config.theme.sizes.bar_font_size - 11.0).abs() < f64::EPSILON);
        assert_eq!(config.options.color_coding, ColorCoding::ByLibrary);
        assert!(config.options.highlight_recursion);
        assert!(config.options.draw_border);
    }

    #[test]
    fn rejects_zero_bar_height() {
        let json = br#"{ "theme": { "sizes": { "bar_height": 0 } } }"#;
        assert!(matches!(
            ZoomViewConfig::from_json(json),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            ZoomViewConfig::load("/nonexistent/flame-canvas.json"),
            Err(ConfigError::Io { .. })
        ));
    }
}
