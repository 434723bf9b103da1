use flame_canvas_protocol::{Fill, Point, Rect, RenderCommand, SharedStr, TextAlign, ThemeToken};
use serde::{Deserialize, Serialize};

use crate::model::FrameId;

/// CSS (logical) pixel size of a canvas element.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LogicalSize {
    pub width: f64,
    pub height: f64,
}

impl LogicalSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Finite and strictly positive in both dimensions.
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// One drawing surface.
///
/// Stands in for a browser canvas element: it knows its CSS size and the
/// device pixel ratio, and records the commands issued against it during
/// the current frame. Recorded coordinates are physical pixels.
#[derive(Debug, Clone)]
pub struct Canvas {
    logical: LogicalSize,
    dpr: f64,
    commands: Vec<RenderCommand>,
}

impl Canvas {
    pub fn new(width: f64, height: f64, dpr: f64) -> Self {
        Self {
            logical: LogicalSize::new(width, height),
            dpr: sanitize_dpr(dpr),
            commands: Vec::new(),
        }
    }

    pub fn logical_size(&self) -> LogicalSize {
        self.logical
    }

    pub fn set_logical_size(&mut self, size: LogicalSize) {
        self.logical = size;
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        self.dpr = sanitize_dpr(dpr);
    }

    /// Backing-store rect in device pixels; empty when the logical size
    /// is not drawable.
    pub fn physical_space(&self) -> Rect {
        if !self.logical.is_drawable() {
            return Rect::EMPTY;
        }
        Rect::new(
            0.0,
            0.0,
            (self.logical.width * self.dpr).floor(),
            (self.logical.height * self.dpr).floor(),
        )
    }

    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<RenderCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Drop whatever was recorded and start the frame with a `Clear`.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.commands.push(RenderCommand::Clear);
    }

    pub fn fill_rect(&mut self, rect: Rect, fill: impl Into<Fill>, frame_id: Option<FrameId>) {
        self.commands.push(RenderCommand::DrawRect {
            rect,
            fill: fill.into(),
            frame_id: frame_id.map(|id| id.0),
        });
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: ThemeToken, width: f64) {
        self.commands
            .push(RenderCommand::StrokeRect { rect, color, width });
    }

    pub fn fill_text(
        &mut self,
        position: Point,
        text: SharedStr,
        color: ThemeToken,
        font_size: f64,
        align: TextAlign,
    ) {
        self.commands.push(RenderCommand::DrawText {
            position,
            text,
            color,
            font_size,
            align,
        });
    }

    pub fn line(&mut self, from: Point, to: Point, color: ThemeToken, width: f64) {
        self.commands.push(RenderCommand::DrawLine {
            from,
            to,
            color,
            width,
        });
    }

    pub fn set_clip(&mut self, rect: Rect) {
        self.commands.push(RenderCommand::SetClip { rect });
    }

    pub fn clear_clip(&mut self) {
        self.commands.push(RenderCommand::ClearClip);
    }

    pub fn begin_group(&mut self, id: &str) {
        self.commands
            .push(RenderCommand::BeginGroup { id: id.into() });
    }

    pub fn end_group(&mut self) {
        self.commands.push(RenderCommand::EndGroup);
    }
}

fn sanitize_dpr(dpr: f64) -> f64 {
    if dpr.is_finite() && dpr > 0.0 { dpr } else { 1.0 }
}

/// The two stacked canvases of one flamegraph panel: frames go on
/// `primary`, labels, grid and selection borders on `overlay`.
#[derive(Debug, Clone)]
pub struct CanvasLayers {
    pub primary: Canvas,
    pub overlay: Canvas,
}

impl CanvasLayers {
    pub fn new(width: f64, height: f64, dpr: f64) -> Self {
        Self {
            primary: Canvas::new(width, height, dpr),
            overlay: Canvas::new(width, height, dpr),
        }
    }

    pub fn resize(&mut self, size: LogicalSize) {
        self.primary.set_logical_size(size);
        self.overlay.set_logical_size(size);
    }
}

/// Measures rendered text width in physical pixels.
pub trait TextMetrics {
    fn measure(&self, text: &str, font_size: f64) -> f64;
}

/// Fixed advance per character. Adequate for monospace fonts and terminal
/// hosts; GUI hosts should supply a measurer backed by their font system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceMetrics {
    /// Advance width as a fraction of the font size.
    pub advance: f64,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self { advance: 0.6 }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().count() as f64 * font_size * self.advance
    }
}
