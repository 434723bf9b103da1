use egui::{Align2, CornerRadius, FontId, Pos2, Rect, Stroke, StrokeKind};
use flame_canvas_core::TextMetrics;
use flame_canvas_protocol::{RenderCommand, TextAlign};

use crate::theme::{self, ThemeMode};

/// Maps canvas pixels (physical) onto egui points inside the panel.
#[derive(Debug, Clone, Copy)]
struct Transform {
    origin: Pos2,
    pixels_per_point: f32,
}

impl Transform {
    fn pos(&self, x: f64, y: f64) -> Pos2 {
        Pos2::new(
            self.origin.x + x as f32 / self.pixels_per_point,
            self.origin.y + y as f32 / self.pixels_per_point,
        )
    }

    fn rect(&self, rect: &flame_canvas_protocol::Rect) -> Rect {
        Rect::from_min_max(
            self.pos(rect.left(), rect.top()),
            self.pos(rect.right(), rect.bottom()),
        )
    }

    fn len(&self, v: f64) -> f32 {
        v as f32 / self.pixels_per_point
    }
}

/// Replay one canvas into an egui `Painter`.
///
/// `origin` is the panel's top-left in points; canvas coordinates are
/// physical pixels, so everything is divided by `pixels_per_point`.
pub fn paint_commands(
    painter: &mut egui::Painter,
    commands: &[RenderCommand],
    origin: Pos2,
    pixels_per_point: f32,
    mode: ThemeMode,
) {
    let tf = Transform {
        origin,
        pixels_per_point: pixels_per_point.max(f32::EPSILON),
    };
    let base_clip = painter.clip_rect();
    let mut clip_stack: Vec<Rect> = Vec::new();

    for cmd in commands {
        match cmd {
            // The primary canvas starts every frame with a clear.
            RenderCommand::Clear => {
                painter.rect_filled(
                    base_clip,
                    CornerRadius::ZERO,
                    theme::resolve(flame_canvas_protocol::ThemeToken::Background, mode),
                );
            }

            RenderCommand::DrawRect { rect, fill, .. } => {
                let egui_rect = tf.rect(rect);
                if !painter.clip_rect().intersects(egui_rect) {
                    continue;
                }
                painter.rect_filled(egui_rect, CornerRadius::ZERO, theme::fill(*fill, mode));
            }

            RenderCommand::StrokeRect { rect, color, width } => {
                painter.rect_stroke(
                    tf.rect(rect),
                    CornerRadius::ZERO,
                    Stroke::new(tf.len(*width), theme::resolve(*color, mode)),
                    StrokeKind::Inside,
                );
            }

            RenderCommand::DrawText {
                position,
                text,
                color,
                font_size,
                align,
            } => {
                let size = tf.len(*font_size);
                if size < 1.0 {
                    continue;
                }
                let anchor = match align {
                    TextAlign::Left => Align2::LEFT_CENTER,
                    TextAlign::Center => Align2::CENTER_CENTER,
                    TextAlign::Right => Align2::RIGHT_CENTER,
                };
                painter.text(
                    tf.pos(position.x, position.y),
                    anchor,
                    text.as_str(),
                    FontId::monospace(size),
                    theme::resolve(*color, mode),
                );
            }

            RenderCommand::DrawLine {
                from,
                to,
                color,
                width,
            } => {
                painter.line_segment(
                    [tf.pos(from.x, from.y), tf.pos(to.x, to.y)],
                    Stroke::new(tf.len(*width), theme::resolve(*color, mode)),
                );
            }

            RenderCommand::SetClip { rect } => {
                clip_stack.push(painter.clip_rect());
                let intersected = painter.clip_rect().intersect(tf.rect(rect));
                painter.set_clip_rect(intersected);
            }

            RenderCommand::ClearClip => {
                if let Some(prev) = clip_stack.pop() {
                    painter.set_clip_rect(prev);
                }
            }

            RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {
                // Groups are semantic only.
            }
        }
    }

    painter.set_clip_rect(base_clip);
}

/// Measures label widths with egui's own font system so the engine trims
/// text to what will actually be painted.
pub struct GalleyMetrics {
    ctx: egui::Context,
}

impl GalleyMetrics {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl TextMetrics for GalleyMetrics {
    /// `font_size` and the result are in physical pixels.
    fn measure(&self, text: &str, font_size: f64) -> f64 {
        let ppp = f64::from(self.ctx.pixels_per_point());
        let font = FontId::monospace((font_size / ppp) as f32);
        let painter = self.ctx.layer_painter(egui::LayerId::background());
        let galley = painter.layout_no_wrap(text.to_owned(), font, egui::Color32::WHITE);
        f64::from(galley.size().x) * ppp
    }
}
