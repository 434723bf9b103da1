use flame_canvas_protocol::{Point, Rect, ThemeToken};

use crate::canvas::Canvas;
use crate::renderers::FlamegraphRenderer;

/// Translucent band for an in-progress range selection (meta-drag).
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectionRenderer;

impl SelectionRenderer {
    pub fn new() -> Self {
        Self
    }

    /// `range` is a pair of config-space x values in either order.
    pub fn draw(&self, canvas: &mut Canvas, renderer: &FlamegraphRenderer, range: Option<(f64, f64)>) {
        let Some((a, b)) = range else { return };
        let view = renderer.view();
        if !view.is_ready() {
            return;
        }
        let content = view.content_space();
        let y = view.config_view().y;
        let xa = view.config_to_physical(Point::new(a, y)).x;
        let xb = view.config_to_physical(Point::new(b, y)).x;
        let left = xa.min(xb).max(content.left());
        let right = xa.max(xb).min(content.right());
        let band = Rect::new(left, content.y, right - left, content.h);
        if band.is_empty() {
            return;
        }
        canvas.fill_rect(band, ThemeToken::SelectionRangeFill, None);
        canvas.stroke_rect(band, ThemeToken::SelectionRangeBorder, view.device_pixel_ratio());
    }
}
