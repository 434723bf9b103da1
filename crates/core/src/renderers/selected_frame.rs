use flame_canvas_protocol::{Rect, ThemeToken};

use crate::canvas::Canvas;
use crate::model::FlamegraphFrame;
use crate::renderers::FlamegraphRenderer;

/// Borders around the selected and hovered frames.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectedFrameRenderer;

impl SelectedFrameRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Strokes the selected frame, then the hovered one when it is a
    /// different node, so hover ends up on top. Returns the number of
    /// borders drawn.
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        renderer: &FlamegraphRenderer,
        selected: Option<&FlamegraphFrame>,
        hovered: Option<&FlamegraphFrame>,
    ) -> usize {
        let sizes = &renderer.theme().sizes;
        let dpr = renderer.view().device_pixel_ratio();
        let hovered = hovered.filter(|h| !selected.is_some_and(|s| s.is_same_node(h)));

        let borders = [
            (selected, ThemeToken::SelectedFrameBorder, sizes.selected_border_width),
            (hovered, ThemeToken::HoveredFrameBorder, sizes.hovered_border_width),
        ];
        let mut drawn = 0;
        canvas.set_clip(renderer.view().content_space());
        for (frame, token, width) in borders {
            let Some(frame) = frame else { continue };
            let Some(rect) = renderer.frame_rect(frame) else { continue };
            let width = width * dpr;
            if width <= 0.0 {
                continue;
            }
            // Keep the stroke inside the frame so neighbours stay visible.
            let half = width / 2.0;
            let rect = Rect::new(rect.x + half, rect.y + half, (rect.w - width).max(0.0), (rect.h - width).max(0.0));
            canvas.stroke_rect(rect, token, width);
            drawn += 1;
        }
        canvas.clear_clip();
        drawn
    }
}
