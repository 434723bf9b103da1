use std::sync::Arc;

use flame_canvas_protocol::{Mat3, Point, Rect};

use crate::canvas::Canvas;
use crate::color::{ColorCoding, ColorMap, recursive_frames};
use crate::config::RendererOptions;
use crate::model::{Flamegraph, FlamegraphFrame};
use crate::search::SearchResults;
use crate::theme::FlamegraphTheme;
use crate::view::FlamegraphView;

/// Frames narrower than this (device px) are culled.
const MIN_FRAME_WIDTH: f64 = 0.5;

/// Draws frames onto the primary canvas and answers hit tests.
///
/// Owns the panel's [`FlamegraphView`]; the text, grid and selection
/// renderers read the transform through [`FlamegraphRenderer::view`] and
/// never get a mutable handle to it.
#[derive(Debug)]
pub struct FlamegraphRenderer {
    canvas: Canvas,
    flamegraph: Arc<Flamegraph>,
    theme: FlamegraphTheme,
    options: RendererOptions,
    view: FlamegraphView,
    colors: ColorMap,
    recursive: Vec<bool>,
}

impl FlamegraphRenderer {
    /// `None` when there is no canvas yet. A zero-size canvas is accepted
    /// and produces empty frames until a real size is observed.
    pub fn try_new(
        canvas: Option<Canvas>,
        flamegraph: Arc<Flamegraph>,
        theme: FlamegraphTheme,
        options: RendererOptions,
    ) -> Option<Self> {
        let canvas = canvas?;
        let inverted = options.inverted.unwrap_or(flamegraph.inverted());
        let view = FlamegraphView::new(
            flamegraph.config_space(),
            flamegraph.min_frame_duration(),
            inverted,
            theme.sizes.bar_height,
            theme.sizes.timeline_height,
        );
        let colors = ColorMap::build(options.color_coding, &flamegraph, &theme);
        let recursive = if options.highlight_recursion {
            recursive_frames(&flamegraph)
        } else {
            Vec::new()
        };
        let mut renderer = Self {
            canvas,
            flamegraph,
            theme,
            options,
            view,
            colors,
            recursive,
        };
        renderer.on_resize_update_space();
        log::debug!(
            "flamegraph renderer ready: {} frames, {} rows",
            renderer.flamegraph.frames().len(),
            renderer.flamegraph.depth()
        );
        Some(renderer)
    }

    pub fn flamegraph(&self) -> &Arc<Flamegraph> {
        &self.flamegraph
    }

    pub fn theme(&self) -> &FlamegraphTheme {
        &self.theme
    }

    pub fn options(&self) -> &RendererOptions {
        &self.options
    }

    pub fn view(&self) -> &FlamegraphView {
        &self.view
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Mutable access for the host side of the canvas (size, dpr,
    /// draining commands). Call [`Self::on_resize_update_space`] after
    /// changing the size.
    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }

    /// Does not draw; the caller schedules the frame.
    pub fn set_config_view(&mut self, rect: Rect) -> bool {
        self.view.set_config_view(rect)
    }

    pub fn transform_config_view(&mut self, m: &Mat3) -> bool {
        self.view.transform_config_view(m)
    }

    pub fn reset_zoom(&mut self) -> bool {
        self.view.reset_zoom()
    }

    pub fn zoom_into_frame(&mut self, frame: &FlamegraphFrame) -> bool {
        self.view.zoom_into_frame(frame)
    }

    /// Re-read the canvas size and rebuild the transform.
    pub fn on_resize_update_space(&mut self) -> bool {
        let physical = self.canvas.physical_space();
        let dpr = self.canvas.device_pixel_ratio();
        self.view.resize(physical, dpr)
    }

    pub fn set_color_coding(&mut self, coding: ColorCoding) {
        if self.colors.coding() == coding {
            return;
        }
        self.options.color_coding = coding;
        self.colors = ColorMap::build(coding, &self.flamegraph, &self.theme);
    }

    pub fn set_highlight_recursion(&mut self, enabled: bool) {
        self.options.highlight_recursion = enabled;
        self.recursive = if enabled {
            recursive_frames(&self.flamegraph)
        } else {
            Vec::new()
        };
    }

    /// Physical point → config space. `None` until the view is sized.
    pub fn get_config_space_cursor(&self, physical: Point) -> Option<Point> {
        if !self.view.is_ready() || !physical.is_finite() {
            return None;
        }
        let p = self.view.physical_to_config(physical);
        p.is_finite().then_some(p)
    }

    /// The node under a config-space point: `floor(y)` picks the row,
    /// the x range is inclusive at both ends.
    pub fn get_hovered_node(&self, config: Point) -> Option<&FlamegraphFrame> {
        if !config.is_finite() || config.y < 0.0 {
            return None;
        }
        let depth = config.y.floor() as usize;
        self.flamegraph.frame_at(depth, config.x)
    }

    /// Physical rect for `frame` under the current transform.
    pub fn frame_rect(&self, frame: &FlamegraphFrame) -> Option<Rect> {
        self.scene().frame_rect(frame)
    }

    /// Frames intersecting the view with their physical rects, row by row.
    pub fn visible_frames(&self) -> impl Iterator<Item = (&FlamegraphFrame, Rect)> + '_ {
        self.scene().visible_frames()
    }

    /// Clear the canvas and draw every visible frame. Frames outside
    /// `search` are dimmed, not hidden.
    pub fn draw(&mut self, search: Option<&SearchResults>) {
        let scene = Scene {
            flamegraph: &self.flamegraph,
            theme: &self.theme,
            draw_border: self.options.draw_border,
            view: &self.view,
            colors: &self.colors,
            recursive: &self.recursive,
        };
        scene.draw(&mut self.canvas, search);
    }

    fn scene(&self) -> Scene<'_> {
        Scene {
            flamegraph: &self.flamegraph,
            theme: &self.theme,
            draw_border: self.options.draw_border,
            view: &self.view,
            colors: &self.colors,
            recursive: &self.recursive,
        }
    }
}

/// Everything a frame pass reads, borrowed apart from the canvas it
/// writes to.
#[derive(Clone, Copy)]
struct Scene<'a> {
    flamegraph: &'a Flamegraph,
    theme: &'a FlamegraphTheme,
    draw_border: bool,
    view: &'a FlamegraphView,
    colors: &'a ColorMap,
    recursive: &'a [bool],
}

impl<'a> Scene<'a> {
    fn frame_rect(self, frame: &FlamegraphFrame) -> Option<Rect> {
        if !self.view.is_ready() {
            return None;
        }
        let rect = self.view.config_rect_to_physical(&frame.config_rect());
        rect.is_finite().then_some(rect)
    }

    fn visible_frames(self) -> impl Iterator<Item = (&'a FlamegraphFrame, Rect)> + 'a {
        let flamegraph = self.flamegraph;
        let view = self.view.config_view();
        let content = self.view.content_space();
        let rows = if self.view.is_ready() {
            self.view.visible_rows(flamegraph.depth())
        } else {
            0..0
        };
        rows.flat_map(move |depth| {
            flamegraph
                .frames_in_range(depth, view.left(), view.right())
                .iter()
                .filter_map(move |id| flamegraph.frame(*id))
        })
        .filter_map(move |node| match self.frame_rect(node) {
            Some(rect) if rect.right() > content.left() && rect.left() < content.right() => {
                Some((node, rect))
            }
            Some(_) => None,
            None => {
                log::warn!("skipping frame {:?} with degenerate geometry", node.id);
                None
            }
        })
    }

    fn draw(self, canvas: &mut Canvas, search: Option<&SearchResults>) {
        canvas.clear();
        if !self.view.is_ready() {
            return;
        }
        let border = if self.draw_border {
            self.theme.sizes.frame_border_width * self.view.device_pixel_ratio()
        } else {
            0.0
        };
        let dimmed_alpha = self.theme.colors.dimmed_alpha;

        canvas.set_clip(self.view.content_space());
        canvas.begin_group("flamegraph");
        let mut drawn = 0usize;
        for (node, rect) in self.visible_frames() {
            if rect.w < MIN_FRAME_WIDTH {
                continue;
            }
            let rect = if rect.w > border * 2.0 && rect.h > border {
                Rect::new(rect.x, rect.y, rect.w - border, rect.h - border)
            } else {
                rect
            };
            let mut color = if self.recursive.get(node.id.index()).copied().unwrap_or(false) {
                self.theme.colors.recursion
            } else {
                self.colors.color_for(&node.frame)
            };
            if search.is_some_and(|s| !s.contains(node.id)) {
                color = color.with_alpha(dimmed_alpha);
            }
            canvas.fill_rect(rect, color, Some(node.id));
            drawn += 1;
        }
        canvas.end_group();
        canvas.clear_clip();
        log::trace!("drew {drawn} frames in {:?}", self.view.config_view());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlamegraphData, Frame, FrameId, FrameKey, NodeData};
    use flame_canvas_protocol::{Fill, RenderCommand};

    fn siblings() -> Arc<Flamegraph> {
        let data = FlamegraphData {
            frames: vec![Frame::new(1, "root"), Frame::new(2, "a"), Frame::new(3, "b")],
            nodes: vec![
                NodeData { frame: FrameKey(1), start: 0.0, end: 20.0, parent: None },
                NodeData { frame: FrameKey(2), start: 0.0, end: 10.0, parent: Some(0) },
                NodeData { frame: FrameKey(3), start: 10.0, end: 20.0, parent: Some(0) },
            ],
            ..FlamegraphData::default()
        };
        Arc::new(Flamegraph::from_data(data).unwrap_or_else(|_| Flamegraph::empty(Default::default())))
    }

    fn renderer(width: f64, height: f64) -> Option<FlamegraphRenderer> {
        FlamegraphRenderer::try_new(
            Some(Canvas::new(width, height, 1.0)),
            siblings(),
            FlamegraphTheme::dark(),
            RendererOptions::default(),
        )
    }

    fn rects(canvas: &Canvas) -> Vec<(Rect, Fill, Option<u32>)> {
        canvas
            .commands()
            .iter()
            .filter_map(|c| match c {
                RenderCommand::DrawRect { rect, fill, frame_id } => Some((*rect, *fill, *frame_id)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn missing_canvas_yields_no_renderer() {
        let r = FlamegraphRenderer::try_new(
            None,
            siblings(),
            FlamegraphTheme::dark(),
            RendererOptions::default(),
        );
        assert!(r.is_none());
    }

    #[test]
    fn hover_hit_test_between_siblings() {
        let Some(r) = renderer(200.0, 100.0) else {
            panic!("renderer should exist");
        };
        let name = |p: Point| r.get_hovered_node(p).map(|f| f.name().to_string());
        assert_eq!(name(Point::new(5.0, 1.0)).as_deref(), Some("a"));
        assert_eq!(name(Point::new(15.0, 1.0)).as_deref(), Some("b"));
        assert_eq!(name(Point::new(25.0, 1.0)), None);
        assert_eq!(name(Point::new(5.0, -0.5)), None);
        // Inclusive at the outer edges.
        assert_eq!(name(Point::new(20.0, 1.5)).as_deref(), Some("b"));
    }

    #[test]
    fn zero_size_canvas_draws_nothing_until_resized() {
        let Some(mut r) = renderer(0.0, 0.0) else {
            panic!("zero-size canvas is accepted");
        };
        r.draw(None);
        assert_eq!(r.canvas().commands(), &[RenderCommand::Clear]);
        assert!(r.get_config_space_cursor(Point::new(1.0, 1.0)).is_none());

        r.canvas_mut()
            .set_logical_size(crate::canvas::LogicalSize::new(200.0, 100.0));
        assert!(r.on_resize_update_space());
        r.draw(None);
        assert_eq!(rects(r.canvas()).len(), 3);
    }

    #[test]
    fn draws_only_visible_frames() {
        let Some(mut r) = renderer(200.0, 100.0) else {
            panic!("renderer should exist");
        };
        // Zoomed onto the right half: `a` only touches the left edge.
        r.set_config_view(Rect::new(10.0, 0.0, 10.0, 0.0));
        r.draw(None);
        let ids: Vec<_> = rects(r.canvas()).iter().filter_map(|(_, _, id)| *id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[test]
    fn search_dims_non_matching_frames() {
        let Some(mut r) = renderer(200.0, 100.0) else {
            panic!("renderer should exist");
        };
        let alpha = r.theme().colors.dimmed_alpha;
        r.draw(Some(&SearchResults::from_ids([FrameId(1)])));
        for (_, fill, id) in rects(r.canvas()) {
            let Fill::Color(color) = fill else {
                panic!("frames use concrete colors");
            };
            if id == Some(1) {
                assert!((color.a - 1.0).abs() < f32::EPSILON);
            } else {
                assert!((color.a - alpha).abs() < f32::EPSILON);
            }
        }
    }

    #[test]
    fn border_leaves_a_gap() {
        let Some(mut r) = renderer(200.0, 100.0) else {
            panic!("renderer should exist");
        };
        r.draw(None);
        let drawn = rects(r.canvas());
        let Some(root) = r.flamegraph().frame(FrameId(0)) else {
            panic!("root exists");
        };
        let full = r.frame_rect(root).unwrap_or(Rect::EMPTY);
        assert!((drawn[0].0.w - (full.w - 1.0)).abs() < 1e-9);
        assert!((drawn[0].0.h - (full.h - 1.0)).abs() < 1e-9);
    }

    #[test]
    fn drawing_keeps_the_mounted_canvas() {
        let Some(mut r) = renderer(200.0, 100.0) else {
            panic!("renderer should exist");
        };
        let before = (r.canvas().physical_space(), r.canvas().device_pixel_ratio());
        r.draw(None);
        r.draw(None);
        assert_eq!(
            (r.canvas().physical_space(), r.canvas().device_pixel_ratio()),
            before
        );
        assert_eq!(r.canvas().commands().first(), Some(&RenderCommand::Clear));
        assert_eq!(rects(r.canvas()).len(), 3);
    }

    #[test]
    fn cursor_maps_into_config_space() {
        let Some(r) = renderer(200.0, 100.0) else {
            panic!("renderer should exist");
        };
        // 200px wide for 20 units; the content starts below the 20px timeline.
        let Some(cursor) = r.get_config_space_cursor(Point::new(50.0, 30.0)) else {
            panic!("view is ready");
        };
        assert!((cursor.x - 5.0).abs() < 1e-9);
        assert!((cursor.y - 0.5).abs() < 1e-9);
    }
}
