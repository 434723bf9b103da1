use std::sync::Arc;

use flame_canvas_protocol::{Mat3, Point, Rect};

use crate::canvas::{Canvas, CanvasLayers, LogicalSize, TextMetrics};
use crate::color::ColorCoding;
use crate::config::ZoomViewConfig;
use crate::model::{Flamegraph, FlamegraphFrame, FrameKey};
use crate::renderers::{
    FlamegraphRenderer, GridRenderer, SelectedFrameRenderer, SelectionRenderer, TextRenderer,
};
use crate::scheduler::FlamegraphEvent;
use crate::search::{SearchResults, search};
use crate::zoom_view::interaction::InteractionState;

/// Zoom factor per logical pixel of wheel delta.
const WHEEL_ZOOM_SPEED: f64 = 0.005;
/// Pointer travel (logical px) below which a press/release is a click.
pub(crate) const CLICK_SLOP: f64 = 1.0;

#[derive(Debug, Clone, Copy)]
pub(crate) struct Drag {
    pub origin: Point,
    pub last: Point,
    pub moved: bool,
}

/// Everything one panel mutates. Lives behind `Rc<RefCell<_>>` so frame
/// callbacks and event handlers can reach it; never borrowed across a
/// call into the scheduler.
#[derive(Debug)]
pub(crate) struct ZoomViewState {
    pub config: ZoomViewConfig,
    pub flamegraph: Option<Arc<Flamegraph>>,
    pub renderer: Option<FlamegraphRenderer>,
    /// Primary canvas while no renderer owns it.
    pub primary: Option<Canvas>,
    pub overlay: Option<Canvas>,
    pub text: TextRenderer,
    pub grid: GridRenderer,
    pub selected_frame: SelectedFrameRenderer,
    pub selection_range: SelectionRenderer,

    pub query: String,
    pub search: Option<SearchResults>,
    pub highlight: Option<SearchResults>,
    pub selected: Option<FlamegraphFrame>,
    pub hovered: Option<FlamegraphFrame>,
    pub cursor: Option<Point>,
    pub interaction: InteractionState,
    pub drag: Option<Drag>,
    /// Config-space x range of a meta-drag in progress.
    pub selection: Option<(f64, f64)>,
}

impl ZoomViewState {
    pub fn new(config: ZoomViewConfig) -> Self {
        Self {
            config,
            flamegraph: None,
            renderer: None,
            primary: None,
            overlay: None,
            text: TextRenderer::default(),
            grid: GridRenderer::new(),
            selected_frame: SelectedFrameRenderer::new(),
            selection_range: SelectionRenderer::new(),
            query: String::new(),
            search: None,
            highlight: None,
            selected: None,
            hovered: None,
            cursor: None,
            interaction: InteractionState::Idle,
            drag: None,
            selection: None,
        }
    }

    pub fn primary_canvas(&self) -> Option<&Canvas> {
        match &self.renderer {
            Some(renderer) => Some(renderer.canvas()),
            None => self.primary.as_ref(),
        }
    }

    pub fn set_text_metrics(&mut self, metrics: Box<dyn TextMetrics>) {
        self.text.set_metrics(metrics);
    }

    pub fn set_flamegraph(&mut self, flamegraph: Arc<Flamegraph>) {
        self.search = search(&flamegraph, &self.query);
        self.flamegraph = Some(flamegraph);
        self.rebuild_renderer();
    }

    pub fn mount(&mut self, layers: CanvasLayers) {
        let CanvasLayers { primary, overlay } = layers;
        self.renderer = None;
        self.primary = Some(primary);
        self.overlay = Some(overlay);
        self.rebuild_renderer();
    }

    pub fn unmount(&mut self) -> Option<CanvasLayers> {
        let primary = match self.renderer.take() {
            Some(renderer) => Some(renderer.into_canvas()),
            None => self.primary.take(),
        };
        self.reset_pointer_state();
        Some(CanvasLayers {
            primary: primary?,
            overlay: self.overlay.take()?,
        })
    }

    /// A renderer exists only once both the model and a canvas exist.
    fn rebuild_renderer(&mut self) {
        let canvas = match self.renderer.take() {
            Some(renderer) => Some(renderer.into_canvas()),
            None => self.primary.take(),
        };
        self.reset_pointer_state();
        self.highlight = None;
        match &self.flamegraph {
            Some(flamegraph) => {
                self.renderer = FlamegraphRenderer::try_new(
                    canvas,
                    Arc::clone(flamegraph),
                    self.config.theme.clone(),
                    self.config.options.clone(),
                );
            }
            None => self.primary = canvas,
        }
    }

    fn reset_pointer_state(&mut self) {
        self.selected = None;
        self.hovered = None;
        self.cursor = None;
        self.drag = None;
        self.selection = None;
        self.interaction = InteractionState::Idle;
    }

    pub fn resize(&mut self, size: LogicalSize) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.canvas_mut().set_logical_size(size);
            renderer.on_resize_update_space();
        }
        if let Some(primary) = self.primary.as_mut() {
            primary.set_logical_size(size);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_logical_size(size);
        }
    }

    pub fn set_device_pixel_ratio(&mut self, dpr: f64) {
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.canvas_mut().set_device_pixel_ratio(dpr);
            renderer.on_resize_update_space();
        }
        if let Some(primary) = self.primary.as_mut() {
            primary.set_device_pixel_ratio(dpr);
        }
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_device_pixel_ratio(dpr);
        }
    }

    pub fn set_search(&mut self, query: &str) {
        self.query = query.to_string();
        self.search = self
            .flamegraph
            .as_ref()
            .and_then(|flamegraph| search(flamegraph, query));
    }

    pub fn set_color_coding(&mut self, coding: ColorCoding) {
        self.config.options.color_coding = coding;
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.set_color_coding(coding);
        }
    }

    fn dpr(&self) -> f64 {
        self.renderer
            .as_ref()
            .map_or(1.0, |r| r.canvas().device_pixel_ratio())
    }

    /// Logical pointer position → config space, refreshing the hovered node.
    pub fn update_cursor(&mut self, point: Point) {
        let dpr = self.dpr();
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let physical = Point::new(point.x * dpr, point.y * dpr);
        self.cursor = renderer.get_config_space_cursor(physical);
        self.hovered = self
            .cursor
            .and_then(|cursor| renderer.get_hovered_node(cursor))
            .cloned();
    }

    pub fn clear_pointer(&mut self) {
        self.cursor = None;
        self.hovered = None;
        self.drag = None;
        self.selection = None;
        self.interaction = InteractionState::Idle;
    }

    /// Config units per physical pixel along each axis, signed so that a
    /// positive pixel delta moves the view the same way on screen.
    fn config_per_physical(&self) -> Option<(f64, f64)> {
        let view = self.renderer.as_ref()?.view();
        if !view.is_ready() {
            return None;
        }
        let content = view.content_space();
        let config_view = view.config_view();
        let sy = config_view.h / content.h;
        Some((
            config_view.w / content.w,
            if view.inverted() { -sy } else { sy },
        ))
    }

    /// Translation that drags the content along with a pointer moving by
    /// `delta` logical pixels.
    pub fn pan_for_drag(&self, delta: Point) -> Option<Mat3> {
        let (kx, ky) = self.config_per_physical()?;
        let dpr = self.dpr();
        Some(Mat3::from_translation(
            -delta.x * dpr * kx,
            -delta.y * dpr * ky,
        ))
    }

    /// Translation for a plain wheel scroll.
    pub fn pan_for_wheel(&self, delta_x: f64, delta_y: f64) -> Option<Mat3> {
        let (kx, ky) = self.config_per_physical()?;
        let dpr = self.dpr();
        Some(Mat3::from_translation(delta_x * dpr * kx, delta_y * dpr * ky))
    }

    /// Horizontal zoom anchored at the cursor. The scale is exponential in
    /// the delta, so it stays positive and equal and opposite deltas cancel.
    pub fn zoom_for_wheel(&self, delta_y: f64) -> Option<Mat3> {
        let anchor = self.cursor?.x;
        let scale = (delta_y * WHEEL_ZOOM_SPEED).exp();
        if !(scale.is_finite() && scale > 0.0) {
            return None;
        }
        Some(
            Mat3::from_translation(anchor, 0.0)
                * Mat3::from_scaling(scale, 1.0)
                * Mat3::from_translation(-anchor, 0.0),
        )
    }

    pub fn begin_drag(&mut self, point: Point, select: bool) {
        self.update_cursor(point);
        self.drag = Some(Drag {
            origin: point,
            last: point,
            moved: false,
        });
        match (select, self.cursor) {
            (true, Some(cursor)) => {
                self.selection = Some((cursor.x, cursor.x));
                self.interaction = InteractionState::DraggingSelect;
            }
            (true, None) => {
                self.drag = None;
            }
            (false, _) => self.interaction = InteractionState::DraggingPan,
        }
    }

    /// Advance the drag; returns the pointer delta since the last move.
    pub fn advance_drag(&mut self, point: Point) -> Option<Point> {
        let drag = self.drag.as_mut()?;
        let delta = Point::new(point.x - drag.last.x, point.y - drag.last.y);
        drag.last = point;
        if point.distance(drag.origin) > CLICK_SLOP {
            drag.moved = true;
        }
        Some(delta)
    }

    /// Extend the meta-drag selection to the pointer.
    pub fn extend_selection(&mut self, point: Point) {
        let dpr = self.dpr();
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };
        let physical = Point::new(point.x * dpr, point.y * dpr);
        if let (Some((start, _)), Some(cursor)) =
            (self.selection, renderer.get_config_space_cursor(physical))
        {
            self.selection = Some((start, cursor.x));
            self.cursor = Some(cursor);
        }
    }

    /// The config view a finished selection drag zooms to, if it spans
    /// more than one device pixel.
    pub fn selection_target(&self) -> Option<Rect> {
        let (a, b) = self.selection?;
        let view = self.renderer.as_ref()?.view();
        let (kx, _) = self.config_per_physical()?;
        let width = (b - a).abs();
        if width / kx <= 1.0 {
            return None;
        }
        let config_view = view.config_view();
        Some(Rect::new(a.min(b), config_view.y, width, config_view.h))
    }

    /// Click semantics: clicking the selected node again zooms into it,
    /// anything else just moves the selection.
    pub fn click(&mut self, point: Point) -> Option<FlamegraphEvent> {
        self.update_cursor(point);
        let hovered = self.hovered.clone();
        match (&hovered, &self.selected) {
            (Some(h), Some(s)) if h.id == s.id => Some(FlamegraphEvent::ZoomIntoFrame(h.clone())),
            _ => {
                self.selected = hovered;
                None
            }
        }
    }

    /// Apply a bus event to this panel. Returns whether anything changed.
    pub fn handle(&mut self, event: &FlamegraphEvent) -> bool {
        match event {
            FlamegraphEvent::SetConfigView(rect) => self
                .renderer
                .as_mut()
                .is_some_and(|r| r.set_config_view(*rect)),
            FlamegraphEvent::TransformConfigView(m) => self
                .renderer
                .as_mut()
                .is_some_and(|r| r.transform_config_view(m)),
            FlamegraphEvent::ResetZoom => self.renderer.as_mut().is_some_and(|r| r.reset_zoom()),
            FlamegraphEvent::ZoomIntoFrame(frame) => {
                let Some(renderer) = self.renderer.as_mut() else {
                    return false;
                };
                renderer.zoom_into_frame(frame);
                // Linked panels carry their own model; only adopt the frame
                // as the selection when it is the same node here.
                self.selected = renderer
                    .flamegraph()
                    .frame(frame.id)
                    .filter(|own| own.key() == frame.key())
                    .cloned();
                true
            }
            FlamegraphEvent::HighlightFrame(key) => {
                self.highlight = self.highlight_for(*key);
                true
            }
        }
    }

    fn highlight_for(&self, key: Option<FrameKey>) -> Option<SearchResults> {
        let key = key?;
        let flamegraph = self.flamegraph.as_ref()?;
        Some(SearchResults::from_ids(
            flamegraph.frames_by_key(key).map(|f| f.id),
        ))
    }

    pub fn clear_overlay(&mut self) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.clear();
        }
    }

    /// An active highlight takes precedence over the search.
    pub fn draw_frames(&mut self) {
        let search = self.highlight.as_ref().or(self.search.as_ref());
        if let Some(renderer) = self.renderer.as_mut() {
            renderer.draw(search);
        } else if let Some(primary) = self.primary.as_mut() {
            primary.clear();
        }
    }

    pub fn draw_grid(&mut self) {
        if let (Some(renderer), Some(overlay)) = (self.renderer.as_ref(), self.overlay.as_mut()) {
            self.grid.draw(overlay, renderer);
        }
    }

    pub fn draw_text(&mut self) {
        let search = self.highlight.as_ref().or(self.search.as_ref());
        if let (Some(renderer), Some(overlay)) = (self.renderer.as_ref(), self.overlay.as_mut()) {
            self.text.draw(overlay, renderer, search);
        }
    }

    pub fn draw_selected_frame(&mut self) {
        if let (Some(renderer), Some(overlay)) = (self.renderer.as_ref(), self.overlay.as_mut()) {
            self.selected_frame.draw(
                overlay,
                renderer,
                self.selected.as_ref(),
                self.hovered.as_ref(),
            );
        }
    }

    pub fn draw_selection(&mut self) {
        if let (Some(renderer), Some(overlay)) = (self.renderer.as_ref(), self.overlay.as_mut()) {
            self.selection_range.draw(overlay, renderer, self.selection);
        }
    }
}
