//! Interactive flamegraph panel.
//!
//! [`FlamegraphZoomView`] wires one panel together: it owns the renderers
//! (through its state), registers their draw passes with the panel's
//! [`CanvasScheduler`], turns pointer and wheel input into bus events,
//! and applies bus events coming back from itself or from linked panels
//! via the [`CanvasPoolManager`].

mod interaction;
mod state;

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use flame_canvas_protocol::{Point, Rect};

use crate::canvas::{Canvas, CanvasLayers, LogicalSize, TextMetrics};
use crate::color::ColorCoding;
use crate::config::ZoomViewConfig;
use crate::model::{Flamegraph, FlamegraphFrame};
use crate::pool::CanvasPoolManager;
use crate::resize::{ResizeObserver, watch_for_resize};
use crate::scheduler::{CanvasScheduler, EventHandler, EventKind, FlamegraphEvent, FrameCallback};

pub use interaction::{InteractionState, Modifiers, WheelEvent, WheelOutcome};
use state::{CLICK_SLOP, ZoomViewState};

const EVENT_KINDS: [EventKind; 5] = [
    EventKind::SetConfigView,
    EventKind::TransformConfigView,
    EventKind::ResetZoom,
    EventKind::ZoomIntoFrame,
    EventKind::HighlightFrame,
];

pub struct FlamegraphZoomView {
    state: Rc<RefCell<ZoomViewState>>,
    scheduler: Rc<CanvasScheduler>,
    pool: Option<Rc<CanvasPoolManager>>,
    before_frame: Vec<FrameCallback>,
    after_frame: Vec<FrameCallback>,
    handlers: Vec<(EventKind, EventHandler)>,
    resize_observer: RefCell<ResizeObserver>,
    disposed: bool,
}

/// Frame callback running `pass` against the state, if it is still alive.
fn pass(state: &Rc<RefCell<ZoomViewState>>, run: fn(&mut ZoomViewState)) -> FrameCallback {
    let state = Rc::downgrade(state);
    Rc::new(move || {
        if let Some(state) = state.upgrade() {
            run(&mut state.borrow_mut());
        }
    })
}

impl FlamegraphZoomView {
    pub fn new(
        config: ZoomViewConfig,
        scheduler: Rc<CanvasScheduler>,
        pool: Option<Rc<CanvasPoolManager>>,
    ) -> Self {
        let state = Rc::new(RefCell::new(ZoomViewState::new(config)));

        let before_frame = vec![
            pass(&state, ZoomViewState::clear_overlay),
            pass(&state, ZoomViewState::draw_frames),
            pass(&state, ZoomViewState::draw_grid),
        ];
        let after_frame = vec![
            pass(&state, ZoomViewState::draw_text),
            pass(&state, ZoomViewState::draw_selected_frame),
            pass(&state, ZoomViewState::draw_selection),
        ];
        for cb in &before_frame {
            scheduler.register_before_frame_callback(Rc::clone(cb));
        }
        for cb in &after_frame {
            scheduler.register_after_frame_callback(Rc::clone(cb));
        }

        let handler: EventHandler = {
            let state = Rc::downgrade(&state);
            let scheduler = Rc::downgrade(&scheduler);
            Rc::new(move |event: &FlamegraphEvent| on_event(&state, &scheduler, event))
        };
        let handlers: Vec<(EventKind, EventHandler)> = EVENT_KINDS
            .iter()
            .map(|kind| (*kind, Rc::clone(&handler)))
            .collect();
        for (kind, handler) in &handlers {
            scheduler.on(*kind, Rc::clone(handler));
        }

        if let Some(pool) = &pool {
            pool.register_scheduler(&scheduler);
        }

        let resize_observer = watch_for_resize({
            let state = Rc::downgrade(&state);
            let scheduler = Rc::downgrade(&scheduler);
            move |size| {
                let Some(state) = state.upgrade() else {
                    return;
                };
                state.borrow_mut().resize(size);
                // Redraw before the host paints so the stale size never shows.
                if let Some(scheduler) = scheduler.upgrade() {
                    scheduler.draw_sync();
                }
            }
        });

        Self {
            state,
            scheduler,
            pool,
            before_frame,
            after_frame,
            handlers,
            resize_observer: RefCell::new(resize_observer),
            disposed: false,
        }
    }

    pub fn scheduler(&self) -> &Rc<CanvasScheduler> {
        &self.scheduler
    }

    pub fn set_flamegraph(&self, flamegraph: Arc<Flamegraph>) {
        log::debug!(
            "zoom view: new flamegraph {:?} ({} frames)",
            flamegraph.name(),
            flamegraph.frames().len()
        );
        self.state.borrow_mut().set_flamegraph(flamegraph);
        self.scheduler.draw();
    }

    /// Attach the panel's canvases; the primary one is handed to a
    /// renderer as soon as a flamegraph is present.
    pub fn mount(&self, layers: CanvasLayers) {
        let size = layers.primary.logical_size();
        self.state.borrow_mut().mount(layers);
        log::debug!("zoom view mounted at {}x{}", size.width, size.height);
        self.on_resize(size);
        self.scheduler.draw();
    }

    /// Detach and return the canvases.
    pub fn unmount(&self) -> Option<CanvasLayers> {
        let layers = self.state.borrow_mut().unmount();
        log::debug!("zoom view unmounted");
        layers
    }

    pub fn set_text_metrics(&self, metrics: Box<dyn TextMetrics>) {
        self.state.borrow_mut().set_text_metrics(metrics);
        self.scheduler.draw();
    }

    pub fn on_canvas_mouse_down(&self, point: Point, modifiers: Modifiers) {
        self.state
            .borrow_mut()
            .begin_drag(point, modifiers.zoom());
        self.scheduler.draw();
    }

    pub fn on_canvas_mouse_move(&self, point: Point) {
        let event = {
            let mut state = self.state.borrow_mut();
            let interaction = state.interaction;
            match interaction {
                InteractionState::DraggingPan => state
                    .advance_drag(point)
                    .and_then(|delta| state.pan_for_drag(delta))
                    .map(FlamegraphEvent::TransformConfigView),
                InteractionState::DraggingSelect => {
                    state.advance_drag(point);
                    state.extend_selection(point);
                    None
                }
                InteractionState::Idle | InteractionState::Hovering => {
                    state.update_cursor(point);
                    state.interaction = InteractionState::Hovering;
                    None
                }
            }
        };
        match event {
            Some(event) => self.emit(event),
            None => self.scheduler.draw(),
        }
    }

    pub fn on_canvas_mouse_up(&self, point: Point) {
        let (click, target) = {
            let mut state = self.state.borrow_mut();
            let interaction = state.interaction;
            let target = match interaction {
                InteractionState::DraggingSelect => {
                    state.extend_selection(point);
                    state.selection_target()
                }
                _ => None,
            };
            let click = state
                .drag
                .take()
                .is_some_and(|d| !d.moved && point.distance(d.origin) <= CLICK_SLOP);
            state.selection = None;
            state.interaction = InteractionState::Hovering;
            (click, target)
        };
        if let Some(rect) = target {
            self.emit(FlamegraphEvent::SetConfigView(rect));
        } else if click {
            self.on_canvas_click(point);
        } else {
            self.scheduler.draw();
        }
    }

    /// Select the node under `point`; clicking the already selected node
    /// zooms into it.
    pub fn on_canvas_click(&self, point: Point) {
        let event = self.state.borrow_mut().click(point);
        match event {
            Some(event) => self.emit(event),
            None => self.scheduler.draw(),
        }
    }

    pub fn on_canvas_mouse_leave(&self) {
        self.state.borrow_mut().clear_pointer();
        self.scheduler.draw();
    }

    /// Meta/ctrl zooms about the cursor, anything else pans. Native
    /// scrolling is always suppressed over the canvas.
    pub fn on_wheel(&self, wheel: WheelEvent) -> WheelOutcome {
        let transform = {
            let mut state = self.state.borrow_mut();
            state.update_cursor(wheel.point);
            if wheel.modifiers.zoom() {
                state.zoom_for_wheel(wheel.delta_y)
            } else {
                state.pan_for_wheel(wheel.delta_x, wheel.delta_y)
            }
        };
        let handled = transform.is_some();
        if let Some(m) = transform {
            self.emit(FlamegraphEvent::TransformConfigView(m));
        }
        WheelOutcome {
            prevent_default: true,
            handled,
        }
    }

    /// Host layout pass: resizes both canvases and redraws synchronously
    /// when the size changed.
    pub fn on_resize(&self, size: LogicalSize) -> bool {
        self.resize_observer.borrow_mut().observe(size)
    }

    pub fn set_device_pixel_ratio(&self, dpr: f64) {
        self.state.borrow_mut().set_device_pixel_ratio(dpr);
        self.scheduler.draw_sync();
    }

    pub fn reset_zoom(&self) {
        self.emit(FlamegraphEvent::ResetZoom);
    }

    pub fn zoom_into_frame(&self, frame: FlamegraphFrame) {
        self.emit(FlamegraphEvent::ZoomIntoFrame(frame));
    }

    pub fn set_config_view(&self, rect: Rect) {
        self.emit(FlamegraphEvent::SetConfigView(rect));
    }

    /// Emphasize every node sharing the selected node's symbol, across
    /// linked panels.
    pub fn highlight_selected(&self) {
        let key = self.state.borrow().selected.as_ref().map(FlamegraphFrame::key);
        self.emit(FlamegraphEvent::HighlightFrame(key));
    }

    pub fn set_search(&self, query: &str) {
        self.state.borrow_mut().set_search(query);
        self.scheduler.draw();
    }

    pub fn set_color_coding(&self, coding: ColorCoding) {
        self.state.borrow_mut().set_color_coding(coding);
        self.scheduler.draw();
    }

    pub fn selected_node(&self) -> Option<FlamegraphFrame> {
        self.state.borrow().selected.clone()
    }

    pub fn hovered_node(&self) -> Option<FlamegraphFrame> {
        self.state.borrow().hovered.clone()
    }

    pub fn config_space_cursor(&self) -> Option<Point> {
        self.state.borrow().cursor
    }

    pub fn interaction_state(&self) -> InteractionState {
        self.state.borrow().interaction
    }

    pub fn config_view(&self) -> Option<Rect> {
        self.state
            .borrow()
            .renderer
            .as_ref()
            .map(|r| r.view().config_view())
    }

    pub fn search_query(&self) -> String {
        self.state.borrow().query.clone()
    }

    pub fn flamegraph(&self) -> Option<Arc<Flamegraph>> {
        self.state.borrow().flamegraph.clone()
    }

    /// Primary and overlay canvas. Drop the guards before calling any
    /// other method on the view.
    pub fn canvases(&self) -> Option<(Ref<'_, Canvas>, Ref<'_, Canvas>)> {
        let primary = Ref::filter_map(self.state.borrow(), ZoomViewState::primary_canvas).ok()?;
        let overlay = Ref::filter_map(self.state.borrow(), |s| s.overlay.as_ref()).ok()?;
        Some((primary, overlay))
    }

    /// Release everything registered on the scheduler and pool. Also run
    /// on drop; calling it twice is harmless.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for cb in self.before_frame.drain(..) {
            self.scheduler.unregister_before_frame_callback(&cb);
        }
        for cb in self.after_frame.drain(..) {
            self.scheduler.unregister_after_frame_callback(&cb);
        }
        for (kind, handler) in self.handlers.drain(..) {
            self.scheduler.off(kind, &handler);
        }
        if let Some(pool) = &self.pool {
            pool.unregister_scheduler(&self.scheduler);
        }
        self.resize_observer.borrow_mut().disconnect();
        log::debug!("zoom view disposed");
    }

    /// Linked panels hear the event through the pool; a standalone panel
    /// goes straight to its own bus.
    fn emit(&self, event: FlamegraphEvent) {
        log::trace!("emit {:?}", event.kind());
        match &self.pool {
            Some(pool) if !self.disposed => pool.dispatch(&event),
            _ => self.scheduler.dispatch(&event),
        }
    }
}

impl Drop for FlamegraphZoomView {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for FlamegraphZoomView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlamegraphZoomView")
            .field("scheduler", &self.scheduler)
            .field("linked", &self.pool.is_some())
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

fn on_event(
    state: &Weak<RefCell<ZoomViewState>>,
    scheduler: &Weak<CanvasScheduler>,
    event: &FlamegraphEvent,
) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let changed = state.borrow_mut().handle(event);
    if !changed {
        log::trace!("{:?} left the view unchanged", event.kind());
    }
    if let Some(scheduler) = scheduler.upgrade() {
        scheduler.draw();
    }
}
