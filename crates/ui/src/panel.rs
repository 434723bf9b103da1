//! One flamegraph panel inside an egui layout.

use std::rc::Rc;
use std::sync::Arc;

use flame_canvas_core::{
    CanvasLayers, CanvasPoolManager, CanvasScheduler, ColorCoding, Flamegraph, FlamegraphZoomView,
    FrameRequester, InteractionState, LogicalSize, Modifiers, RendererOptions, WheelEvent,
    ZoomViewConfig,
};
use flame_canvas_protocol::Point;

use crate::renderer::{self, GalleyMetrics};
use crate::theme::ThemeMode;

/// Wheel delta equivalent of a pinch step, fed through the zoom path.
const PINCH_TO_WHEEL: f64 = 100.0;

/// Requests a repaint; egui then calls `Panel::show`, which ticks.
struct RepaintRequester(egui::Context);

impl FrameRequester for RepaintRequester {
    fn request_frame(&self) {
        self.0.request_repaint();
    }
}

pub struct Panel {
    id: egui::Id,
    view: FlamegraphZoomView,
}

impl Panel {
    pub fn new(
        ctx: &egui::Context,
        id: &str,
        mode: ThemeMode,
        options: RendererOptions,
        pool: &Rc<CanvasPoolManager>,
    ) -> Self {
        let config = ZoomViewConfig {
            theme: mode.flamegraph_theme(),
            options,
        };
        let scheduler = CanvasScheduler::new(Rc::new(RepaintRequester(ctx.clone())));
        let view = FlamegraphZoomView::new(config, scheduler, Some(Rc::clone(pool)));
        view.set_text_metrics(Box::new(GalleyMetrics::new(ctx.clone())));
        Self {
            id: egui::Id::new(id),
            view,
        }
    }

    pub fn view(&self) -> &FlamegraphZoomView {
        &self.view
    }

    pub fn set_flamegraph(&self, flamegraph: Arc<Flamegraph>) {
        self.view.set_flamegraph(flamegraph);
    }

    pub fn set_search(&self, query: &str) {
        self.view.set_search(query);
    }

    pub fn set_color_coding(&self, coding: ColorCoding) {
        self.view.set_color_coding(coding);
    }

    fn to_canvas(rect: egui::Rect, pos: egui::Pos2) -> Point {
        Point::new(f64::from(pos.x - rect.left()), f64::from(pos.y - rect.top()))
    }

    /// Lay out, feed this frame's input, tick, and paint.
    pub fn show(&self, ui: &mut egui::Ui, rect: egui::Rect, mode: ThemeMode) {
        let ppp = ui.ctx().pixels_per_point();
        let dpr = f64::from(ppp);
        let size = LogicalSize::new(f64::from(rect.width()), f64::from(rect.height()));
        let mounted_dpr = self
            .view
            .canvases()
            .map(|(primary, _)| primary.device_pixel_ratio());
        match mounted_dpr {
            None => self.view.mount(CanvasLayers::new(size.width, size.height, dpr)),
            Some(current) if current != dpr => self.view.set_device_pixel_ratio(dpr),
            Some(_) => {}
        }
        self.view.on_resize(size);

        let response = ui.interact(rect, self.id, egui::Sense::click_and_drag());
        self.handle_input(ui, rect, &response);
        self.view.scheduler().tick();

        let mut painter = ui.painter_at(rect);
        if let Some((primary, overlay)) = self.view.canvases() {
            renderer::paint_commands(&mut painter, primary.commands(), rect.min, ppp, mode);
            renderer::paint_commands(&mut painter, overlay.commands(), rect.min, ppp, mode);
        }

        if let Some(node) = self.view.hovered_node() {
            let unit = self.view.flamegraph().map(|f| f.unit()).unwrap_or_default();
            response.on_hover_ui_at_pointer(|ui| {
                ui.label(node.name().as_str());
                ui.label(unit.format_value(node.duration()));
            });
        }
    }

    fn handle_input(&self, ui: &egui::Ui, rect: egui::Rect, response: &egui::Response) {
        let (hover, latest, pressed, released, moved, modifiers, scroll, zoom) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.latest_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta() != egui::Vec2::ZERO,
                i.modifiers,
                i.raw_scroll_delta,
                i.zoom_delta(),
            )
        });
        let modifiers = Modifiers {
            shift: modifiers.shift,
            ctrl: modifiers.ctrl,
            alt: modifiers.alt,
            meta: modifiers.mac_cmd,
        };
        let dragging = matches!(
            self.view.interaction_state(),
            InteractionState::DraggingPan | InteractionState::DraggingSelect
        );

        // Drags keep tracking outside the panel until release.
        if dragging {
            if let Some(pos) = latest {
                let point = Self::to_canvas(rect, pos);
                if moved {
                    self.view.on_canvas_mouse_move(point);
                }
                if released {
                    self.view.on_canvas_mouse_up(point);
                }
            }
            return;
        }

        let Some(pos) = hover.filter(|p| rect.contains(*p)) else {
            if self.view.interaction_state() == InteractionState::Hovering {
                self.view.on_canvas_mouse_leave();
            }
            return;
        };
        let point = Self::to_canvas(rect, pos);

        if pressed && response.hovered() {
            self.view.on_canvas_mouse_down(point, modifiers);
            // A fast click can press and release within one frame.
            if released {
                self.view.on_canvas_mouse_up(point);
            }
        } else if moved || self.view.interaction_state() == InteractionState::Idle {
            self.view.on_canvas_mouse_move(point);
        }

        // egui scrolls content up for positive y; the engine follows the
        // DOM convention where positive y scrolls down.
        if scroll != egui::Vec2::ZERO {
            self.view.on_wheel(WheelEvent {
                point,
                delta_x: -f64::from(scroll.x),
                delta_y: -f64::from(scroll.y),
                modifiers,
            });
        } else if (zoom - 1.0).abs() > f32::EPSILON {
            self.view.on_wheel(WheelEvent {
                point,
                delta_x: 0.0,
                delta_y: -(f64::from(zoom) - 1.0) * PINCH_TO_WHEEL,
                modifiers: Modifiers::META,
            });
        }
    }
}
