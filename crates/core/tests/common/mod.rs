#![allow(dead_code)]

use std::rc::Rc;
use std::sync::Arc;

use flame_canvas_core::{
    CanvasLayers, CanvasPoolManager, CanvasScheduler, Flamegraph, FlamegraphZoomView,
    ZoomViewConfig,
};
use flame_canvas_protocol::{Point, RenderCommand};

/// main [0,40) → parse [0,10) → tokenize [0,10)
///             → render [10,30) → layout [10,30)
///             → HashMap::insert [30,30.2)
pub const PIPELINE: &[u8] = include_bytes!("../fixtures/render_pipeline.json");

pub const WIDTH: f64 = 400.0;
pub const HEIGHT: f64 = 120.0;

pub fn pipeline() -> Arc<Flamegraph> {
    Arc::new(Flamegraph::from_json(PIPELINE).expect("fixture parses"))
}

/// A mounted 400×120 panel at dpr 1 with its first frame drawn.
pub fn panel(pool: Option<Rc<CanvasPoolManager>>) -> FlamegraphZoomView {
    let view = FlamegraphZoomView::new(ZoomViewConfig::default(), CanvasScheduler::polling(), pool);
    view.set_flamegraph(pipeline());
    view.mount(CanvasLayers::new(WIDTH, HEIGHT, 1.0));
    view.scheduler().tick();
    view
}

/// Logical pointer position over config `x` in row `depth`, for the
/// unzoomed view (10 px per unit, 20 px timeline, 20 px rows).
pub fn at(x: f64, depth: u32) -> Point {
    Point::new(x * 10.0, 30.0 + 20.0 * f64::from(depth))
}

pub fn overlay(view: &FlamegraphZoomView) -> Vec<RenderCommand> {
    let (_, overlay) = view.canvases().expect("panel is mounted");
    overlay.commands().to_vec()
}

pub fn primary(view: &FlamegraphZoomView) -> Vec<RenderCommand> {
    let (primary, _) = view.canvases().expect("panel is mounted");
    primary.commands().to_vec()
}

pub fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
