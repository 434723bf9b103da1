//! Plain-Rust side of the bindings: one panel driven by a polling
//! scheduler. The page calls `frame` from `requestAnimationFrame`.

use std::sync::Arc;

use flame_canvas_core::export::svg::render_svg;
use flame_canvas_core::{
    CanvasLayers, CanvasScheduler, ColorCoding, CoreError, Flamegraph, FlamegraphFrame,
    FlamegraphTheme, FlamegraphZoomView, LogicalSize, Modifiers, WheelEvent, WheelOutcome,
    ZoomViewConfig,
};
use flame_canvas_protocol::{Point, RenderCommand};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("encoding output: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("unknown color coding '{0}' (expected symbol, system or library)")]
    UnknownColorCoding(String),
}

/// Both layers of one drawn frame, in physical pixels.
#[derive(Serialize)]
struct FrameOutput<'a> {
    width: f64,
    height: f64,
    primary: &'a [RenderCommand],
    overlay: &'a [RenderCommand],
}

#[derive(Debug, Serialize)]
pub struct NodeInfo {
    pub id: u32,
    pub name: String,
    pub start: f64,
    pub end: f64,
    pub depth: u32,
    pub duration: String,
}

pub struct Session {
    view: FlamegraphZoomView,
    dark: bool,
}

pub fn parse_color_coding(name: &str) -> Result<ColorCoding, BridgeError> {
    match name {
        "symbol" => Ok(ColorCoding::BySymbolName),
        "system" => Ok(ColorCoding::BySystemVsApplication),
        "library" => Ok(ColorCoding::ByLibrary),
        other => Err(BridgeError::UnknownColorCoding(other.to_owned())),
    }
}

impl Session {
    pub fn new(
        data: &[u8],
        config: Option<&[u8]>,
        width: f64,
        height: f64,
        dpr: f64,
        dark: bool,
    ) -> Result<Self, BridgeError> {
        let flamegraph = Flamegraph::from_json(data).map_err(CoreError::from)?;
        let mut config = match config {
            Some(bytes) => ZoomViewConfig::from_json(bytes).map_err(CoreError::from)?,
            None => ZoomViewConfig::default(),
        };
        if !dark {
            config.theme.colors = FlamegraphTheme::light().colors;
        }
        log::debug!("session for {} frames", flamegraph.frames().len());

        let view = FlamegraphZoomView::new(config, CanvasScheduler::polling(), None);
        view.set_flamegraph(Arc::new(flamegraph));
        view.mount(CanvasLayers::new(width, height, dpr));
        Ok(Self { view, dark })
    }

    pub fn view(&self) -> &FlamegraphZoomView {
        &self.view
    }

    pub fn mouse_down(&self, x: f64, y: f64, modifiers: Modifiers) {
        self.view.on_canvas_mouse_down(Point::new(x, y), modifiers);
    }

    pub fn mouse_move(&self, x: f64, y: f64) {
        self.view.on_canvas_mouse_move(Point::new(x, y));
    }

    pub fn mouse_up(&self, x: f64, y: f64) {
        self.view.on_canvas_mouse_up(Point::new(x, y));
    }

    pub fn wheel(
        &self,
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
        modifiers: Modifiers,
    ) -> WheelOutcome {
        self.view.on_wheel(WheelEvent {
            point: Point::new(x, y),
            delta_x,
            delta_y,
            modifiers,
        })
    }

    pub fn resize(&self, width: f64, height: f64) -> bool {
        self.view.on_resize(LogicalSize::new(width, height))
    }

    /// Draw if anything is pending. Returns the frame as JSON when it
    /// changed, `None` otherwise.
    pub fn frame(&self) -> Result<Option<String>, BridgeError> {
        if !self.view.scheduler().tick() {
            return Ok(None);
        }
        self.snapshot().map(Some)
    }

    /// The last drawn frame, whether or not it changed.
    pub fn snapshot(&self) -> Result<String, BridgeError> {
        let Some((primary, overlay)) = self.view.canvases() else {
            return Ok(String::from("null"));
        };
        let physical = primary.physical_space();
        let output = FrameOutput {
            width: physical.w,
            height: physical.h,
            primary: primary.commands(),
            overlay: overlay.commands(),
        };
        Ok(serde_json::to_string(&output)?)
    }

    pub fn svg(&self) -> String {
        self.view.scheduler().tick();
        match self.view.canvases() {
            Some((primary, overlay)) => {
                let physical = primary.physical_space();
                render_svg(
                    &[primary.commands(), overlay.commands()],
                    physical.w,
                    physical.h,
                    self.dark,
                )
            }
            None => String::new(),
        }
    }

    pub fn node_info(&self, node: Option<FlamegraphFrame>) -> Result<Option<String>, BridgeError> {
        let Some(node) = node else {
            return Ok(None);
        };
        let unit = self.view.flamegraph().map(|f| f.unit()).unwrap_or_default();
        let info = NodeInfo {
            id: node.id.0,
            name: node.name().as_str().to_owned(),
            start: node.start,
            end: node.end,
            depth: node.depth,
            duration: unit.format_value(node.duration()),
        };
        Ok(Some(serde_json::to_string(&info)?))
    }
}
