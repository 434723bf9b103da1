//! JavaScript bindings: a page owns one [`FlamegraphPanel`] per `<canvas>`
//! and replays the JSON command lists it returns.

mod session;

use flame_canvas_core::Modifiers;
use wasm_bindgen::prelude::*;

pub use session::{BridgeError, NodeInfo, Session, parse_color_coding};

fn js_error(e: BridgeError) -> JsError {
    JsError::new(&e.to_string())
}

#[wasm_bindgen]
pub struct FlamegraphPanel {
    session: Session,
}

#[wasm_bindgen]
impl FlamegraphPanel {
    /// Parse a flamegraph (JSON bytes) and mount it on a canvas of the
    /// given logical size. `config` is optional theme/options JSON.
    #[wasm_bindgen(constructor)]
    pub fn new(
        data: &[u8],
        config: Option<String>,
        width: f64,
        height: f64,
        dpr: f64,
        dark: bool,
    ) -> Result<FlamegraphPanel, JsError> {
        let session = Session::new(
            data,
            config.as_deref().map(str::as_bytes),
            width,
            height,
            dpr,
            dark,
        )
        .map_err(js_error)?;
        Ok(Self { session })
    }

    pub fn mouse_down(&self, x: f64, y: f64, shift: bool, ctrl: bool, alt: bool, meta: bool) {
        self.session.mouse_down(
            x,
            y,
            Modifiers {
                shift,
                ctrl,
                alt,
                meta,
            },
        );
    }

    pub fn mouse_move(&self, x: f64, y: f64) {
        self.session.mouse_move(x, y);
    }

    pub fn mouse_up(&self, x: f64, y: f64) {
        self.session.mouse_up(x, y);
    }

    pub fn mouse_leave(&self) {
        self.session.view().on_canvas_mouse_leave();
    }

    /// Returns whether the page should call `preventDefault`.
    pub fn wheel(
        &self,
        x: f64,
        y: f64,
        delta_x: f64,
        delta_y: f64,
        ctrl: bool,
        meta: bool,
    ) -> bool {
        let modifiers = Modifiers {
            ctrl,
            meta,
            ..Modifiers::NONE
        };
        self.session
            .wheel(x, y, delta_x, delta_y, modifiers)
            .prevent_default
    }

    pub fn resize(&self, width: f64, height: f64) -> bool {
        self.session.resize(width, height)
    }

    pub fn set_device_pixel_ratio(&self, dpr: f64) {
        self.session.view().set_device_pixel_ratio(dpr);
    }

    pub fn reset_zoom(&self) {
        self.session.view().reset_zoom();
    }

    pub fn highlight_selected(&self) {
        self.session.view().highlight_selected();
    }

    pub fn set_search(&self, query: &str) {
        self.session.view().set_search(query);
    }

    /// One of `symbol`, `system` or `library`.
    pub fn set_color_coding(&self, coding: &str) -> Result<(), JsError> {
        let coding = parse_color_coding(coding).map_err(js_error)?;
        self.session.view().set_color_coding(coding);
        Ok(())
    }

    /// Draw pending work. Returns `{width, height, primary, overlay}` JSON
    /// when the canvases changed, `undefined` otherwise.
    pub fn frame(&self) -> Result<Option<String>, JsError> {
        self.session.frame().map_err(js_error)
    }

    pub fn snapshot(&self) -> Result<String, JsError> {
        self.session.snapshot().map_err(js_error)
    }

    pub fn to_svg(&self) -> String {
        self.session.svg()
    }

    pub fn selected(&self) -> Result<Option<String>, JsError> {
        let node = self.session.view().selected_node();
        self.session.node_info(node).map_err(js_error)
    }

    pub fn hovered(&self) -> Result<Option<String>, JsError> {
        let node = self.session.view().hovered_node();
        self.session.node_info(node).map_err(js_error)
    }
}
