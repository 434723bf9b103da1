use std::rc::Rc;
use std::sync::{Arc, Mutex};

use eframe::egui;
use flame_canvas_core::{CanvasPoolManager, ColorCoding, Flamegraph, RendererOptions};

use crate::panel::Panel;
use crate::theme::ThemeMode;

const PANEL_GAP: f32 = 4.0;

/// Main application state.
pub struct FlameApp {
    /// Links every panel so zoom, reset and highlight stay in sync.
    pool: Rc<CanvasPoolManager>,
    panels: Vec<Panel>,
    flamegraph: Option<Arc<Flamegraph>>,
    theme_mode: ThemeMode,
    options: RendererOptions,
    search: String,
    /// Show a second, linked panel below the first.
    split: bool,
    /// Error message to display.
    error: Option<String>,
    /// Pending flamegraph data from async load.
    pending_data: Arc<Mutex<Option<Vec<u8>>>>,
}

impl FlameApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let theme_mode = ThemeMode::Dark;
        cc.egui_ctx.set_visuals(theme_mode.visuals());

        let pending_data: Arc<Mutex<Option<Vec<u8>>>> = Arc::new(Mutex::new(None));

        // On WASM, check URL hash for auto-load (e.g. #demo)
        #[cfg(target_arch = "wasm32")]
        {
            let hash = web_sys::window()
                .and_then(|w| w.location().hash().ok())
                .unwrap_or_default();
            if hash == "#demo" {
                let pd = Arc::clone(&pending_data);
                let ctx = cc.egui_ctx.clone();
                log::info!("loading demo flamegraph");
                wasm_bindgen_futures::spawn_local(async move {
                    match Self::fetch_bytes("assets/demo.json").await {
                        Ok(bytes) => {
                            if let Ok(mut lock) = pd.lock() {
                                *lock = Some(bytes);
                            }
                            ctx.request_repaint();
                        }
                        Err(e) => log::error!("demo fetch failed: {e}"),
                    }
                });
            }
        }

        let mut app = Self {
            pool: CanvasPoolManager::new(),
            panels: Vec::new(),
            flamegraph: None,
            theme_mode,
            options: RendererOptions::default(),
            search: String::new(),
            split: false,
            error: None,
            pending_data,
        };
        app.rebuild_panels(&cc.egui_ctx);
        app
    }

    /// Show an already validated flamegraph.
    pub fn open(&mut self, flamegraph: Arc<Flamegraph>) {
        log::info!(
            "showing {:?} ({} frames)",
            flamegraph.name(),
            flamegraph.frames().len()
        );
        for panel in &self.panels {
            panel.set_flamegraph(Arc::clone(&flamegraph));
        }
        self.flamegraph = Some(flamegraph);
        self.error = None;
    }

    fn load_bytes(&mut self, data: &[u8]) {
        match Flamegraph::from_json(data) {
            Ok(flamegraph) => self.open(Arc::new(flamegraph)),
            Err(e) => {
                log::warn!("rejected flamegraph: {e}");
                self.error = Some(format!("Failed to load flamegraph: {e}"));
            }
        }
    }

    /// Panels carry their theme from construction, so theme and layout
    /// changes start from fresh ones.
    fn rebuild_panels(&mut self, ctx: &egui::Context) {
        let count = if self.split { 2 } else { 1 };
        self.panels = (0..count)
            .map(|i| {
                Panel::new(
                    ctx,
                    &format!("flamegraph_panel_{i}"),
                    self.theme_mode,
                    self.options.clone(),
                    &self.pool,
                )
            })
            .collect();
        for panel in &self.panels {
            if let Some(flamegraph) = &self.flamegraph {
                panel.set_flamegraph(Arc::clone(flamegraph));
            }
            panel.set_search(&self.search);
        }
        log::debug!("{} panel(s), pool of {}", self.panels.len(), self.pool.len());
    }

    fn primary(&self) -> Option<&Panel> {
        self.panels.first()
    }

    #[cfg(target_arch = "wasm32")]
    async fn fetch_bytes(url: &str) -> Result<Vec<u8>, String> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;

        let window = web_sys::window().ok_or("no window")?;
        let resp_value = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| format!("{e:?}"))?;
        let resp: web_sys::Response = resp_value
            .dyn_into()
            .map_err(|_| "not a Response")?;
        if !resp.ok() {
            return Err(format!("HTTP {}", resp.status()));
        }
        let buf = JsFuture::from(resp.array_buffer().map_err(|e| format!("{e:?}"))?)
            .await
            .map_err(|e| format!("{e:?}"))?;
        let uint8 = js_sys::Uint8Array::new(&buf);
        Ok(uint8.to_vec())
    }

    fn toolbar(&mut self, ctx: &egui::Context, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("flame-canvas");
            ui.separator();

            if ui.button("Open").clicked() {
                #[cfg(not(target_arch = "wasm32"))]
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Flamegraph", &["json"])
                        .pick_file()
                    {
                        match flame_canvas_core::load_flamegraph(&path) {
                            Ok(flamegraph) => self.open(flamegraph),
                            Err(e) => self.error = Some(e.to_string()),
                        }
                    }
                }
            }

            let theme_label = match self.theme_mode {
                ThemeMode::Dark => "Dark",
                ThemeMode::Light => "Light",
            };
            if ui.button(theme_label).clicked() {
                self.theme_mode = self.theme_mode.toggled();
                ctx.set_visuals(self.theme_mode.visuals());
                self.rebuild_panels(ctx);
            }
            ui.separator();

            let search = ui.add(
                egui::TextEdit::singleline(&mut self.search)
                    .hint_text("Search")
                    .desired_width(160.0),
            );
            if search.changed() {
                for panel in &self.panels {
                    panel.set_search(&self.search);
                }
            }

            let before = self.options.color_coding;
            egui::ComboBox::from_id_salt("color_coding")
                .selected_text(coding_label(self.options.color_coding))
                .show_ui(ui, |ui| {
                    for coding in [
                        ColorCoding::BySymbolName,
                        ColorCoding::BySystemVsApplication,
                        ColorCoding::ByLibrary,
                    ] {
                        ui.selectable_value(
                            &mut self.options.color_coding,
                            coding,
                            coding_label(coding),
                        );
                    }
                });
            if self.options.color_coding != before {
                for panel in &self.panels {
                    panel.set_color_coding(self.options.color_coding);
                }
            }
            ui.separator();

            if ui.button("Reset zoom").clicked() {
                if let Some(panel) = self.primary() {
                    panel.view().reset_zoom();
                }
            }
            if ui.button("Highlight").clicked() {
                if let Some(panel) = self.primary() {
                    panel.view().highlight_selected();
                }
            }
            if ui.checkbox(&mut self.split, "Split").changed() {
                self.rebuild_panels(ctx);
            }
        });
    }

    fn status(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(err) = &self.error {
                ui.colored_label(egui::Color32::RED, err);
                return;
            }
            let (Some(flamegraph), Some(panel)) = (&self.flamegraph, self.primary()) else {
                ui.label("No flamegraph loaded. Click Open or drop a file");
                return;
            };
            let unit = flamegraph.unit();
            if let Some(view) = panel.view().config_view() {
                ui.label(format!(
                    "Viewing {} to {}",
                    unit.format_value(view.left()),
                    unit.format_value(view.right())
                ));
            }
            if let Some(node) = panel.view().selected_node() {
                ui.separator();
                ui.label(format!(
                    "{} ({})",
                    node.name(),
                    unit.format_value(node.duration())
                ));
            }
        });
    }
}

fn coding_label(coding: ColorCoding) -> &'static str {
    match coding {
        ColorCoding::BySymbolName => "By symbol",
        ColorCoding::BySystemVsApplication => "System vs app",
        ColorCoding::ByLibrary => "By library",
    }
}

impl eframe::App for FlameApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for async-loaded flamegraph data
        let pending = {
            let mut lock = self.pending_data.lock().unwrap_or_else(|e| e.into_inner());
            lock.take()
        };
        if let Some(data) = pending {
            self.load_bytes(&data);
        }

        // Native drops carry a path, web drops carry the bytes.
        let dropped = ctx.input(|i| i.raw.dropped_files.first().cloned());
        if let Some(file) = dropped {
            if let Some(bytes) = &file.bytes {
                self.load_bytes(bytes);
            } else if let Some(path) = &file.path {
                match flame_canvas_core::load_flamegraph(path) {
                    Ok(flamegraph) => self.open(flamegraph),
                    Err(e) => self.error = Some(e.to_string()),
                }
            }
        }

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| self.toolbar(ctx, ui));
        egui::TopBottomPanel::bottom("status").show(ctx, |ui| self.status(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| {
                if self.flamegraph.is_none() {
                    ui.centered_and_justified(|ui| {
                        ui.heading("Drop a flamegraph JSON file here or click Open");
                    });
                    return;
                }

                if ui.input(|i| i.key_pressed(egui::Key::Num0)) {
                    if let Some(panel) = self.primary() {
                        panel.view().reset_zoom();
                    }
                }

                let available = ui.available_rect_before_wrap();
                let count = self.panels.len().max(1) as f32;
                let height = (available.height() - PANEL_GAP * (count - 1.0)) / count;
                let mode = self.theme_mode;
                for (i, panel) in self.panels.iter().enumerate() {
                    let top = available.top() + i as f32 * (height + PANEL_GAP);
                    let rect = egui::Rect::from_min_size(
                        egui::pos2(available.left(), top),
                        egui::vec2(available.width(), height),
                    );
                    panel.show(ui, rect, mode);
                }
            });
    }
}
