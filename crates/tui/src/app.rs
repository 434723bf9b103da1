use std::io::{Stdout, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use flame_canvas_core::{
    CanvasLayers, CanvasScheduler, ColorCoding, Flamegraph, FlamegraphZoomView, LogicalSize,
    Modifiers, WheelEvent, ZoomViewConfig,
};
use flame_canvas_protocol::Point;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect as Area;
use ratatui::style::{Color, Style};
use ratatui::widgets::Paragraph;

use crate::renderer::{CELL_HEIGHT, CELL_WIDTH, CellMetrics, CellPainter};

/// Wheel delta sent per scroll notch when zooming.
const ZOOM_STEP: f64 = 20.0;
/// Fraction of the visible width panned by the arrow keys.
const PAN_FRACTION: f64 = 0.1;

pub struct App {
    view: FlamegraphZoomView,
    flamegraph: Arc<Flamegraph>,
    dark: bool,
    /// Search text being typed; `None` when not editing.
    editing: Option<String>,
    coding: ColorCoding,
    body: Area,
    quit: bool,
}

impl App {
    pub fn new(flamegraph: Arc<Flamegraph>, config: ZoomViewConfig, dark: bool) -> Self {
        let coding = config.options.color_coding;
        let view = FlamegraphZoomView::new(config, CanvasScheduler::polling(), None);
        view.set_text_metrics(Box::new(CellMetrics));
        view.set_flamegraph(Arc::clone(&flamegraph));
        Self {
            view,
            flamegraph,
            dark,
            editing: None,
            coding,
            body: Area::default(),
            quit: false,
        }
    }

    /// Body area in canvas pixels.
    fn body_size(body: Area) -> LogicalSize {
        LogicalSize::new(
            f64::from(body.width) * CELL_WIDTH,
            f64::from(body.height) * CELL_HEIGHT,
        )
    }

    /// Canvas point at the center of a terminal cell, if inside the body.
    fn to_canvas(&self, column: u16, row: u16) -> Option<Point> {
        let body = self.body;
        let inside = column >= body.x
            && column < body.x + body.width
            && row >= body.y
            && row < body.y + body.height;
        inside.then(|| {
            Point::new(
                (f64::from(column - body.x) + 0.5) * CELL_WIDTH,
                (f64::from(row - body.y) + 0.5) * CELL_HEIGHT,
            )
        })
    }

    fn center(&self) -> Point {
        let size = Self::body_size(self.body);
        Point::new(size.width / 2.0, size.height / 2.0)
    }

    fn layout(&mut self, area: Area) {
        let body = Area::new(area.x, area.y + 1, area.width, area.height.saturating_sub(2));
        if self.body == Area::default() {
            let size = Self::body_size(body);
            self.view
                .mount(CanvasLayers::new(size.width, size.height, 1.0));
        }
        self.body = body;
        self.view.on_resize(Self::body_size(body));
    }

    fn header(&self) -> String {
        let selected = match self.view.selected_node() {
            Some(frame) => format!(
                " | {} {}",
                frame.name(),
                self.flamegraph.unit().format_value(frame.duration())
            ),
            None => String::new(),
        };
        format!(
            " flame-canvas | {} | {} frames{selected}",
            self.flamegraph.name().unwrap_or("untitled"),
            self.flamegraph.frames().len()
        )
    }

    fn footer(&self) -> String {
        match &self.editing {
            Some(query) => format!(" search: {query}▏"),
            None => {
                let query = self.view.search_query();
                let search = if query.is_empty() {
                    String::new()
                } else {
                    format!(" [/{query}]")
                };
                format!(
                    " ←→ pan | +/- zoom | r reset | enter zoom | h highlight | c colors | / search | q quit{search}"
                )
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if let Some(query) = self.editing.as_mut() {
            match key.code {
                KeyCode::Esc => self.editing = None,
                KeyCode::Enter => {
                    let query = std::mem::take(query);
                    self.editing = None;
                    self.view.set_search(&query);
                }
                KeyCode::Backspace => {
                    query.pop();
                }
                KeyCode::Char(c) => query.push(c),
                _ => {}
            }
            return;
        }

        let center = self.center();
        let pan = Self::body_size(self.body).width * PAN_FRACTION;
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Left => self.wheel(center, -pan, 0.0, Modifiers::NONE),
            KeyCode::Right => self.wheel(center, pan, 0.0, Modifiers::NONE),
            KeyCode::Up => self.wheel(center, 0.0, -CELL_HEIGHT, Modifiers::NONE),
            KeyCode::Down => self.wheel(center, 0.0, CELL_HEIGHT, Modifiers::NONE),
            KeyCode::Char('+' | '=') => self.wheel(center, 0.0, -ZOOM_STEP, Modifiers::META),
            KeyCode::Char('-') => self.wheel(center, 0.0, ZOOM_STEP, Modifiers::META),
            KeyCode::Char('r') => self.view.reset_zoom(),
            KeyCode::Enter => {
                if let Some(frame) = self.view.selected_node() {
                    self.view.zoom_into_frame(frame);
                }
            }
            KeyCode::Char('h') => self.view.highlight_selected(),
            KeyCode::Char('c') => {
                self.coding = match self.coding {
                    ColorCoding::BySymbolName => ColorCoding::BySystemVsApplication,
                    ColorCoding::BySystemVsApplication => ColorCoding::ByLibrary,
                    ColorCoding::ByLibrary => ColorCoding::BySymbolName,
                };
                log::debug!("color coding {:?}", self.coding);
                self.view.set_color_coding(self.coding);
            }
            KeyCode::Char('/') => self.editing = Some(self.view.search_query()),
            _ => {}
        }
    }

    fn wheel(&self, point: Point, delta_x: f64, delta_y: f64, modifiers: Modifiers) {
        self.view.on_wheel(WheelEvent {
            point,
            delta_x,
            delta_y,
            modifiers,
        });
    }

    fn on_mouse(&self, mouse: MouseEvent) {
        let Some(point) = self.to_canvas(mouse.column, mouse.row) else {
            self.view.on_canvas_mouse_leave();
            return;
        };
        let modifiers = Modifiers {
            shift: mouse.modifiers.contains(KeyModifiers::SHIFT),
            ctrl: mouse.modifiers.contains(KeyModifiers::CONTROL),
            alt: mouse.modifiers.contains(KeyModifiers::ALT),
            meta: mouse.modifiers.contains(KeyModifiers::SUPER),
        };
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.view.on_canvas_mouse_down(point, modifiers);
            }
            MouseEventKind::Up(MouseButton::Left) => self.view.on_canvas_mouse_up(point),
            MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
                self.view.on_canvas_mouse_move(point);
            }
            MouseEventKind::ScrollUp if modifiers.zoom() => {
                self.wheel(point, 0.0, -ZOOM_STEP, modifiers);
            }
            MouseEventKind::ScrollDown if modifiers.zoom() => {
                self.wheel(point, 0.0, ZOOM_STEP, modifiers);
            }
            MouseEventKind::ScrollUp => self.wheel(point, 0.0, -CELL_HEIGHT, modifiers),
            MouseEventKind::ScrollDown => self.wheel(point, 0.0, CELL_HEIGHT, modifiers),
            MouseEventKind::ScrollLeft => self.wheel(point, -4.0 * CELL_WIDTH, 0.0, modifiers),
            MouseEventKind::ScrollRight => self.wheel(point, 4.0 * CELL_WIDTH, 0.0, modifiers),
            _ => {}
        }
    }

    fn render(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let header = self.header();
        let footer = self.footer();
        let dark = self.dark;
        let body = self.body;
        terminal.draw(|frame| {
            let area = frame.area();
            let bar = Style::default().fg(Color::White).bg(Color::DarkGray);
            frame.render_widget(
                Paragraph::new(header).style(bar),
                Area::new(area.x, area.y, area.width, 1),
            );
            frame.render_widget(
                Paragraph::new(footer).style(bar),
                Area::new(area.x, area.bottom().saturating_sub(1), area.width, 1),
            );
            if let Some((primary, overlay)) = self.view.canvases() {
                let mut painter = CellPainter::new(frame.buffer_mut(), body, dark);
                painter.paint(primary.commands());
                painter.paint(overlay.commands());
            }
        })?;
        Ok(())
    }
}

pub fn run(mut app: App) -> Result<()> {
    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;

    let result = event_loop(&mut app, &mut terminal);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop(app: &mut App, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    let size = terminal.size()?;
    app.layout(Area::new(0, 0, size.width, size.height));
    let mut dirty = true;

    while !app.quit {
        if app.view.scheduler().tick() {
            dirty = true;
        }
        if dirty {
            app.render(terminal)?;
            dirty = false;
        }

        if !event::poll(Duration::from_millis(50))? {
            continue;
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                app.on_key(key);
                // Header/footer text may change without a canvas redraw.
                dirty = true;
            }
            Event::Mouse(mouse) => app.on_mouse(mouse),
            Event::Resize(width, height) => {
                app.layout(Area::new(0, 0, width, height));
                dirty = true;
            }
            _ => {}
        }
    }
    log::info!("quit");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        let flamegraph = Arc::new(
            Flamegraph::from_json(include_bytes!("../assets/demo.json")).expect("demo parses"),
        );
        let mut app = App::new(flamegraph, ZoomViewConfig::default(), true);
        app.layout(Area::new(0, 0, 80, 12));
        app
    }

    #[test]
    fn cells_map_to_canvas_pixels() {
        let app = app();
        let point = app.to_canvas(3, 1).expect("inside the body");
        assert!((point.x - 28.0).abs() < 1e-9);
        assert!((point.y - 10.0).abs() < 1e-9);
        // Header and footer rows are outside the canvas.
        assert!(app.to_canvas(3, 0).is_none());
        assert!(app.to_canvas(3, 11).is_none());
    }

    #[test]
    fn search_is_applied_on_enter() {
        let mut app = app();
        for code in [
            KeyCode::Char('/'),
            KeyCode::Char('m'),
            KeyCode::Char('a'),
            KeyCode::Enter,
        ] {
            app.on_key(KeyEvent::from(code));
        }
        assert_eq!(app.view.search_query(), "ma");
        assert!(app.editing.is_none());
    }

    #[test]
    fn plus_zooms_in_and_r_resets() {
        let mut app = app();
        let full = app.view.config_view().expect("mounted");
        app.on_key(KeyEvent::from(KeyCode::Char('+')));
        let zoomed = app.view.config_view().expect("mounted");
        assert!(zoomed.w < full.w);
        app.on_key(KeyEvent::from(KeyCode::Char('r')));
        assert_eq!(app.view.config_view(), Some(full));
    }
}
