//! Replays canvas commands into terminal cells.
//!
//! Each cell stands for a `CELL_WIDTH × CELL_HEIGHT` block of canvas
//! pixels, so one flamegraph row (20 px by default) is one terminal line.

use flame_canvas_core::TextMetrics;
use flame_canvas_core::export::token_color;
use flame_canvas_protocol::{Color, Fill, Rect, RenderCommand, TextAlign, ThemeToken};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect as Area;
use ratatui::style::{Color as TermColor, Modifier, Style};

pub const CELL_WIDTH: f64 = 8.0;
pub const CELL_HEIGHT: f64 = 20.0;

/// Every character takes one cell, whatever the font size.
#[derive(Debug, Clone, Copy, Default)]
pub struct CellMetrics;

impl TextMetrics for CellMetrics {
    fn measure(&self, text: &str, _font_size: f64) -> f64 {
        text.chars().count() as f64 * CELL_WIDTH
    }
}

fn term_color(color: Color) -> TermColor {
    let [r, g, b, _] = color.to_rgba8();
    TermColor::Rgb(r, g, b)
}

/// Cell span `[start, end)` covered by a pixel span; never empty for a
/// non-empty input so that slivers stay visible.
fn cells(from: f64, to: f64, cell: f64, limit: u16) -> (u16, u16) {
    let start = (from / cell).round().max(0.0);
    let mut end = (to / cell).round().max(0.0);
    if end <= start && to > from {
        end = start + 1.0;
    }
    let clamp = |v: f64| (v as u16).min(limit);
    (clamp(start), clamp(end))
}

pub struct CellPainter<'a> {
    buf: &'a mut Buffer,
    area: Area,
    dark: bool,
    clip: Option<Rect>,
}

impl<'a> CellPainter<'a> {
    pub fn new(buf: &'a mut Buffer, area: Area, dark: bool) -> Self {
        Self {
            buf,
            area,
            dark,
            clip: None,
        }
    }

    fn background(&self) -> Color {
        token_color(ThemeToken::Background, self.dark)
    }

    fn resolve(&self, fill: Fill) -> Color {
        match fill {
            Fill::Token(token) => token_color(token, self.dark),
            Fill::Color(color) => color,
        }
    }

    fn clipped(&self, rect: Rect) -> Option<Rect> {
        let Some(clip) = self.clip else {
            return Some(rect);
        };
        let left = rect.left().max(clip.left());
        let top = rect.top().max(clip.top());
        let right = rect.right().min(clip.right());
        let bottom = rect.bottom().min(clip.bottom());
        (right > left && bottom > top).then(|| Rect::new(left, top, right - left, bottom - top))
    }

    /// Visit every cell under `rect`, in buffer coordinates.
    fn for_cells(&mut self, rect: Rect, mut visit: impl FnMut(&mut ratatui::buffer::Cell)) {
        let Some(rect) = self.clipped(rect) else {
            return;
        };
        let (c0, c1) = cells(rect.left(), rect.right(), CELL_WIDTH, self.area.width);
        let (r0, r1) = cells(rect.top(), rect.bottom(), CELL_HEIGHT, self.area.height);
        for row in r0..r1 {
            for col in c0..c1 {
                visit(&mut self.buf[(self.area.x + col, self.area.y + row)]);
            }
        }
    }

    pub fn paint(&mut self, commands: &[RenderCommand]) {
        for command in commands {
            match command {
                RenderCommand::Clear => {
                    let bg = term_color(self.background());
                    let whole = Rect::new(
                        0.0,
                        0.0,
                        f64::from(self.area.width) * CELL_WIDTH,
                        f64::from(self.area.height) * CELL_HEIGHT,
                    );
                    self.clip = None;
                    self.for_cells(whole, |cell| {
                        cell.reset();
                        cell.set_bg(bg);
                    });
                }
                RenderCommand::DrawRect { rect, fill, .. } => {
                    let bg = term_color(self.resolve(*fill).over(self.background()));
                    self.for_cells(*rect, |cell| {
                        cell.set_char(' ').set_bg(bg);
                    });
                }
                RenderCommand::StrokeRect { rect, color, .. } => {
                    let fg = term_color(token_color(*color, self.dark));
                    self.for_cells(*rect, |cell| {
                        cell.set_fg(fg).set_style(
                            Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
                        );
                    });
                }
                RenderCommand::DrawText {
                    position,
                    text,
                    color,
                    align,
                    ..
                } => self.text(position.x, position.y, text, *color, *align),
                RenderCommand::DrawLine { from, to, color, .. } => {
                    let fg = term_color(token_color(*color, self.dark));
                    let vertical = (from.x - to.x).abs() < f64::EPSILON;
                    let rect = Rect::new(
                        from.x.min(to.x),
                        from.y.min(to.y),
                        (to.x - from.x).abs().max(1.0),
                        (to.y - from.y).abs().max(1.0),
                    );
                    let glyph = if vertical { '│' } else { '─' };
                    // Lines only show through empty cells.
                    self.for_cells(rect, |cell| {
                        if cell.symbol() == " " {
                            cell.set_char(glyph).set_fg(fg);
                        }
                    });
                }
                RenderCommand::SetClip { rect } => self.clip = Some(*rect),
                RenderCommand::ClearClip => self.clip = None,
                RenderCommand::BeginGroup { .. } | RenderCommand::EndGroup => {}
            }
        }
    }

    fn text(&mut self, x: f64, y: f64, text: &str, color: ThemeToken, align: TextAlign) {
        let width = text.chars().count() as f64 * CELL_WIDTH;
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let row = (y / CELL_HEIGHT).floor();
        if row < 0.0 || row >= f64::from(self.area.height) {
            return;
        }
        let fg = term_color(token_color(color, self.dark));
        for (i, ch) in text.chars().enumerate() {
            let cell_x = left + i as f64 * CELL_WIDTH;
            let probe = Rect::new(cell_x, row * CELL_HEIGHT, CELL_WIDTH, CELL_HEIGHT);
            if self.clipped(probe).is_none() {
                continue;
            }
            let col = (cell_x / CELL_WIDTH).round();
            if col < 0.0 || col >= f64::from(self.area.width) {
                continue;
            }
            let pos = (self.area.x + col as u16, self.area.y + row as u16);
            self.buf[pos].set_char(ch).set_fg(fg);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flame_canvas_protocol::Point;

    fn buffer() -> (Buffer, Area) {
        let area = Area::new(0, 0, 10, 3);
        (Buffer::empty(area), area)
    }

    #[test]
    fn one_row_per_bar() {
        let (mut buf, area) = buffer();
        let mut painter = CellPainter::new(&mut buf, area, true);
        painter.paint(&[RenderCommand::DrawRect {
            rect: Rect::new(16.0, 20.0, 24.0, 19.0),
            fill: Fill::Color(Color::from_rgb8(200, 0, 0)),
            frame_id: Some(0),
        }]);
        assert_eq!(buf[(2, 1)].bg, TermColor::Rgb(200, 0, 0));
        assert_eq!(buf[(4, 1)].bg, TermColor::Rgb(200, 0, 0));
        assert_ne!(buf[(5, 1)].bg, TermColor::Rgb(200, 0, 0));
        assert_ne!(buf[(2, 2)].bg, TermColor::Rgb(200, 0, 0));
    }

    #[test]
    fn slivers_take_one_cell() {
        assert_eq!(cells(300.0, 302.0, CELL_WIDTH, 100), (38, 39));
        assert_eq!(cells(5.0, 5.0, CELL_WIDTH, 100), (1, 1));
    }

    #[test]
    fn text_respects_clip() {
        let (mut buf, area) = buffer();
        let mut painter = CellPainter::new(&mut buf, area, true);
        painter.paint(&[
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 0.0, 24.0, 60.0),
            },
            RenderCommand::DrawText {
                position: Point::new(0.0, 30.0),
                text: "render".into(),
                color: ThemeToken::FrameText,
                font_size: 11.0,
                align: TextAlign::Left,
            },
        ]);
        assert_eq!(buf[(0, 1)].symbol(), "r");
        assert_eq!(buf[(2, 1)].symbol(), "n");
        assert_eq!(buf[(3, 1)].symbol(), " ");
    }

    #[test]
    fn measures_in_cells() {
        assert!((CellMetrics.measure("abc…", 11.0) - 32.0).abs() < 1e-9);
    }
}
