use flame_canvas_protocol::{Point, Rect, SharedStr, TextAlign, ThemeToken};

use crate::canvas::Canvas;
use crate::renderers::FlamegraphRenderer;

/// Upper bound on ticks per frame; guards against pathological views.
const MAX_TICKS: usize = 1_000;

/// Timeline strip with value labels, plus vertical gridlines through the
/// content area.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridRenderer;

impl GridRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, canvas: &mut Canvas, renderer: &FlamegraphRenderer) {
        let view = renderer.view();
        if !view.is_ready() {
            return;
        }
        let sizes = &renderer.theme().sizes;
        let dpr = view.device_pixel_ratio();
        let physical = view.physical_space();
        let content = view.content_space();
        let config_view = view.config_view();

        let strip = Rect::new(physical.x, physical.y, physical.w, content.top() - physical.y);
        canvas.begin_group("grid");
        if !strip.is_empty() {
            canvas.fill_rect(strip, ThemeToken::TimelineBackground, None);
            canvas.line(
                Point::new(strip.left(), strip.bottom()),
                Point::new(strip.right(), strip.bottom()),
                ThemeToken::TimelineBorder,
                sizes.grid_line_width * dpr,
            );
        }

        let units_per_px = config_view.w / content.w;
        let Some(interval) = tick_interval(sizes.min_tick_spacing * dpr * units_per_px) else {
            log::warn!("no tick interval for view {config_view:?}");
            canvas.end_group();
            return;
        };

        let unit = renderer.flamegraph().unit();
        let font_size = sizes.timeline_font_size * dpr;
        let label_padding = sizes.timeline_label_padding * dpr;
        let first = (config_view.left() / interval).ceil() as i64;
        for i in 0..MAX_TICKS as i64 {
            let value = (first + i) as f64 * interval;
            if value > config_view.right() {
                break;
            }
            let x = view
                .config_to_physical(Point::new(value, config_view.y))
                .x;
            canvas.line(
                Point::new(x, content.top()),
                Point::new(x, content.bottom()),
                ThemeToken::GridLine,
                sizes.grid_line_width * dpr,
            );
            if !strip.is_empty() {
                canvas.fill_text(
                    Point::new(x + label_padding, strip.center_y()),
                    SharedStr::from(unit.format_value(value)),
                    ThemeToken::TimelineLabel,
                    font_size,
                    TextAlign::Left,
                );
            }
        }
        canvas.end_group();
    }
}

/// Smallest 1, 2 or 5 × 10ᵏ that is at least `min_interval`.
pub fn tick_interval(min_interval: f64) -> Option<f64> {
    if !(min_interval.is_finite() && min_interval > 0.0) {
        return None;
    }
    let magnitude = 10f64.powf(min_interval.log10().floor());
    [1.0, 2.0, 5.0, 10.0]
        .into_iter()
        .map(|step| step * magnitude)
        .find(|interval| *interval >= min_interval * (1.0 - 1e-9))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_one_two_five_steps() {
        let close = |a: Option<f64>, b: f64| a.is_some_and(|a| (a - b).abs() < 1e-9 * b);
        assert!(close(tick_interval(0.7), 1.0));
        assert!(close(tick_interval(1.0), 1.0));
        assert!(close(tick_interval(1.3), 2.0));
        assert!(close(tick_interval(3.0), 5.0));
        assert!(close(tick_interval(7.5), 10.0));
        assert!(close(tick_interval(420.0), 500.0));
        assert!(close(tick_interval(0.0013), 0.002));
    }

    #[test]
    fn rejects_degenerate_input() {
        assert_eq!(tick_interval(0.0), None);
        assert_eq!(tick_interval(f64::NAN), None);
        assert_eq!(tick_interval(f64::INFINITY), None);
    }
}
