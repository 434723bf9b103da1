use std::fmt;

use flame_canvas_protocol::{Point, SharedStr, TextAlign, ThemeToken};

use crate::canvas::{Canvas, MonospaceMetrics, TextMetrics};
use crate::renderers::FlamegraphRenderer;
use crate::search::SearchResults;

pub const ELLIPSIS: &str = "…";

/// Frame labels on the overlay canvas.
pub struct TextRenderer {
    metrics: Box<dyn TextMetrics>,
}

impl TextRenderer {
    pub fn new(metrics: Box<dyn TextMetrics>) -> Self {
        Self { metrics }
    }

    pub fn set_metrics(&mut self, metrics: Box<dyn TextMetrics>) {
        self.metrics = metrics;
    }

    /// Label every visible frame wide enough for the ellipsis plus
    /// `min_label_chars` characters. Narrower frames get no text at all.
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        renderer: &FlamegraphRenderer,
        search: Option<&SearchResults>,
    ) {
        let view = renderer.view();
        if !view.is_ready() {
            return;
        }
        let sizes = &renderer.theme().sizes;
        let dpr = view.device_pixel_ratio();
        let font_size = sizes.bar_font_size * dpr;
        let padding = sizes.bar_padding * dpr;
        let content = view.content_space();

        let sample: String = std::iter::repeat_n('M', sizes.min_label_chars)
            .chain(ELLIPSIS.chars())
            .collect();
        let min_width = self.metrics.measure(&sample, font_size);

        canvas.set_clip(content);
        canvas.begin_group("labels");
        for (node, rect) in renderer.visible_frames() {
            let left = rect.left().max(content.left());
            let right = rect.right().min(content.right());
            let available = right - left - 2.0 * padding;
            // Short names do not lower the threshold.
            if available <= 0.0 || available < min_width {
                continue;
            }
            let name = node.name();
            let full = self.metrics.measure(name, font_size);
            let text = if full <= available {
                name.clone()
            } else {
                match trim_text_center(name, available, font_size, self.metrics.as_ref()) {
                    Some(trimmed) => SharedStr::from(trimmed),
                    None => continue,
                }
            };
            let color = if search.is_some_and(|s| !s.contains(node.id)) {
                ThemeToken::FrameTextMuted
            } else {
                ThemeToken::FrameText
            };
            canvas.fill_text(
                Point::new(left + padding, rect.center_y()),
                text,
                color,
                font_size,
                TextAlign::Left,
            );
        }
        canvas.end_group();
        canvas.clear_clip();
    }
}

impl Default for TextRenderer {
    fn default() -> Self {
        Self::new(Box::new(MonospaceMetrics::default()))
    }
}

impl fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextRenderer").finish_non_exhaustive()
    }
}

/// Keep the head and tail of `text`, replacing the middle with `…`, so the
/// result measures at most `max_width`. `None` if even `…` alone is too
/// wide.
pub fn trim_text_center(
    text: &str,
    max_width: f64,
    font_size: f64,
    metrics: &dyn TextMetrics,
) -> Option<String> {
    if metrics.measure(text, font_size) <= max_width {
        return Some(text.to_string());
    }
    let chars: Vec<char> = text.chars().collect();
    let build = |keep: usize| -> String {
        let head = keep.div_ceil(2);
        let tail = keep / 2;
        let mut out: String = chars[..head].iter().collect();
        out.push_str(ELLIPSIS);
        out.extend(&chars[chars.len() - tail..]);
        out
    };

    // Largest `keep` whose trimmed form fits.
    let (mut lo, mut hi) = (0usize, chars.len().saturating_sub(1));
    if metrics.measure(&build(0), font_size) > max_width {
        return None;
    }
    while lo < hi {
        let mid = (lo + hi).div_ceil(2);
        if metrics.measure(&build(mid), font_size) <= max_width {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    Some(build(lo))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_from_the_middle() {
        let m = MonospaceMetrics { advance: 1.0 };
        // 1px per char at font size 1.
        assert_eq!(trim_text_center("abcdefghij", 5.0, 1.0, &m).as_deref(), Some("ab…ij"));
        assert_eq!(trim_text_center("abcdefghij", 4.0, 1.0, &m).as_deref(), Some("ab…j"));
        assert_eq!(trim_text_center("abc", 10.0, 1.0, &m).as_deref(), Some("abc"));
        assert_eq!(trim_text_center("abc", 1.0, 1.0, &m).as_deref(), Some("…"));
        assert_eq!(trim_text_center("abc", 0.5, 1.0, &m), None);
    }

    #[test]
    fn multibyte_names_are_split_on_char_boundaries() {
        let m = MonospaceMetrics { advance: 1.0 };
        assert_eq!(trim_text_center("äöüßéè", 3.0, 1.0, &m).as_deref(), Some("ä…è"));
    }
}
