//! Standalone SVG from recorded canvas commands.

use flame_canvas_protocol::{Color, Fill, RenderCommand, TextAlign};

use super::token_color;

/// Render one or more command layers (bottom first) as an SVG document.
///
/// Coordinates are taken as-is, so `width`/`height` should be the canvas
/// physical size. `dark` picks the token palette and the background.
pub fn render_svg(layers: &[&[RenderCommand]], width: f64, height: f64, dark: bool) -> String {
    let count: usize = layers.iter().map(|l| l.len()).sum();
    let mut svg = String::with_capacity(count * 120 + 256);
    svg.push_str(&format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {width} {height}" width="{width}" height="{height}" style="font-family:ui-monospace,monospace">"#,
    ));
    svg.push_str(&format!(
        r#"<rect width="{width}" height="{height}" fill="{}"/>"#,
        token_color(flame_canvas_protocol::ThemeToken::Background, dark).to_hex(),
    ));

    let mut clip_id = 0usize;
    for commands in layers {
        // Open `<g>` elements, closed again at the end of each layer.
        let mut open = 0usize;
        for cmd in commands.iter() {
            match cmd {
                RenderCommand::Clear => {}
                RenderCommand::DrawRect { rect, fill, .. } => {
                    let (fill, opacity) = paint(resolve(*fill, dark));
                    svg.push_str(&format!(
                        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}"{opacity}/>"#,
                        rect.x, rect.y, rect.w, rect.h,
                    ));
                }
                RenderCommand::StrokeRect { rect, color, width } => {
                    let (stroke, opacity) = paint(token_color(*color, dark));
                    svg.push_str(&format!(
                        r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{stroke}" stroke-width="{width}"{}/>"#,
                        rect.x,
                        rect.y,
                        rect.w,
                        rect.h,
                        opacity.replace("fill-opacity", "stroke-opacity"),
                    ));
                }
                RenderCommand::DrawText {
                    position,
                    text,
                    color,
                    font_size,
                    align,
                } => {
                    let anchor = match align {
                        TextAlign::Left => "start",
                        TextAlign::Center => "middle",
                        TextAlign::Right => "end",
                    };
                    svg.push_str(&format!(
                        r#"<text x="{}" y="{}" fill="{}" font-size="{font_size}" text-anchor="{anchor}" dominant-baseline="central">{}</text>"#,
                        position.x,
                        position.y,
                        token_color(*color, dark).to_hex(),
                        escape_xml(text),
                    ));
                }
                RenderCommand::DrawLine {
                    from,
                    to,
                    color,
                    width: line_width,
                } => {
                    svg.push_str(&format!(
                        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{line_width}"/>"#,
                        from.x,
                        from.y,
                        to.x,
                        to.y,
                        token_color(*color, dark).to_hex(),
                    ));
                }
                RenderCommand::SetClip { rect } => {
                    clip_id += 1;
                    svg.push_str(&format!(
                        r#"<clipPath id="clip{clip_id}"><rect x="{}" y="{}" width="{}" height="{}"/></clipPath><g clip-path="url(#clip{clip_id})">"#,
                        rect.x, rect.y, rect.w, rect.h,
                    ));
                    open += 1;
                }
                RenderCommand::BeginGroup { id } => {
                    svg.push_str(&format!(r#"<g data-group="{}">"#, escape_xml(id)));
                    open += 1;
                }
                RenderCommand::ClearClip | RenderCommand::EndGroup => {
                    if open > 0 {
                        svg.push_str("</g>");
                        open -= 1;
                    }
                }
            }
        }
        for _ in 0..open {
            svg.push_str("</g>");
        }
    }

    svg.push_str("</svg>");
    svg
}

fn resolve(fill: Fill, dark: bool) -> Color {
    match fill {
        Fill::Token(token) => token_color(token, dark),
        Fill::Color(color) => color,
    }
}

/// Hex color plus an opacity attribute when not fully opaque.
fn paint(color: Color) -> (String, String) {
    let opacity = if color.a < 1.0 {
        format!(r#" fill-opacity="{:.3}""#, color.a)
    } else {
        String::new()
    };
    (color.to_hex(), opacity)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flame_canvas_protocol::{Point, Rect, ThemeToken};

    #[test]
    fn frames_and_labels() {
        let commands = vec![
            RenderCommand::Clear,
            RenderCommand::DrawRect {
                rect: Rect::new(10.0, 20.0, 100.0, 18.0),
                fill: Fill::Color(Color::from_rgb8(0xf4, 0x43, 0x36)),
                frame_id: Some(1),
            },
            RenderCommand::DrawText {
                position: Point::new(12.0, 29.0),
                text: "main".into(),
                color: ThemeToken::FrameText,
                font_size: 11.0,
                align: TextAlign::Left,
            },
        ];
        let svg = render_svg(&[commands.as_slice()], 800.0, 400.0, true);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("main"));
        assert!(svg.contains("#f44336"));
    }

    #[test]
    fn dimmed_frames_keep_their_opacity() {
        let commands = vec![RenderCommand::DrawRect {
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
            fill: Fill::Color(Color::WHITE.with_alpha(0.25)),
            frame_id: None,
        }];
        let svg = render_svg(&[commands.as_slice()], 10.0, 10.0, false);
        assert!(svg.contains(r#"fill-opacity="0.250""#));
    }

    #[test]
    fn escapes_xml_entities() {
        let commands = vec![RenderCommand::DrawText {
            position: Point::new(0.0, 0.0),
            text: "fn<T>(&self)".into(),
            color: ThemeToken::FrameText,
            font_size: 11.0,
            align: TextAlign::Left,
        }];
        let svg = render_svg(&[commands.as_slice()], 400.0, 100.0, false);
        assert!(svg.contains("fn&lt;T&gt;(&amp;self)"));
    }

    #[test]
    fn strokes_lines_and_clips_are_emitted() {
        let commands = vec![
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 20.0, 200.0, 80.0),
            },
            RenderCommand::StrokeRect {
                rect: Rect::new(10.0, 20.0, 50.0, 20.0),
                color: ThemeToken::SelectedFrameBorder,
                width: 2.0,
            },
            RenderCommand::DrawLine {
                from: Point::new(100.0, 0.0),
                to: Point::new(100.0, 100.0),
                color: ThemeToken::GridLine,
                width: 1.0,
            },
            RenderCommand::ClearClip,
        ];
        let svg = render_svg(&[commands.as_slice()], 200.0, 100.0, true);
        assert!(svg.contains(r#"<clipPath id="clip1"><rect x="0" y="20" width="200" height="80"/>"#));
        assert!(svg.contains(r#"fill="none" stroke=""#));
        assert!(svg.contains(r#"stroke-width="2""#));
        assert!(svg.contains(r#"<line x1="100" y1="0" x2="100" y2="100""#));
        assert_eq!(svg.matches("<g").count(), svg.matches("</g>").count());
    }

    #[test]
    fn unbalanced_groups_are_closed() {
        let commands = vec![
            RenderCommand::SetClip {
                rect: Rect::new(0.0, 0.0, 5.0, 5.0),
            },
            RenderCommand::BeginGroup { id: "labels".into() },
        ];
        let svg = render_svg(&[commands.as_slice()], 5.0, 5.0, true);
        assert_eq!(svg.matches("<g").count(), svg.matches("</g>").count());
    }
}
