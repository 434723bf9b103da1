//! What ends up on the canvases for a known flamegraph.

mod common;

use std::sync::Arc;

use common::{HEIGHT, WIDTH, approx, at, overlay, panel, pipeline, primary};
use flame_canvas_core::renderers::{FlamegraphRenderer, GridRenderer, TextRenderer};
use flame_canvas_core::{
    Canvas, Flamegraph, FlamegraphTheme, LogicalSize, MonospaceMetrics, RendererOptions,
    SearchResults,
};
use flame_canvas_protocol::{Fill, Rect, RenderCommand, ThemeToken};

fn renderer(width: f64) -> FlamegraphRenderer {
    FlamegraphRenderer::try_new(
        Some(Canvas::new(width, HEIGHT, 1.0)),
        pipeline(),
        FlamegraphTheme::dark(),
        RendererOptions::default(),
    )
    .expect("canvas supplied")
}

fn labels(commands: &[RenderCommand]) -> Vec<(f64, String)> {
    commands
        .iter()
        .filter_map(|c| match c {
            RenderCommand::DrawText { position, text, color, .. }
                if matches!(color, ThemeToken::FrameText | ThemeToken::FrameTextMuted) =>
            {
                Some((position.x, text.to_string()))
            }
            _ => None,
        })
        .collect()
}

#[test]
fn narrow_frames_get_no_label() {
    let renderer = renderer(WIDTH);
    let mut overlay = Canvas::new(WIDTH, HEIGHT, 1.0);
    TextRenderer::default().draw(&mut overlay, &renderer, None);
    let labels = labels(overlay.commands());

    let names: Vec<&str> = labels.iter().map(|(_, t)| t.as_str()).collect();
    assert!(names.contains(&"main"));
    assert!(names.contains(&"layout"));
    // HashMap::insert spans x = 300..302 px: far below "MM…".
    assert!(
        labels.iter().all(|(x, _)| !(299.0..=303.0).contains(x)),
        "{labels:?}"
    );
    assert!(labels.iter().all(|(_, t)| !t.contains("HashMap")));
}

#[test]
fn short_names_on_narrow_frames_stay_unlabeled() {
    // 10 px per unit: `a` is 16 px wide, `b` 34 px.
    let flamegraph = Flamegraph::from_json(
        br#"{
            "unit": "Milliseconds",
            "frames": [
                {"key": 1, "name": "main"},
                {"key": 2, "name": "a"},
                {"key": 3, "name": "b"}
            ],
            "nodes": [
                {"frame": 1, "start": 0, "end": 40},
                {"frame": 2, "start": 0, "end": 1.6, "parent": 0},
                {"frame": 3, "start": 1.6, "end": 5, "parent": 0}
            ]
        }"#,
    )
    .expect("valid flamegraph");
    let renderer = FlamegraphRenderer::try_new(
        Some(Canvas::new(WIDTH, HEIGHT, 1.0)),
        Arc::new(flamegraph),
        FlamegraphTheme::dark(),
        RendererOptions::default(),
    )
    .expect("canvas supplied");
    let mut overlay = Canvas::new(WIDTH, HEIGHT, 1.0);
    TextRenderer::default().draw(&mut overlay, &renderer, None);
    let names: Vec<String> = labels(overlay.commands()).into_iter().map(|(_, t)| t).collect();

    // "a" itself would fit in the 8 px between the paddings, but the frame
    // is narrower than "MM…" (19.8 px at 11 px).
    assert!(!names.iter().any(|t| t == "a"), "{names:?}");
    assert!(names.iter().any(|t| t == "b"), "{names:?}");
    assert!(names.iter().any(|t| t == "main"), "{names:?}");
}

#[test]
fn zooming_in_reveals_the_narrow_label_trimmed_in_the_middle() {
    let mut renderer = renderer(WIDTH);
    renderer.set_config_view(Rect::new(29.9, 0.0, 0.4, 0.0));
    let mut overlay = Canvas::new(WIDTH, HEIGHT, 1.0);
    // 0.2 units over 400 px / 0.4 units = 200 px; the full name needs ~290 px.
    TextRenderer::new(Box::new(MonospaceMetrics::default())).draw(&mut overlay, &renderer, None);
    let labels = labels(overlay.commands());
    let insert = labels
        .iter()
        .find(|(_, t)| t.starts_with("std::"))
        .expect("label is drawn once the frame is wide enough");
    assert!(insert.1.contains('…'), "{insert:?}");
    assert!(insert.1.ends_with("insert"), "{insert:?}");
}

#[test]
fn dimmed_labels_use_the_muted_token() {
    let renderer = renderer(WIDTH);
    let mut overlay = Canvas::new(WIDTH, HEIGHT, 1.0);
    let only_root = SearchResults::from_ids([flame_canvas_core::FrameId(0)]);
    TextRenderer::default().draw(&mut overlay, &renderer, Some(&only_root));
    for command in overlay.commands() {
        if let RenderCommand::DrawText { text, color, .. } = command {
            let expected = if text.as_str() == "main" {
                ThemeToken::FrameText
            } else {
                ThemeToken::FrameTextMuted
            };
            assert_eq!(*color, expected, "{text}");
        }
    }
}

#[test]
fn grid_labels_follow_the_value_unit() {
    let renderer = renderer(WIDTH);
    let mut overlay = Canvas::new(WIDTH, HEIGHT, 1.0);
    GridRenderer::new().draw(&mut overlay, &renderer);
    let ticks: Vec<String> = overlay
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::DrawText { text, color: ThemeToken::TimelineLabel, .. } => {
                Some(text.to_string())
            }
            _ => None,
        })
        .collect();
    // 80 px at 0.1 ms/px → 8 ms, rounded up to 10 ms.
    assert_eq!(ticks, ["0ms", "10.0ms", "20.0ms", "30.0ms", "40.0ms"]);

    let gridlines = overlay
        .commands()
        .iter()
        .filter(|c| matches!(c, RenderCommand::DrawLine { color: ThemeToken::GridLine, .. }))
        .count();
    assert_eq!(gridlines, ticks.len());
}

#[test]
fn tick_spacing_respects_the_pixel_budget_when_zoomed() {
    let mut renderer = renderer(WIDTH);
    renderer.set_config_view(Rect::new(12.0, 0.0, 3.0, 0.0));
    let mut overlay = Canvas::new(WIDTH, HEIGHT, 1.0);
    GridRenderer::new().draw(&mut overlay, &renderer);
    let xs: Vec<f64> = overlay
        .commands()
        .iter()
        .filter_map(|c| match c {
            RenderCommand::DrawLine { from, color: ThemeToken::GridLine, .. } => Some(from.x),
            _ => None,
        })
        .collect();
    assert!(xs.len() >= 2, "{xs:?}");
    for pair in xs.windows(2) {
        assert!(pair[1] - pair[0] >= 80.0 - 1e-6, "{xs:?}");
    }
}

#[test]
fn resize_with_same_dimensions_is_bit_identical() {
    let mut renderer = renderer(WIDTH);
    renderer.set_config_view(Rect::new(3.3, 0.0, 7.7, 0.0));
    renderer
        .canvas_mut()
        .set_logical_size(LogicalSize::new(333.0, 97.0));
    renderer.on_resize_update_space();
    let first = renderer.view().config_view_to_physical_space();
    renderer.on_resize_update_space();
    assert_eq!(renderer.view().config_view_to_physical_space(), first);
}

#[test]
fn selected_border_is_drawn_before_hovered_border() {
    let view = panel(None);
    view.on_canvas_click(at(20.0, 2));
    view.on_canvas_mouse_move(at(5.0, 1));
    view.scheduler().tick();
    let borders: Vec<ThemeToken> = overlay(&view)
        .into_iter()
        .filter_map(|c| match c {
            RenderCommand::StrokeRect { color, .. }
                if matches!(
                    color,
                    ThemeToken::SelectedFrameBorder | ThemeToken::HoveredFrameBorder
                ) =>
            {
                Some(color)
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        borders,
        [ThemeToken::SelectedFrameBorder, ThemeToken::HoveredFrameBorder]
    );

    // Hovering the selected frame draws a single border.
    view.on_canvas_mouse_move(at(20.0, 2));
    view.scheduler().tick();
    let count = overlay(&view)
        .iter()
        .filter(|c| matches!(c, RenderCommand::StrokeRect { .. }))
        .count();
    assert_eq!(count, 1);
}

#[test]
fn labels_and_frames_share_one_transform() {
    let view = panel(None);
    view.set_config_view(Rect::new(7.0, 0.0, 19.0, 0.0));
    view.scheduler().tick();

    let frames: Vec<Rect> = primary(&view)
        .into_iter()
        .filter_map(|c| match c {
            RenderCommand::DrawRect { rect, frame_id: Some(_), .. } => Some(rect),
            _ => None,
        })
        .collect();
    let texts = labels(&overlay(&view));
    assert!(!texts.is_empty());
    for (x, text) in texts {
        let padding = FlamegraphTheme::dark().sizes.bar_padding;
        // Every label starts one padding inside the visible part of a frame.
        assert!(
            frames
                .iter()
                .any(|r| approx(r.left().max(0.0) + padding, x)),
            "{text} at {x}"
        );
    }
}

#[test]
fn highlight_dims_everything_else() {
    let view = panel(None);
    view.on_canvas_click(at(15.0, 1));
    view.highlight_selected();
    view.scheduler().tick();
    let alpha = FlamegraphTheme::dark().colors.dimmed_alpha;
    for command in primary(&view) {
        if let RenderCommand::DrawRect { fill: Fill::Color(color), frame_id: Some(id), .. } = command {
            if id == 2 {
                assert!(approx(f64::from(color.a), 1.0));
            } else {
                assert!(approx(f64::from(color.a), f64::from(alpha)), "frame {id}");
            }
        }
    }
}
