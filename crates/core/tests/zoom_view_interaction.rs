//! Pointer, wheel and resize scenarios driven through `FlamegraphZoomView`.

mod common;

use std::cell::RefCell;
use std::rc::Rc;

use common::{approx, at, overlay, panel};
use flame_canvas_core::scheduler::EventHandler;
use flame_canvas_core::{
    EventKind, FlamegraphEvent, FlamegraphFrame, InteractionState, LogicalSize, Modifiers,
    WheelEvent,
};
use flame_canvas_protocol::{Fill, Point, Rect, RenderCommand, ThemeToken};

fn record_zooms(view: &flame_canvas_core::FlamegraphZoomView) -> Rc<RefCell<Vec<FlamegraphFrame>>> {
    let zooms = Rc::new(RefCell::new(Vec::new()));
    let handler: EventHandler = {
        let zooms = Rc::clone(&zooms);
        Rc::new(move |event: &FlamegraphEvent| {
            if let FlamegraphEvent::ZoomIntoFrame(frame) = event {
                zooms.borrow_mut().push(frame.clone());
            }
        })
    };
    view.scheduler().on(EventKind::ZoomIntoFrame, handler);
    zooms
}

fn selected_name(view: &flame_canvas_core::FlamegraphZoomView) -> Option<String> {
    view.selected_node().map(|f| f.name().to_string())
}

#[test]
fn clicking_the_selected_frame_zooms_into_it() {
    let view = panel(None);
    let zooms = record_zooms(&view);
    let layout = at(20.0, 2);
    let tokenize = at(5.0, 2);

    view.on_canvas_click(layout);
    assert_eq!(selected_name(&view).as_deref(), Some("layout"));
    assert!(zooms.borrow().is_empty());

    // A different frame only moves the selection.
    view.on_canvas_click(tokenize);
    assert_eq!(selected_name(&view).as_deref(), Some("tokenize"));
    assert!(zooms.borrow().is_empty());

    view.on_canvas_click(layout);
    assert!(zooms.borrow().is_empty());

    // Second click on the same node confirms.
    view.on_canvas_click(layout);
    assert_eq!(zooms.borrow().len(), 1);
    let zoomed = zooms.borrow()[0].clone();
    assert_eq!(zoomed.name().as_str(), "layout");
    assert!(approx(zoomed.start, 10.0) && approx(zoomed.end, 30.0));
    assert_eq!(zoomed.depth, 2);

    let config_view = view.config_view().expect("renderer exists");
    assert!(approx(config_view.x, 10.0) && approx(config_view.w, 20.0));
    assert_eq!(selected_name(&view).as_deref(), Some("layout"));
}

#[test]
fn clicking_empty_space_clears_the_selection() {
    let view = panel(None);
    view.on_canvas_click(at(20.0, 1));
    assert!(view.selected_node().is_some());
    // Row 3 does not exist.
    view.on_canvas_click(at(20.0, 3));
    assert!(view.selected_node().is_none());
}

#[test]
fn press_and_release_without_movement_is_a_click() {
    let view = panel(None);
    let point = at(5.0, 1);
    view.on_canvas_mouse_down(point, Modifiers::NONE);
    assert_eq!(view.interaction_state(), InteractionState::DraggingPan);
    view.on_canvas_mouse_up(point);
    assert_eq!(selected_name(&view).as_deref(), Some("parse"));
    assert_eq!(view.interaction_state(), InteractionState::Hovering);
}

#[test]
fn hover_tracks_the_pointer() {
    let view = panel(None);
    view.on_canvas_mouse_move(at(15.0, 1));
    assert_eq!(view.interaction_state(), InteractionState::Hovering);
    assert_eq!(
        view.hovered_node().map(|f| f.name().to_string()).as_deref(),
        Some("render")
    );
    let cursor = view.config_space_cursor().expect("cursor inside the canvas");
    assert!(approx(cursor.x, 15.0) && approx(cursor.y, 1.5));

    view.on_canvas_mouse_leave();
    assert_eq!(view.interaction_state(), InteractionState::Idle);
    assert!(view.hovered_node().is_none());
    assert!(view.config_space_cursor().is_none());
}

#[test]
fn drag_pans_the_view() {
    let view = panel(None);
    view.set_config_view(Rect::new(10.0, 0.0, 20.0, 0.0));
    let start = Point::new(200.0, 70.0);
    view.on_canvas_mouse_down(start, Modifiers::NONE);
    // Dragging content left reveals what lies to the right.
    view.on_canvas_mouse_move(Point::new(100.0, 70.0));
    assert_eq!(view.interaction_state(), InteractionState::DraggingPan);
    view.on_canvas_mouse_up(Point::new(100.0, 70.0));

    let config_view = view.config_view().expect("renderer exists");
    assert!(approx(config_view.x, 15.0), "{config_view:?}");
    assert!(approx(config_view.w, 20.0));
    // A drag is not a click.
    assert!(view.selected_node().is_none());
}

#[test]
fn meta_wheel_zooms_about_the_cursor() {
    let view = panel(None);
    let outcome = view.on_wheel(WheelEvent {
        point: at(20.0, 0),
        delta_x: 0.0,
        delta_y: -50.0,
        modifiers: Modifiers::META,
    });
    assert!(outcome.prevent_default);
    assert!(outcome.handled);
    // The anchor at 20 stays put while the width shrinks by e^(-0.25).
    let scale = (-0.25f64).exp();
    let config_view = view.config_view().expect("renderer exists");
    assert!(approx(config_view.w, 40.0 * scale), "{config_view:?}");
    assert!(approx(config_view.x, 20.0 - 20.0 * scale), "{config_view:?}");
}

#[test]
fn full_wheel_notches_keep_zooming() {
    let mut last_width = f64::INFINITY;
    for delta_y in [-50.0, -99.0, -100.0, -120.0, -1_000.0] {
        let view = panel(None);
        let before = view.config_view().expect("renderer exists");
        let outcome = view.on_wheel(WheelEvent {
            point: at(20.0, 0),
            delta_x: 0.0,
            delta_y,
            modifiers: Modifiers::META,
        });
        assert!(outcome.handled, "delta_y={delta_y}");
        let after = view.config_view().expect("renderer exists");
        assert!(after.w < before.w, "delta_y={delta_y} {after:?}");
        assert!(after.w > 0.0);
        // Larger notches zoom further, never less.
        assert!(after.w <= last_width, "delta_y={delta_y} {after:?}");
        last_width = after.w;
    }
}

#[test]
fn opposite_wheel_notches_cancel() {
    let view = panel(None);
    let wheel = |delta_y| {
        view.on_wheel(WheelEvent {
            point: at(20.0, 0),
            delta_x: 0.0,
            delta_y,
            modifiers: Modifiers::META,
        })
    };
    wheel(-120.0);
    assert!(view.config_view().expect("renderer exists").w < 40.0);
    wheel(120.0);
    let config_view = view.config_view().expect("renderer exists");
    assert!(approx(config_view.w, 40.0), "{config_view:?}");
    assert!(approx(config_view.x, 0.0), "{config_view:?}");
}

#[test]
fn plain_wheel_pans() {
    let view = panel(None);
    view.set_config_view(Rect::new(10.0, 0.0, 20.0, 0.0));
    let outcome = view.on_wheel(WheelEvent {
        point: at(20.0, 0),
        delta_x: 100.0,
        delta_y: 0.0,
        modifiers: Modifiers::NONE,
    });
    assert!(outcome.prevent_default);
    let config_view = view.config_view().expect("renderer exists");
    assert!(approx(config_view.x, 15.0), "{config_view:?}");
}

#[test]
fn wheel_gestures_never_leave_the_profile() {
    let view = panel(None);
    let mut seed = 0x2545_f491_4f6c_dd1d_u64;
    let mut next = move || {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        (seed % 10_000) as f64 / 10_000.0
    };
    for _ in 0..300 {
        let zoom = next() < 0.5;
        view.on_wheel(WheelEvent {
            point: Point::new(next() * 400.0, 20.0 + next() * 100.0),
            delta_x: (next() - 0.5) * 2_000.0,
            delta_y: (next() - 0.5) * 600.0,
            modifiers: if zoom { Modifiers::META } else { Modifiers::NONE },
        });
        let config_view = view.config_view().expect("renderer exists");
        assert!(config_view.left() >= 0.0, "{config_view:?}");
        assert!(config_view.right() <= 40.0 + 1e-6, "{config_view:?}");
        assert!(config_view.w > 0.0);
    }
}

#[test]
fn meta_drag_selects_a_range_to_zoom_into() {
    let view = panel(None);
    view.on_canvas_mouse_down(Point::new(100.0, 70.0), Modifiers::META);
    assert_eq!(view.interaction_state(), InteractionState::DraggingSelect);
    view.on_canvas_mouse_move(Point::new(300.0, 70.0));
    view.scheduler().tick();
    let band = overlay(&view).into_iter().any(|c| {
        matches!(
            c,
            RenderCommand::DrawRect { fill: Fill::Token(ThemeToken::SelectionRangeFill), .. }
        )
    });
    assert!(band, "selection band is drawn while dragging");

    view.on_canvas_mouse_up(Point::new(300.0, 70.0));
    let config_view = view.config_view().expect("renderer exists");
    assert!(approx(config_view.x, 10.0) && approx(config_view.w, 20.0), "{config_view:?}");
    assert_eq!(view.interaction_state(), InteractionState::Hovering);
}

#[test]
fn resize_redraws_synchronously_once_per_change() {
    let view = panel(None);
    let frames = view.scheduler().frames_drawn();
    assert!(view.on_resize(LogicalSize::new(800.0, 120.0)));
    assert_eq!(view.scheduler().frames_drawn(), frames + 1);
    assert!(!view.scheduler().has_pending_frame());
    assert!(!view.on_resize(LogicalSize::new(800.0, 120.0)));
    assert_eq!(view.scheduler().frames_drawn(), frames + 1);

    let (primary, _) = view.canvases().expect("mounted");
    assert!(approx(primary.physical_space().w, 800.0));
}

#[test]
fn zero_size_resize_keeps_the_last_view() {
    let view = panel(None);
    view.set_config_view(Rect::new(5.0, 0.0, 10.0, 0.0));
    let before = view.config_view();
    view.on_resize(LogicalSize::new(0.0, 0.0));
    assert_eq!(view.config_view(), before);
    view.on_canvas_mouse_move(at(1.0, 0));
    view.scheduler().tick();
}

#[test]
fn handlers_draw_only_on_the_next_tick() {
    let view = panel(None);
    view.reset_zoom();
    view.reset_zoom();
    assert!(view.scheduler().has_pending_frame());
    let frames = view.scheduler().frames_drawn();
    assert!(view.scheduler().tick());
    assert!(!view.scheduler().tick());
    assert_eq!(view.scheduler().frames_drawn(), frames + 1);
}

#[test]
fn unmounted_panel_ignores_input() {
    let view = panel(None);
    let layers = view.unmount().expect("was mounted");
    assert!(approx(layers.primary.logical_size().width, 400.0));
    assert!(view.canvases().is_none());
    view.on_canvas_click(at(20.0, 1));
    view.on_canvas_mouse_move(at(20.0, 1));
    view.on_wheel(WheelEvent {
        point: at(20.0, 1),
        delta_x: 10.0,
        delta_y: 10.0,
        modifiers: Modifiers::NONE,
    });
    view.scheduler().tick();
    assert!(view.selected_node().is_none());
    assert!(view.config_view().is_none());
}
