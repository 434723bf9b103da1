use std::ops::Range;

use flame_canvas_protocol::{Mat3, Point, Rect};

use crate::model::FlamegraphFrame;

/// Config space ↔ physical space algebra for one flamegraph panel.
///
/// Config space is the profile's own coordinate system (x = time or
/// weight, y = depth row). Physical space is the canvas backing store in
/// device pixels. The visible window onto config space is `config_view`;
/// it is mapped onto the *content* area of the canvas, i.e. everything
/// below the timeline strip.
///
/// Every renderer of a panel reads its transform from the same
/// `FlamegraphView`, so labels, borders and frames can never drift apart.
#[derive(Debug, Clone)]
pub struct FlamegraphView {
    config_space: Rect,
    config_view: Rect,
    physical_space: Rect,
    content_space: Rect,
    dpr: f64,
    inverted: bool,
    /// Logical pixels per depth row.
    bar_height: f64,
    /// Logical pixels reserved at the top of the canvas (timeline).
    top_inset: f64,
    min_view_width: f64,
    config_to_physical: Mat3,
    physical_to_config: Mat3,
}

impl FlamegraphView {
    pub fn new(
        config_space: Rect,
        min_view_width: f64,
        inverted: bool,
        bar_height: f64,
        top_inset: f64,
    ) -> Self {
        Self {
            config_space,
            config_view: config_space,
            physical_space: Rect::EMPTY,
            content_space: Rect::EMPTY,
            dpr: 1.0,
            inverted,
            bar_height: if bar_height > 0.0 { bar_height } else { 1.0 },
            top_inset: top_inset.max(0.0),
            min_view_width: if min_view_width.is_finite() {
                min_view_width.max(0.0)
            } else {
                0.0
            },
            config_to_physical: Mat3::IDENTITY,
            physical_to_config: Mat3::IDENTITY,
        }
    }

    pub fn config_space(&self) -> Rect {
        self.config_space
    }

    pub fn config_view(&self) -> Rect {
        self.config_view
    }

    pub fn physical_space(&self) -> Rect {
        self.physical_space
    }

    /// Physical area frames are drawn into (below the timeline strip).
    pub fn content_space(&self) -> Rect {
        self.content_space
    }

    pub fn device_pixel_ratio(&self) -> f64 {
        self.dpr
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// Whether a valid physical space has been observed yet.
    pub fn is_ready(&self) -> bool {
        !self.content_space.is_empty() && !self.config_view.is_empty()
    }

    pub fn config_view_to_physical_space(&self) -> Mat3 {
        self.config_to_physical
    }

    pub fn physical_space_to_config_view(&self) -> Mat3 {
        self.physical_to_config
    }

    pub fn config_to_physical(&self, p: Point) -> Point {
        self.config_to_physical.transform_point(p)
    }

    pub fn physical_to_config(&self, p: Point) -> Point {
        self.physical_to_config.transform_point(p)
    }

    pub fn config_rect_to_physical(&self, r: &Rect) -> Rect {
        self.config_to_physical.transform_rect(r)
    }

    /// Depth rows intersecting the current view.
    pub fn visible_rows(&self, depth_count: usize) -> Range<usize> {
        let first = self.config_view.top().floor().max(0.0) as usize;
        let last = self.config_view.bottom().ceil().max(0.0) as usize;
        first.min(depth_count)..last.min(depth_count)
    }

    /// Adopt a new canvas size. Empty or non-finite sizes are ignored and
    /// the previous transform is kept; returns whether anything changed.
    pub fn resize(&mut self, physical: Rect, dpr: f64) -> bool {
        if physical.is_empty() || !(dpr.is_finite() && dpr > 0.0) {
            log::debug!("ignoring degenerate physical space {physical:?} @ {dpr}x");
            return false;
        }
        let inset = self.top_inset * dpr;
        let content = Rect::new(physical.x, physical.y + inset, physical.w, physical.h - inset);
        if content.is_empty() {
            log::debug!("canvas too short for content area: {physical:?}");
            return false;
        }

        let previous = (
            self.physical_space,
            self.content_space,
            self.dpr,
            self.config_view,
        );
        self.physical_space = physical;
        self.content_space = content;
        self.dpr = dpr;

        let rows = content.h / (self.bar_height * dpr);
        let view = self.clamp(self.config_view.with_height(rows));
        if !self.apply(view) {
            (
                self.physical_space,
                self.content_space,
                self.dpr,
                self.config_view,
            ) = previous;
            return false;
        }
        true
    }

    /// Replace the view, clamped to the data extent. The view height is
    /// owned by the canvas size and is never taken from `rect` once the
    /// canvas has been sized.
    pub fn set_config_view(&mut self, rect: Rect) -> bool {
        if !rect.is_finite() {
            log::warn!("rejecting non-finite config view {rect:?}");
            return false;
        }
        let rect = if self.content_space.is_empty() {
            rect
        } else {
            rect.with_height(self.config_view.h)
        };
        let view = self.clamp(rect);
        self.apply(view)
    }

    /// Map the current view through `m` (pan / zoom gesture), then clamp.
    pub fn transform_config_view(&mut self, m: &Mat3) -> bool {
        if !m.is_finite() {
            return false;
        }
        let next = m.transform_rect(&self.config_view);
        self.set_config_view(next)
    }

    pub fn reset_zoom(&mut self) -> bool {
        let view = Rect::new(0.0, 0.0, self.config_space.w, self.config_view.h);
        self.set_config_view(view)
    }

    /// Fit the frame's span horizontally and scroll so its row is visible.
    pub fn zoom_into_frame(&mut self, frame: &FlamegraphFrame) -> bool {
        let width = frame.duration().max(self.min_view_width);
        let x = frame.start - (width - frame.duration()) / 2.0;
        let depth = f64::from(frame.depth);
        let mut y = self.config_view.y;
        if depth < y || depth + 1.0 > y + self.config_view.h {
            y = depth + 0.5 - self.config_view.h / 2.0;
        }
        self.set_config_view(Rect::new(x, y, width, self.config_view.h))
    }

    fn clamp(&self, rect: Rect) -> Rect {
        let space = self.config_space;
        let min_w = self.min_view_width.min(space.w);
        let w = clamp_between(rect.w, min_w, space.w);
        let x = clamp_between(rect.x, 0.0, (space.w - w).max(0.0));
        let y = clamp_between(rect.y, 0.0, (space.h - rect.h).max(0.0));
        Rect::new(x, y, w, rect.h)
    }

    /// Store `view` and derive both transforms. Leaves everything
    /// untouched when the view cannot be mapped (zero area).
    fn apply(&mut self, view: Rect) -> bool {
        if self.content_space.is_empty() {
            self.config_view = view;
            return true;
        }
        let Some(base) = Mat3::between_rects(&view, &self.content_space) else {
            return false;
        };
        let to_physical = if self.inverted {
            let c = self.content_space;
            Mat3::from_translation(0.0, 2.0 * c.y + c.h) * Mat3::from_scaling(1.0, -1.0) * base
        } else {
            base
        };
        let Some(to_config) = to_physical.invert() else {
            return false;
        };
        self.config_view = view;
        self.config_to_physical = to_physical;
        self.physical_to_config = to_config;
        true
    }
}

fn clamp_between(v: f64, lo: f64, hi: f64) -> f64 {
    v.max(lo).min(hi)
}
