use std::sync::Arc;

use flame_canvas_protocol::{Rect, SharedStr};
use serde::{Deserialize, Serialize};

/// Stable identity of a symbol across flamegraphs (same function → same key).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameKey(pub u64);

/// Position of a node inside one flamegraph's frame list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u32);

impl FrameId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A symbol: one function/stack entry, independent of where it appears in
/// the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub key: FrameKey,
    pub name: SharedStr,
    /// Application code (as opposed to system/library code).
    #[serde(default)]
    pub is_application: bool,
    /// Library / package / image the symbol belongs to.
    #[serde(default)]
    pub package: Option<SharedStr>,
    #[serde(default)]
    pub file: Option<SharedStr>,
    #[serde(default)]
    pub self_weight: f64,
    #[serde(default)]
    pub total_weight: f64,
    #[serde(default)]
    pub aggregate_duration: f64,
}

impl Frame {
    pub fn new(key: u64, name: impl Into<SharedStr>) -> Self {
        Self {
            key: FrameKey(key),
            name: name.into(),
            is_application: false,
            package: None,
            file: None,
            self_weight: 0.0,
            total_weight: 0.0,
            aggregate_duration: 0.0,
        }
    }
}

/// A positioned node of the flamegraph tree, in config space.
#[derive(Debug, Clone, PartialEq)]
pub struct FlamegraphFrame {
    pub id: FrameId,
    pub frame: Arc<Frame>,
    pub start: f64,
    pub end: f64,
    /// Stack level, 0 = root.
    pub depth: u32,
    pub parent: Option<FrameId>,
    pub children: Vec<FrameId>,
}

impl FlamegraphFrame {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn key(&self) -> FrameKey {
        self.frame.key
    }

    pub fn name(&self) -> &SharedStr {
        &self.frame.name
    }

    /// The node's cell in config space: one unit tall, at its depth row.
    pub fn config_rect(&self) -> Rect {
        Rect::new(self.start, f64::from(self.depth), self.duration(), 1.0)
    }

    /// Same node of the same flamegraph (position and symbol both match).
    pub fn is_same_node(&self, other: &FlamegraphFrame) -> bool {
        self.id == other.id && self.frame.key == other.frame.key
    }
}
