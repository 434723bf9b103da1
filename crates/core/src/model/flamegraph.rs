use std::collections::HashMap;
use std::sync::Arc;

use flame_canvas_protocol::Rect;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::frame::{FlamegraphFrame, Frame, FrameId, FrameKey};
use super::unit::ValueUnit;

/// Tolerance for "child lies within parent" / "siblings don't overlap".
const BOUNDS_EPSILON: f64 = 1e-9;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("duplicate frame key {0}")]
    DuplicateFrameKey(u64),
    #[error("node {node} references unknown frame key {key}")]
    UnknownFrameKey { node: usize, key: u64 },
    #[error("node {node} references parent {parent}, which is not an earlier node")]
    InvalidParent { node: usize, parent: usize },
    #[error("node {node} has invalid bounds [{start}, {end})")]
    InvalidBounds { node: usize, start: f64, end: f64 },
    #[error("node {node} extends outside its parent {parent}")]
    OutsideParent { node: usize, parent: usize },
    #[error("nodes {a} and {b} overlap at depth {depth}")]
    OverlappingSiblings { a: usize, b: usize, depth: u32 },
    #[error("too many nodes ({0})")]
    TooManyNodes(usize),
}

/// Serialized form of a flamegraph: symbol table plus positioned nodes.
///
/// Nodes reference their parent by index; a parent must appear before its
/// children. Depth is derived from the parent chain.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlamegraphData {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub unit: ValueUnit,
    #[serde(default)]
    pub inverted: bool,
    /// Total config-space width. Defaults to the furthest node end.
    #[serde(default)]
    pub total_width: Option<f64>,
    pub frames: Vec<Frame>,
    pub nodes: Vec<NodeData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeData {
    pub frame: FrameKey,
    pub start: f64,
    pub end: f64,
    #[serde(default)]
    pub parent: Option<usize>,
}

/// The positioned frame tree of one profile.
///
/// Built once from validated input and never mutated afterwards; the
/// rendering core only reads it.
#[derive(Debug, Clone)]
pub struct Flamegraph {
    name: Option<String>,
    unit: ValueUnit,
    inverted: bool,
    frames: Vec<FlamegraphFrame>,
    roots: Vec<FrameId>,
    /// Node ids per depth row, sorted by start. This is the hit-test index.
    rows: Vec<Vec<FrameId>>,
    config_space: Rect,
}

impl Flamegraph {
    /// A flamegraph with no frames. Its config space is empty, so nothing
    /// is ever drawn for it.
    pub fn empty(unit: ValueUnit) -> Self {
        Self {
            name: None,
            unit,
            inverted: false,
            frames: Vec::new(),
            roots: Vec::new(),
            rows: Vec::new(),
            config_space: Rect::EMPTY,
        }
    }

    pub fn from_json(data: &[u8]) -> Result<Self, ModelError> {
        let data: FlamegraphData = serde_json::from_slice(data)?;
        Self::from_data(data)
    }

    /// Validate and index serialized flamegraph data.
    pub fn from_data(data: FlamegraphData) -> Result<Self, ModelError> {
        if data.nodes.len() > u32::MAX as usize {
            return Err(ModelError::TooManyNodes(data.nodes.len()));
        }

        let mut symbols: HashMap<FrameKey, Arc<Frame>> = HashMap::with_capacity(data.frames.len());
        for frame in data.frames {
            let key = frame.key;
            if symbols.insert(key, Arc::new(frame)).is_some() {
                return Err(ModelError::DuplicateFrameKey(key.0));
            }
        }

        let mut frames: Vec<FlamegraphFrame> = Vec::with_capacity(data.nodes.len());
        let mut roots = Vec::new();
        for (index, node) in data.nodes.iter().enumerate() {
            let frame = symbols
                .get(&node.frame)
                .cloned()
                .ok_or(ModelError::UnknownFrameKey {
                    node: index,
                    key: node.frame.0,
                })?;

            if !node.start.is_finite()
                || !node.end.is_finite()
                || node.start < 0.0
                || node.end < node.start
            {
                return Err(ModelError::InvalidBounds {
                    node: index,
                    start: node.start,
                    end: node.end,
                });
            }

            let id = FrameId(index as u32);
            let depth = match node.parent {
                Some(parent) => {
                    let Some(parent_frame) = frames.get_mut(parent) else {
                        return Err(ModelError::InvalidParent {
                            node: index,
                            parent,
                        });
                    };
                    if node.start < parent_frame.start - BOUNDS_EPSILON
                        || node.end > parent_frame.end + BOUNDS_EPSILON
                    {
                        return Err(ModelError::OutsideParent {
                            node: index,
                            parent,
                        });
                    }
                    parent_frame.children.push(id);
                    parent_frame.depth + 1
                }
                None => {
                    roots.push(id);
                    0
                }
            };

            frames.push(FlamegraphFrame {
                id,
                frame,
                start: node.start,
                end: node.end,
                depth,
                parent: node.parent.map(|p| FrameId(p as u32)),
                children: Vec::new(),
            });
        }

        let max_depth = frames.iter().map(|f| f.depth).max();
        let mut rows: Vec<Vec<FrameId>> =
            vec![Vec::new(); max_depth.map_or(0, |d| d as usize + 1)];
        for frame in &frames {
            rows[frame.depth as usize].push(frame.id);
        }
        for (depth, row) in rows.iter_mut().enumerate() {
            row.sort_by(|a, b| frames[a.index()].start.total_cmp(&frames[b.index()].start));
            // Siblings share a row, and so do cousins: the tree invariant
            // means no two nodes in one row may overlap.
            for pair in row.windows(2) {
                let (a, b) = (&frames[pair[0].index()], &frames[pair[1].index()]);
                if a.end > b.start + BOUNDS_EPSILON {
                    return Err(ModelError::OverlappingSiblings {
                        a: a.id.index(),
                        b: b.id.index(),
                        depth: depth as u32,
                    });
                }
            }
        }

        let furthest = frames.iter().map(|f| f.end).fold(0.0_f64, f64::max);
        let width = data.total_width.unwrap_or(furthest).max(furthest);
        let config_space = Rect::new(0.0, 0.0, width, rows.len() as f64);

        Ok(Self {
            name: data.name,
            unit: data.unit,
            inverted: data.inverted,
            frames,
            roots,
            rows,
            config_space,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn unit(&self) -> ValueUnit {
        self.unit
    }

    pub fn inverted(&self) -> bool {
        self.inverted
    }

    /// Full data extent: x = 0..total width, y = 0..number of depth rows.
    pub fn config_space(&self) -> Rect {
        self.config_space
    }

    pub fn frames(&self) -> &[FlamegraphFrame] {
        &self.frames
    }

    pub fn frame(&self, id: FrameId) -> Option<&FlamegraphFrame> {
        self.frames.get(id.index())
    }

    pub fn roots(&self) -> &[FrameId] {
        &self.roots
    }

    /// Number of depth rows.
    pub fn depth(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames_at_depth(&self, depth: usize) -> &[FrameId] {
        self.rows.get(depth).map_or(&[], Vec::as_slice)
    }

    /// The node at `depth` whose `[start, end]` contains `x`, edges
    /// inclusive. Adjacent siblings share an edge; the right one wins.
    pub fn frame_at(&self, depth: usize, x: f64) -> Option<&FlamegraphFrame> {
        let row = self.frames_at_depth(depth);
        let idx = row.partition_point(|id| self.frames[id.index()].start <= x);
        let candidate = &self.frames[row.get(idx.checked_sub(1)?)?.index()];
        (candidate.end >= x).then_some(candidate)
    }

    /// Node ids in `depth` whose span overlaps `[start, end]`.
    pub fn frames_in_range(&self, depth: usize, start: f64, end: f64) -> &[FrameId] {
        let row = self.frames_at_depth(depth);
        let first = row.partition_point(|id| self.frames[id.index()].end < start);
        let last = row.partition_point(|id| self.frames[id.index()].start <= end);
        if first >= last { &[] } else { &row[first..last] }
    }

    /// All nodes for one symbol.
    pub fn frames_by_key(&self, key: FrameKey) -> impl Iterator<Item = &FlamegraphFrame> {
        self.frames.iter().filter(move |f| f.frame.key == key)
    }

    /// Parent, grandparent, … up to the root.
    pub fn ancestors(&self, id: FrameId) -> impl Iterator<Item = &FlamegraphFrame> {
        std::iter::successors(
            self.frame(id).and_then(|f| f.parent).and_then(|p| self.frame(p)),
            |f| f.parent.and_then(|p| self.frame(p)),
        )
    }

    /// Shortest non-zero node duration; bounds how far the view can zoom.
    pub fn min_frame_duration(&self) -> f64 {
        self.frames
            .iter()
            .map(FlamegraphFrame::duration)
            .filter(|d| *d > 0.0)
            .fold(f64::INFINITY, f64::min)
            .min(self.config_space.w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(frame: u64, start: f64, end: f64, parent: Option<usize>) -> NodeData {
        NodeData {
            frame: FrameKey(frame),
            start,
            end,
            parent,
        }
    }

    fn data(nodes: Vec<NodeData>) -> FlamegraphData {
        FlamegraphData {
            name: Some("test".into()),
            unit: ValueUnit::Milliseconds,
            inverted: false,
            total_width: None,
            frames: vec![
                Frame::new(1, "root"),
                Frame::new(2, "a"),
                Frame::new(3, "b"),
            ],
            nodes,
        }
    }

    fn sample() -> Flamegraph {
        Flamegraph::from_data(data(vec![
            node(1, 0.0, 20.0, None),
            node(2, 0.0, 10.0, Some(0)),
            node(3, 10.0, 20.0, Some(0)),
        ]))
        .unwrap_or_else(|_| Flamegraph::empty(ValueUnit::Milliseconds))
    }

    #[test]
    fn derives_depth_and_config_space() {
        let fg = sample();
        assert_eq!(fg.frames().len(), 3);
        assert_eq!(fg.depth(), 2);
        assert_eq!(fg.config_space(), Rect::new(0.0, 0.0, 20.0, 2.0));
        assert_eq!(fg.frames()[2].depth, 1);
        assert_eq!(fg.frames()[0].children, vec![FrameId(1), FrameId(2)]);
        assert_eq!(fg.roots(), &[FrameId(0)]);
    }

    #[test]
    fn frame_at_row() {
        let fg = sample();
        assert_eq!(fg.frame_at(1, 5.0).map(|f| f.id), Some(FrameId(1)));
        assert_eq!(fg.frame_at(1, 15.0).map(|f| f.id), Some(FrameId(2)));
        assert_eq!(fg.frame_at(1, 0.0).map(|f| f.id), Some(FrameId(1)));
        assert_eq!(fg.frame_at(1, 20.0).map(|f| f.id), Some(FrameId(2)));
        assert!(fg.frame_at(1, 25.0).is_none());
        assert!(fg.frame_at(1, -1.0).is_none());
        assert!(fg.frame_at(7, 5.0).is_none());
    }

    #[test]
    fn range_query() {
        let fg = sample();
        assert_eq!(fg.frames_in_range(1, 9.0, 11.0).len(), 2);
        assert_eq!(fg.frames_in_range(1, 12.0, 30.0), &[FrameId(2)]);
        assert!(fg.frames_in_range(1, 21.0, 30.0).is_empty());
    }

    #[test]
    fn ancestors_walk_to_root() {
        let fg = sample();
        let names: Vec<_> = fg.ancestors(FrameId(2)).map(|f| f.name().as_str()).collect();
        assert_eq!(names, vec!["root"]);
        assert_eq!(fg.ancestors(FrameId(0)).count(), 0);
    }

    #[test]
    fn rejects_child_outside_parent() {
        let err = Flamegraph::from_data(data(vec![
            node(1, 0.0, 10.0, None),
            node(2, 5.0, 12.0, Some(0)),
        ]));
        assert!(matches!(err, Err(ModelError::OutsideParent { node: 1, parent: 0 })));
    }

    #[test]
    fn rejects_overlapping_siblings() {
        let err = Flamegraph::from_data(data(vec![
            node(1, 0.0, 20.0, None),
            node(2, 0.0, 12.0, Some(0)),
            node(3, 10.0, 20.0, Some(0)),
        ]));
        assert!(matches!(err, Err(ModelError::OverlappingSiblings { depth: 1, .. })));
    }

    #[test]
    fn rejects_forward_parent_and_unknown_key() {
        let err = Flamegraph::from_data(data(vec![node(2, 0.0, 1.0, Some(3))]));
        assert!(matches!(err, Err(ModelError::InvalidParent { .. })));
        let err = Flamegraph::from_data(data(vec![node(99, 0.0, 1.0, None)]));
        assert!(matches!(err, Err(ModelError::UnknownFrameKey { key: 99, .. })));
    }

    #[test]
    fn rejects_nan_bounds() {
        let err = Flamegraph::from_data(data(vec![node(1, f64::NAN, 1.0, None)]));
        assert!(matches!(err, Err(ModelError::InvalidBounds { .. })));
    }

    #[test]
    fn parses_json() {
        let json = br#"{
            "unit": "Samples",
            "frames": [{ "key": 1, "name": "main", "is_application": true }],
            "nodes": [{ "frame": 1, "start": 0, "end": 5 }]
        }"#;
        let fg = Flamegraph::from_json(json);
        assert!(fg.is_ok());
        let fg = fg.unwrap_or_else(|_| Flamegraph::empty(ValueUnit::Weight));
        assert_eq!(fg.unit(), ValueUnit::Samples);
        assert!(fg.frames()[0].frame.is_application);
        assert!((fg.min_frame_duration() - 5.0).abs() < f64::EPSILON);
    }
}
