use std::collections::{BTreeSet, HashMap};

use flame_canvas_protocol::Color;
use serde::{Deserialize, Serialize};

use crate::model::{Flamegraph, Frame, FrameId, FrameKey};
use crate::theme::FlamegraphTheme;

/// How frames are bucketed into colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorCoding {
    /// One color per distinct symbol name.
    #[default]
    BySymbolName,
    /// Two colors: application code vs. system code.
    BySystemVsApplication,
    /// One color per package / library.
    ByLibrary,
}

enum Bucket<'a> {
    Named(&'a str),
    Application,
    System,
    Unknown,
}

impl ColorCoding {
    fn bucket(self, frame: &Frame) -> Bucket<'_> {
        match self {
            ColorCoding::BySymbolName => Bucket::Named(frame.name.as_str()),
            ColorCoding::BySystemVsApplication if frame.is_application => Bucket::Application,
            ColorCoding::BySystemVsApplication => Bucket::System,
            ColorCoding::ByLibrary => match frame.package.as_deref() {
                Some(package) if !package.is_empty() => Bucket::Named(package),
                _ => Bucket::Unknown,
            },
        }
    }
}

/// Frame key → color, computed once per flamegraph and coding.
#[derive(Debug, Clone)]
pub struct ColorMap {
    coding: ColorCoding,
    colors: HashMap<FrameKey, Color>,
    fallback: Color,
}

impl ColorMap {
    pub fn build(coding: ColorCoding, flamegraph: &Flamegraph, theme: &FlamegraphTheme) -> Self {
        let palette = &theme.colors;

        let named: BTreeSet<&str> = flamegraph
            .frames()
            .iter()
            .filter_map(|f| match coding.bucket(&f.frame) {
                Bucket::Named(name) => Some(name),
                _ => None,
            })
            .collect();
        let count = named.len().max(1) as f64;
        let spectrum: HashMap<&str, Color> = named
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let hue = palette.spectrum_hue_offset + 360.0 * i as f64 / count;
                let color =
                    Color::from_hsl(hue, palette.spectrum_saturation, palette.spectrum_lightness);
                (name, color)
            })
            .collect();

        let mut colors = HashMap::new();
        for node in flamegraph.frames() {
            let color = match coding.bucket(&node.frame) {
                Bucket::Named(name) => spectrum.get(name).copied().unwrap_or(palette.fallback),
                Bucket::Application => palette.application_frame,
                Bucket::System => palette.system_frame,
                Bucket::Unknown => palette.fallback,
            };
            colors.insert(node.frame.key, color);
        }

        log::debug!(
            "built {:?} color map with {} entries",
            coding,
            colors.len()
        );

        Self {
            coding,
            colors,
            fallback: palette.fallback,
        }
    }

    pub fn coding(&self) -> ColorCoding {
        self.coding
    }

    pub fn color_for(&self, frame: &Frame) -> Color {
        self.colors.get(&frame.key).copied().unwrap_or(self.fallback)
    }
}

/// Flags, per node, whether its symbol already occurs on the path from the
/// root down to its parent.
pub fn recursive_frames(flamegraph: &Flamegraph) -> Vec<bool> {
    let frames = flamegraph.frames();
    let mut flags = vec![false; frames.len()];
    let mut on_stack: HashMap<FrameKey, u32> = HashMap::new();
    let mut stack: Vec<(FrameId, bool)> =
        flamegraph.roots().iter().rev().map(|id| (*id, false)).collect();

    while let Some((id, leaving)) = stack.pop() {
        let node = &frames[id.index()];
        let key = node.frame.key;
        if leaving {
            if let Some(count) = on_stack.get_mut(&key) {
                *count = count.saturating_sub(1);
            }
            continue;
        }
        flags[id.index()] = on_stack.get(&key).is_some_and(|c| *c > 0);
        *on_stack.entry(key).or_default() += 1;
        stack.push((id, true));
        stack.extend(node.children.iter().rev().map(|child| (*child, false)));
    }
    flags
}
