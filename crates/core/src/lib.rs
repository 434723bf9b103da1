//! Headless flamegraph rendering and interaction.
//!
//! The engine records draw commands into in-memory [`Canvas`]es; hosts
//! replay them with whatever painter they have and feed pointer, wheel
//! and resize input back as plain values.

pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod export;
pub mod model;
pub mod pool;
pub mod renderers;
pub mod resize;
pub mod scheduler;
pub mod search;
pub mod theme;
pub mod view;
pub mod zoom_view;

use std::path::Path;
use std::sync::Arc;

pub use canvas::{Canvas, CanvasLayers, LogicalSize, MonospaceMetrics, TextMetrics};
pub use color::ColorCoding;
pub use config::{ConfigError, RendererOptions, ZoomViewConfig};
pub use error::CoreError;
pub use model::{Flamegraph, FlamegraphFrame, FrameId, FrameKey, ModelError, ValueUnit};
pub use pool::CanvasPoolManager;
pub use scheduler::{CanvasScheduler, EventKind, FlamegraphEvent, FrameRequester};
pub use search::SearchResults;
pub use theme::FlamegraphTheme;
pub use view::FlamegraphView;
pub use zoom_view::{FlamegraphZoomView, InteractionState, Modifiers, WheelEvent, WheelOutcome};

/// Read and validate a flamegraph JSON file.
pub fn load_flamegraph(path: impl AsRef<Path>) -> error::Result<Arc<Flamegraph>> {
    let path = path.as_ref();
    let data = std::fs::read(path).map_err(|source| CoreError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let flamegraph = Flamegraph::from_json(&data)?;
    log::info!(
        "loaded {} ({} frames, {} rows)",
        path.display(),
        flamegraph.frames().len(),
        flamegraph.depth()
    );
    Ok(Arc::new(flamegraph))
}
