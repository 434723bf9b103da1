mod flamegraph;
mod grid;
mod selected_frame;
mod selection;
mod text;

pub use flamegraph::FlamegraphRenderer;
pub use grid::{GridRenderer, tick_interval};
pub use selected_frame::SelectedFrameRenderer;
pub use selection::SelectionRenderer;
pub use text::{ELLIPSIS, TextRenderer, trim_text_center};
