pub mod commands;
pub mod matrix;
pub mod shared_str;
pub mod theme;
pub mod types;

pub use commands::{RenderCommand, TextAlign};
pub use matrix::Mat3;
pub use shared_str::SharedStr;
pub use theme::ThemeToken;
pub use types::{Color, Fill, Point, Rect};
