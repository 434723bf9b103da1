//! Turning recorded canvas commands into something outside the engine.

mod palette;
pub mod svg;

pub use palette::token_color;
