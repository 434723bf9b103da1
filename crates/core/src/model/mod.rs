mod flamegraph;
mod frame;
mod unit;

pub use flamegraph::{Flamegraph, FlamegraphData, ModelError, NodeData};
pub use frame::{FlamegraphFrame, Frame, FrameId, FrameKey};
pub use unit::ValueUnit;
