//! Public value types exposed by the `trajchain` crate.

pub mod frame;
pub mod options;
pub mod segment;

pub use frame::Frame;
pub use options::{ChainOptions, ChainOptionsBuilder};
pub use segment::{SegmentMeta, SegmentSource};
