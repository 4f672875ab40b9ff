//! Ready-made terminal operations.

mod collect;
mod debug;

pub use collect::{collect, collect_all};
pub use debug::DebugOp;
