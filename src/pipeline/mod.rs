//! The visitor abstraction and the combinators built on it.

pub mod cancel;
pub mod continue_on_error;
pub mod decorated;
pub mod filtered;
pub mod flatten;
pub mod list;
pub mod loader;
pub mod retry;
pub mod visitor;
