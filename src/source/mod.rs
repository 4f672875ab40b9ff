//! Base visitors, one per kind of input.

pub mod file;
pub mod generator;
pub mod items;
pub mod paths;
pub mod stream;
pub mod url;

pub use file::{FileVisitor, STDIN_LABEL, STDIN_MARKER};
pub use generator::{CommandGenerator, Generate, GeneratorVisitor};
pub use items::ItemsVisitor;
pub use paths::{expand_paths, GeneratorRule, PathOptions, DEFAULT_EXTENSIONS};
pub use stream::StreamVisitor;
pub use url::{Fetch, HttpFetcher, UrlVisitor, DEFAULT_TIMEOUT};
