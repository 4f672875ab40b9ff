//! # resvisit
//!
//! **Composable visitor pipelines for loading resource descriptors.**
//!
//! `resvisit` loads structured documents from files, standard input, HTTP
//! endpoints, generator tools and in-memory lists, decodes them into
//! [`Item`]s, and drives a caller-supplied operation over every item through a
//! chain of combinators that decide how errors are handled.
//!
//! Where the data comes from, what is done to each item, and how failures
//! are reported are three independent choices:
//!
//! ```text
//! Source → Decoder → base Visitor → combinators → your operation
//! ```
//!
//! ---
//!
//! ## Core Model
//!
//! Everything is a [`Visitor`]: a value with one method,
//! `visit(&mut dyn VisitFn<T>)`. Sources are visitors; combinators are
//! visitors wrapping other visitors. The operation receives
//! `Result<&mut Item<T>, Error>` so it sees decode failures and other upstream
//! errors in line with the items.
//!
//! Visiting is sequential: each `visit` awaits the visitors it wraps in
//! order, on the caller's task, and the operation is never called
//! concurrently.
//!
//! ---
//!
//! ## Example
//!
//! ```no_run
//! use resvisit::prelude::*;
//! use serde_json::Value;
//!
//! #[tokio::main]
//! async fn main() -> resvisit::error::Result<()> {
//!     let visitor = Loader::new(JsonDecoder::<Value>::new())
//!         .path("manifests/")
//!         .url("https://example.com/extra.json")
//!         .recursive(true)
//!         .filter(|item| Ok(item.payload.get("kind").is_some()))
//!         .continue_on_error(true)
//!         .build()?;
//!
//!     let mut op = from_fn(|visited: Visited<'_, Value>| {
//!         let item = visited?;
//!         println!("{} -> {}", item.source, item.payload["kind"]);
//!         Ok(())
//!     });
//!     visitor.visit(&mut op).await
//! }
//! ```
//!
//! ---
//!
//! ## Combinators
//!
//! | Visitor | On failure |
//! |---|---|
//! | [`VisitorList`] | stops at the first failing child, returns its error unchanged |
//! | [`EagerVisitorList`] | visits every child, returns all failures |
//! | [`ContinueOnErrorVisitor`] | records every failure, keeps going, returns all failures |
//! | [`DecoratedVisitor`] | first failing decorator skips the operation for that item |
//! | [`FilteredVisitor`] | rejected items are dropped silently; predicate errors propagate |
//! | [`FlattenListVisitor`] | transparent; container items are split into members |
//!
//! "All failures" is always reported through [`Error::aggregate`]: nothing
//! for zero, the error itself for one, [`Error::Aggregate`] for more.
//! [`Error::errors`] enumerates them either way.
//!
//! ---
//!
//! ## Remote sources
//!
//! [`UrlVisitor`] retries fetches according to a [`RetryPolicy`]. Only
//! transport failures and 5xx responses are retried; client errors and
//! malformed URLs fail at once, and when attempts run out the last error is
//! returned. Decoding is never retried.
//!
//! ---
//!
//! ## Cancellation
//!
//! There is no cancellation channel inside the pipeline. Wrap the operation
//! in [`Cancellable`] and cancel its [`CancelToken`] from elsewhere; the next
//! item fails with [`Error::Cancelled`].
//!
//! ---
//!
//! ## Observability
//!
//! With the default `tracing` feature, `resvisit` emits events such as
//! `resvisit.source.open`, `resvisit.decode.failed`,
//! `resvisit.retry.attempt_failed`, `resvisit.retry.sleep`,
//! `resvisit.retry.exhausted`, `resvisit.generator.failed`,
//! `resvisit.filter.dropped`, `resvisit.path.skipped` and
//! `resvisit.cancelled`.
//!
//! ```ignore
//! use tracing_subscriber::fmt;
//!
//! fn main() {
//!     fmt()
//!         .with_target(false)
//!         .with_env_filter("resvisit=debug")
//!         .init();
//! }
//! ```
//!
//! ---
//!
//! ## Feature Flags
//!
//! - `tracing` *(default)*: structured events via `tracing`.
//!
//! [`Item`]: item::Item
//! [`Visitor`]: pipeline::visitor::Visitor
//! [`VisitorList`]: pipeline::list::VisitorList
//! [`EagerVisitorList`]: pipeline::list::EagerVisitorList
//! [`ContinueOnErrorVisitor`]: pipeline::continue_on_error::ContinueOnErrorVisitor
//! [`DecoratedVisitor`]: pipeline::decorated::DecoratedVisitor
//! [`FilteredVisitor`]: pipeline::filtered::FilteredVisitor
//! [`FlattenListVisitor`]: pipeline::flatten::FlattenListVisitor
//! [`UrlVisitor`]: source::url::UrlVisitor
//! [`RetryPolicy`]: pipeline::retry::RetryPolicy
//! [`Cancellable`]: pipeline::cancel::Cancellable
//! [`CancelToken`]: pipeline::cancel::CancelToken
//! [`Error::aggregate`]: error::Error::aggregate
//! [`Error::errors`]: error::Error::errors
//! [`Error::Aggregate`]: error::Error::Aggregate
//! [`Error::Cancelled`]: error::Error::Cancelled

pub mod decode;
pub mod error;
pub mod item;
pub mod pipeline;
pub mod sink;
pub mod source;

pub mod prelude {
    //! Convenient imports for most `resvisit` users.

    pub use crate::decode::{Decoder, JsonDecoder, NdjsonDecoder};
    pub use crate::error::{Error, ErrorKind};
    pub use crate::item::Item;
    pub use crate::pipeline::cancel::{CancelToken, Cancellable};
    pub use crate::pipeline::continue_on_error::ContinueOnErrorVisitor;
    pub use crate::pipeline::decorated::DecoratedVisitor;
    pub use crate::pipeline::filtered::FilteredVisitor;
    pub use crate::pipeline::flatten::FlattenListVisitor;
    pub use crate::pipeline::list::{EagerVisitorList, VisitorList};
    pub use crate::pipeline::loader::Loader;
    pub use crate::pipeline::retry::RetryPolicy;
    pub use crate::pipeline::visitor::{from_fn, VisitFn, Visited, Visitor, VisitorExt};
}
