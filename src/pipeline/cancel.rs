use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::pipeline::visitor::{VisitFn, Visited};

/// Shared stop flag checked by [`Cancellable`].
#[derive(Clone, Default, Debug)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Wraps an operation so it fails with [`Error::Cancelled`] once the token
/// is cancelled.
///
/// The token is checked on every invocation, before the wrapped operation
/// runs. Fail-fast visitors stop at the first such error.
pub struct Cancellable<F> {
    op: F,
    token: CancelToken,
}

impl<F> Cancellable<F> {
    pub fn new(op: F, token: CancelToken) -> Self {
        Self { op, token }
    }

    pub fn into_inner(self) -> F {
        self.op
    }
}

#[async_trait]
impl<T, F> VisitFn<T> for Cancellable<F>
where
    T: Send + 'static,
    F: VisitFn<T>,
{
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()> {
        if self.token.is_cancelled() {
            #[cfg(feature = "tracing")]
            tracing::event!(
                tracing::Level::DEBUG,
                event = "resvisit.cancelled",
                "resvisit.cancelled"
            );
            return Err(Error::Cancelled);
        }
        self.op.call(visited).await
    }
}
