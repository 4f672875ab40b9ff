use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::pipeline::visitor::{VisitFn, Visited, Visitor};

/// Keeps visiting after failures and reports them all at the end.
///
/// Errors raised upstream, errors returned by the operation, and the error
/// returned by the wrapped visitor itself are all recorded. A single recorded
/// error is returned as-is; several are returned as
/// [`Error::Aggregate`](crate::error::Error::Aggregate).
pub struct ContinueOnErrorVisitor<V> {
    visitor: V,
}

impl<V> ContinueOnErrorVisitor<V> {
    pub fn new(visitor: V) -> Self {
        Self { visitor }
    }
}

#[async_trait]
impl<T, V> Visitor<T> for ContinueOnErrorVisitor<V>
where
    T: Send + 'static,
    V: Visitor<T>,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let mut errors = Vec::new();

        let result = {
            let mut collector = ErrorCollector::new(op, &mut errors);
            self.visitor.visit(&mut collector).await
        };
        if let Err(err) = result {
            errors.push(err);
        }

        match Error::aggregate(errors) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}

/// Operation wrapper that records failures instead of returning them.
pub(crate) struct ErrorCollector<'a, T> {
    inner: &'a mut dyn VisitFn<T>,
    errors: &'a mut Vec<Error>,
}

impl<'a, T> ErrorCollector<'a, T> {
    pub(crate) fn new(inner: &'a mut dyn VisitFn<T>, errors: &'a mut Vec<Error>) -> Self {
        Self { inner, errors }
    }
}

#[async_trait]
impl<T> VisitFn<T> for ErrorCollector<'_, T>
where
    T: Send + 'static,
{
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()> {
        match visited {
            Err(err) => self.errors.push(err),
            Ok(item) => {
                if let Err(err) = self.inner.call(Ok(item)).await {
                    self.errors.push(err);
                }
            }
        }
        Ok(())
    }
}
