use async_trait::async_trait;

use crate::error::Result;
use crate::item::Item;
use crate::pipeline::visitor::{VisitFn, Visited, Visitor};

/// Extra per-item step run ahead of the caller's operation.
pub type DecoratorFn<T> = Box<dyn Fn(&mut Item<T>) -> Result<()> + Send + Sync>;

/// Runs a fixed sequence of decorators on every item before the operation.
///
/// The first decorator to fail ends processing of that item: the remaining
/// decorators and the operation are skipped and the error is returned to the
/// wrapped visitor, whose own policy decides whether traversal continues.
pub struct DecoratedVisitor<V, T> {
    visitor: V,
    decorators: Vec<DecoratorFn<T>>,
}

impl<V, T> DecoratedVisitor<V, T> {
    pub fn new<I>(visitor: V, decorators: I) -> Self
    where
        I: IntoIterator<Item = DecoratorFn<T>>,
    {
        Self {
            visitor,
            decorators: decorators.into_iter().collect(),
        }
    }

    pub fn with<F>(mut self, decorator: F) -> Self
    where
        F: Fn(&mut Item<T>) -> Result<()> + Send + Sync + 'static,
    {
        self.decorators.push(Box::new(decorator));
        self
    }
}

#[async_trait]
impl<T, V> Visitor<T> for DecoratedVisitor<V, T>
where
    T: Send + 'static,
    V: Visitor<T>,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let mut decorated = Decorated {
            decorators: &self.decorators,
            inner: op,
        };
        self.visitor.visit(&mut decorated).await
    }
}

struct Decorated<'a, T> {
    decorators: &'a [DecoratorFn<T>],
    inner: &'a mut dyn VisitFn<T>,
}

#[async_trait]
impl<T> VisitFn<T> for Decorated<'_, T>
where
    T: Send + 'static,
{
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()> {
        let item = match visited {
            Ok(item) => item,
            Err(err) => return self.inner.call(Err(err)).await,
        };

        for decorator in self.decorators {
            decorator(&mut *item)?;
        }
        self.inner.call(Ok(item)).await
    }
}
