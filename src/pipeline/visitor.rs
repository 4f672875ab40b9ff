use std::sync::Arc;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::item::Item;
use crate::pipeline::continue_on_error::ContinueOnErrorVisitor;
use crate::pipeline::decorated::{DecoratedVisitor, DecoratorFn};
use crate::pipeline::filtered::{FilterFn, FilteredVisitor};
use crate::pipeline::flatten::{ExtractFn, FlattenListVisitor};

/// What an operation is handed: an item, or an error raised upstream of it.
pub type Visited<'a, T> = std::result::Result<&'a mut Item<T>, Error>;

/// The per-item operation driven by a [`Visitor`].
///
/// Returning `Err` asks the enclosing visitor to stop; whether it actually
/// stops or records the error and moves on depends on the combinators in
/// between. Plain closures taking [`Visited`] implement this trait.
#[async_trait]
pub trait VisitFn<T>: Send {
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()>;
}

#[async_trait]
impl<T, F> VisitFn<T> for F
where
    T: Send + 'static,
    F: for<'a> FnMut(Visited<'a, T>) -> Result<()> + Send,
{
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()> {
        self(visited)
    }
}

/// Pin down closure argument types for use as a [`VisitFn`].
pub fn from_fn<T, F>(f: F) -> F
where
    F: for<'a> FnMut(Visited<'a, T>) -> Result<()> + Send,
{
    f
}

/// Something that drives a [`VisitFn`] over a set of items.
///
/// Items are handed to `op` one at a time, in a deterministic order, on the
/// task that called `visit`.
#[async_trait]
pub trait Visitor<T>: Send + Sync {
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()>;
}

pub type BoxVisitor<T> = Box<dyn Visitor<T>>;

#[async_trait]
impl<T, V> Visitor<T> for Box<V>
where
    T: Send + 'static,
    V: Visitor<T> + ?Sized,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        (**self).visit(op).await
    }
}

#[async_trait]
impl<T, V> Visitor<T> for Arc<V>
where
    T: Send + 'static,
    V: Visitor<T> + ?Sized,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        (**self).visit(op).await
    }
}

pub trait VisitorExt<T>: Visitor<T> + Sized
where
    T: Send + 'static,
{
    fn decorate<I>(self, decorators: I) -> DecoratedVisitor<Self, T>
    where
        I: IntoIterator<Item = DecoratorFn<T>>,
    {
        DecoratedVisitor::new(self, decorators)
    }

    fn filter<F>(self, pred: F) -> FilteredVisitor<Self, T>
    where
        F: Fn(&Item<T>) -> Result<bool> + Send + Sync + 'static,
    {
        FilteredVisitor::new(self, [Box::new(pred) as FilterFn<T>])
    }

    fn flatten<F>(self, extract: F) -> FlattenListVisitor<Self, T>
    where
        F: Fn(&T) -> Result<Option<Vec<T>>> + Send + Sync + 'static,
    {
        FlattenListVisitor::new(self, Box::new(extract) as ExtractFn<T>)
    }

    fn continue_on_error(self) -> ContinueOnErrorVisitor<Self> {
        ContinueOnErrorVisitor::new(self)
    }

    fn boxed(self) -> BoxVisitor<T>
    where
        Self: 'static,
    {
        Box::new(self)
    }
}

impl<T, V> VisitorExt<T> for V
where
    T: Send + 'static,
    V: Visitor<T> + Sized,
{
}
