use async_trait::async_trait;

use crate::error::Result;
use crate::item::Item;
use crate::pipeline::visitor::{VisitFn, Visited, Visitor};

/// Predicate deciding whether an item reaches the operation.
pub type FilterFn<T> = Box<dyn Fn(&Item<T>) -> Result<bool> + Send + Sync>;

/// Drops items rejected by any of its predicates.
///
/// Predicates run in order and the first one to reject or fail decides. A
/// rejected item is skipped without error; a failing predicate's error is
/// returned for that item.
pub struct FilteredVisitor<V, T> {
    visitor: V,
    filters: Vec<FilterFn<T>>,
}

impl<V, T> FilteredVisitor<V, T> {
    pub fn new<I>(visitor: V, filters: I) -> Self
    where
        I: IntoIterator<Item = FilterFn<T>>,
    {
        Self {
            visitor,
            filters: filters.into_iter().collect(),
        }
    }

    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Item<T>) -> Result<bool> + Send + Sync + 'static,
    {
        self.filters.push(Box::new(filter));
        self
    }
}

#[async_trait]
impl<T, V> Visitor<T> for FilteredVisitor<V, T>
where
    T: Send + 'static,
    V: Visitor<T>,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let mut filtered = Filtered {
            filters: &self.filters,
            inner: op,
        };
        self.visitor.visit(&mut filtered).await
    }
}

struct Filtered<'a, T> {
    filters: &'a [FilterFn<T>],
    inner: &'a mut dyn VisitFn<T>,
}

#[async_trait]
impl<T> VisitFn<T> for Filtered<'_, T>
where
    T: Send + 'static,
{
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()> {
        let item = match visited {
            Ok(item) => item,
            Err(err) => return self.inner.call(Err(err)).await,
        };

        for filter in self.filters {
            if !filter(&*item)? {
                #[cfg(feature = "tracing")]
                tracing::event!(
                    tracing::Level::TRACE,
                    event = "resvisit.filter.dropped",
                    source = %item.source,
                    "resvisit.filter.dropped"
                );
                return Ok(());
            }
        }
        self.inner.call(Ok(item)).await
    }
}
