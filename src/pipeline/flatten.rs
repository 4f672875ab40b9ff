use async_trait::async_trait;

use crate::error::Result;
use crate::item::Item;
use crate::pipeline::visitor::{VisitFn, Visited, Visitor};

/// Splits a container payload into its members.
///
/// Returns `Ok(None)` for payloads that are not containers.
pub type ExtractFn<T> = Box<dyn Fn(&T) -> Result<Option<Vec<T>>> + Send + Sync>;

/// Delivers the members of container items instead of the containers.
///
/// Nested containers are expanded depth-first, so members arrive in the
/// order they appear. Each member inherits the container's `source` and
/// `line`. Non-container items and upstream errors pass through unchanged.
pub struct FlattenListVisitor<V, T> {
    visitor: V,
    extract: ExtractFn<T>,
}

impl<V, T> FlattenListVisitor<V, T> {
    pub fn new(visitor: V, extract: ExtractFn<T>) -> Self {
        Self { visitor, extract }
    }
}

#[async_trait]
impl<T, V> Visitor<T> for FlattenListVisitor<V, T>
where
    T: Send + 'static,
    V: Visitor<T>,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let mut flatten = Flatten {
            extract: &self.extract,
            inner: op,
        };
        self.visitor.visit(&mut flatten).await
    }
}

struct Flatten<'a, T> {
    extract: &'a ExtractFn<T>,
    inner: &'a mut dyn VisitFn<T>,
}

#[async_trait]
impl<T> VisitFn<T> for Flatten<'_, T>
where
    T: Send + 'static,
{
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()> {
        let item = match visited {
            Ok(item) => item,
            Err(err) => return self.inner.call(Err(err)).await,
        };

        let Some(members) = (self.extract)(&item.payload)? else {
            return self.inner.call(Ok(item)).await;
        };

        for payload in expand(self.extract, members)? {
            let mut member: Item<T> = item.derive(payload);
            self.inner.call(Ok(&mut member)).await?;
        }
        Ok(())
    }
}

fn expand<T>(extract: &ExtractFn<T>, members: Vec<T>) -> Result<Vec<T>> {
    let mut out = Vec::with_capacity(members.len());
    let mut pending = vec![members.into_iter()];

    while let Some(level) = pending.last_mut() {
        let Some(member) = level.next() else {
            pending.pop();
            continue;
        };
        match extract(&member)? {
            Some(nested) => pending.push(nested.into_iter()),
            None => out.push(member),
        }
    }

    Ok(out)
}
