use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::pipeline::continue_on_error::ErrorCollector;
use crate::pipeline::visitor::{BoxVisitor, VisitFn, Visitor};

/// Visits each child in order and stops at the first failure.
///
/// The failing child's error is returned unchanged; later children are not
/// visited.
pub struct VisitorList<T> {
    visitors: Vec<BoxVisitor<T>>,
}

impl<T> VisitorList<T> {
    pub fn new(visitors: Vec<BoxVisitor<T>>) -> Self {
        Self { visitors }
    }

    pub fn push(&mut self, visitor: BoxVisitor<T>) {
        self.visitors.push(visitor);
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl<T> FromIterator<BoxVisitor<T>> for VisitorList<T> {
    fn from_iter<I: IntoIterator<Item = BoxVisitor<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl<T> Visitor<T> for VisitorList<T>
where
    T: Send + 'static,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        for visitor in &self.visitors {
            visitor.visit(&mut *op).await?;
        }
        Ok(())
    }
}

/// Visits every child even when some of them fail.
///
/// Each child runs to completion with an operation that records failures
/// instead of returning them. Everything recorded is returned at the end
/// through [`Error::aggregate`].
pub struct EagerVisitorList<T> {
    visitors: Vec<BoxVisitor<T>>,
}

impl<T> EagerVisitorList<T> {
    pub fn new(visitors: Vec<BoxVisitor<T>>) -> Self {
        Self { visitors }
    }

    pub fn push(&mut self, visitor: BoxVisitor<T>) {
        self.visitors.push(visitor);
    }

    pub fn len(&self) -> usize {
        self.visitors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visitors.is_empty()
    }
}

impl<T> FromIterator<BoxVisitor<T>> for EagerVisitorList<T> {
    fn from_iter<I: IntoIterator<Item = BoxVisitor<T>>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[async_trait]
impl<T> Visitor<T> for EagerVisitorList<T>
where
    T: Send + 'static,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let mut errors = Vec::new();

        for visitor in &self.visitors {
            let result = {
                let mut collector = ErrorCollector::new(&mut *op, &mut errors);
                visitor.visit(&mut collector).await
            };
            if let Err(err) = result {
                errors.push(err);
            }
        }

        match Error::aggregate(errors) {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}
