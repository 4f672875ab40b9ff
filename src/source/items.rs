use async_trait::async_trait;

use crate::error::Result;
use crate::item::Item;
use crate::pipeline::visitor::{VisitFn, Visitor};

/// In-memory source handing out clones of a fixed list of items.
#[derive(Clone, Debug)]
pub struct ItemsVisitor<T> {
    items: Vec<Item<T>>,
}

impl<T> ItemsVisitor<T> {
    pub fn new(items: Vec<Item<T>>) -> Self {
        Self { items }
    }

    /// Items for `payloads`, all labelled `source`.
    pub fn from_payloads<I>(source: &str, payloads: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::new(
            payloads
                .into_iter()
                .map(|payload| Item::new(source, payload))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<T> Visitor<T> for ItemsVisitor<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        for item in &self.items {
            let mut item = item.clone();
            op.call(Ok(&mut item)).await?;
        }
        Ok(())
    }
}
