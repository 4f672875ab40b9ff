use crate::error::Result;
use crate::item::Item;
use crate::pipeline::visitor::{from_fn, Visited, Visitor};

/// Visit everything and keep a copy of each item.
///
/// Fails with whatever error the visitor returns; items seen before the
/// failure are dropped. Use [`collect_all`] to keep them.
pub async fn collect<T, V>(visitor: &V) -> Result<Vec<Item<T>>>
where
    T: Clone + Send + 'static,
    V: Visitor<T> + ?Sized,
{
    let (items, result) = collect_all(visitor).await;
    result.map(|()| items)
}

/// Visit everything, returning the items gathered along with the outcome.
///
/// With a continue-on-error chain this yields every good item together with
/// the aggregated failures.
pub async fn collect_all<T, V>(visitor: &V) -> (Vec<Item<T>>, Result<()>)
where
    T: Clone + Send + 'static,
    V: Visitor<T> + ?Sized,
{
    let mut items = Vec::new();
    let result = {
        let mut op = from_fn(|visited: Visited<'_, T>| {
            items.push(visited?.clone());
            Ok(())
        });
        visitor.visit(&mut op).await
    };
    (items, result)
}
