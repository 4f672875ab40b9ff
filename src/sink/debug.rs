use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::Result;
use crate::pipeline::visitor::{VisitFn, Visited};

/// Prints every item and swallows every error.
///
/// Handy at the end of a chain while wiring up sources.
#[derive(Debug, Default)]
pub struct DebugOp {
    pub seen: usize,
    pub failed: usize,
}

impl DebugOp {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl<T> VisitFn<T> for DebugOp
where
    T: Debug + Send + 'static,
{
    async fn call(&mut self, visited: Visited<'_, T>) -> Result<()> {
        match visited {
            Ok(item) => {
                self.seen += 1;
                match item.line {
                    Some(line) => println!("{}:{}: {:?}", item.source, line, item.payload),
                    None => println!("{}: {:?}", item.source, item.payload),
                }
            }
            Err(err) => {
                self.failed += 1;
                eprintln!("error: {err}");
            }
        }
        Ok(())
    }
}
