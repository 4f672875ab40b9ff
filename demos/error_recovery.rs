//! Error Handling Policies Example
//!
//! Run with:
//!   cargo run --example error_recovery
//!
//! The same three sources are visited under each policy:
//! - `VisitorList`: stop at the first failure
//! - `EagerVisitorList`: finish every source, report all source failures
//! - `ContinueOnErrorVisitor`: also survive bad items and operation errors
//! - `Cancellable`: stop from outside the pipeline

use std::sync::Arc;

use resvisit::decode::{Decoder, NdjsonDecoder};
use resvisit::error::{Error, Result};
use resvisit::pipeline::cancel::{CancelToken, Cancellable};
use resvisit::pipeline::list::{EagerVisitorList, VisitorList};
use resvisit::pipeline::visitor::{from_fn, BoxVisitor, Visited, Visitor, VisitorExt};
use resvisit::source::{FileVisitor, StreamVisitor};
use serde_json::Value;

const GOOD: &[u8] = b"{\"name\":\"api\",\"replicas\":2}\n{\"name\":\"worker\",\"replicas\":1}\n";
const MIXED: &[u8] = b"{\"name\":\"cache\",\"replicas\":3}\n{\"name\":\n{\"name\":\"db\",\"replicas\":0}\n";

fn sources() -> Vec<BoxVisitor<Value>> {
    let decoder: Arc<dyn Decoder<Value>> = Arc::new(NdjsonDecoder::new());
    vec![
        StreamVisitor::new("good.ndjson", GOOD, decoder.clone()).boxed(),
        FileVisitor::new("/nonexistent/missing.ndjson", decoder.clone()).boxed(),
        StreamVisitor::new("mixed.ndjson", MIXED, decoder).boxed(),
    ]
}

/// Rejects deployments scaled to zero.
fn check_replicas(visited: Visited<'_, Value>) -> Result<()> {
    let item = visited?;
    let name = item.payload["name"].as_str().unwrap_or("?");
    match item.payload["replicas"].as_u64() {
        Some(0) | None => Err(Error::message(format!("{name}: no replicas"))),
        Some(n) => {
            println!("  ok    {name} x{n} ({})", item.source);
            Ok(())
        }
    }
}

fn report(title: &str, result: Result<()>) {
    match result {
        Ok(()) => println!("{title}: ok\n"),
        Err(err) => {
            println!("{title}: {} failure(s)", err.errors().len());
            for failure in err.errors() {
                println!("  error {failure}");
            }
            println!();
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    println!("== fail fast ==");
    let list = VisitorList::new(sources());
    report("fail fast", list.visit(&mut from_fn(check_replicas)).await);

    println!("== eager ==");
    let eager = EagerVisitorList::new(sources());
    report("eager", eager.visit(&mut from_fn(check_replicas)).await);

    println!("== continue on error ==");
    let lenient = VisitorList::new(sources()).continue_on_error();
    report(
        "continue on error",
        lenient.visit(&mut from_fn(check_replicas)).await,
    );

    println!("== cancelled after first item ==");
    let token = CancelToken::new();
    let trigger = token.clone();
    let mut op = Cancellable::new(
        from_fn(move |visited: Visited<'_, Value>| {
            let result = check_replicas(visited);
            trigger.cancel();
            result
        }),
        token,
    );
    report("cancelled", VisitorList::new(sources()).visit(&mut op).await);
}
