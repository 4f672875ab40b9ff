//! Load resource descriptors from the command line.
//!
//! Run with:
//!   cargo run --example load_files -- manifests/ extra.ndjson https://example.com/pods.json
//!   cat pods.ndjson | cargo run --example load_files -- -
//!
//! Directories are walked recursively, every failure is reported at the end,
//! and container documents (`{"items": [...]}`) are split into their members.

use std::process::ExitCode;

use resvisit::decode::NdjsonDecoder;
use resvisit::pipeline::loader::Loader;
use resvisit::pipeline::retry::RetryPolicy;
use resvisit::pipeline::visitor::Visitor;
use resvisit::sink::DebugOp;
use serde_json::Value;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "resvisit=info".into()),
        )
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        eprintln!("usage: load_files <path|url|->...");
        return ExitCode::from(2);
    }

    let visitor = match Loader::new(NdjsonDecoder::<Value>::new().allow_empty_lines(true))
        .paths(paths)
        .recursive(true)
        .retry(RetryPolicy::new(3))
        .flatten(|payload: &Value| Ok(payload.get("items").and_then(Value::as_array).cloned()))
        .continue_on_error(true)
        .build()
    {
        Ok(visitor) => visitor,
        Err(err) => {
            eprintln!("{err}");
            return ExitCode::from(2);
        }
    };

    let mut op = DebugOp::new();
    let result = visitor.visit(&mut op).await;
    println!("\n{} item(s)", op.seen);

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            for failure in err.errors() {
                eprintln!("error: {failure}");
            }
            ExitCode::FAILURE
        }
    }
}
