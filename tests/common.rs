#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use resvisit::error::{Error, Result};
use resvisit::item::Item;
use resvisit::pipeline::visitor::{VisitFn, Visited, Visitor};
use resvisit::source::url::{Fetch, Url};
use resvisit::source::Generate;

#[derive(Clone, Debug)]
pub enum Step {
    /// Hand an item to the operation.
    Item(u32),
    /// Hand an error to the operation.
    Incoming(&'static str),
    /// Return an error from `visit` itself.
    Fail(&'static str),
}

/// Replays a fixed script and counts how often it was visited.
pub struct ScriptedVisitor {
    label: String,
    steps: Vec<Step>,
    visits: Arc<AtomicUsize>,
}

impl ScriptedVisitor {
    pub fn new(label: &str, steps: Vec<Step>) -> Self {
        Self {
            label: label.to_string(),
            steps,
            visits: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn items(label: &str, values: &[u32]) -> Self {
        Self::new(label, values.iter().copied().map(Step::Item).collect())
    }

    pub fn visits(&self) -> Arc<AtomicUsize> {
        self.visits.clone()
    }
}

#[async_trait]
impl Visitor<u32> for ScriptedVisitor {
    async fn visit(&self, op: &mut dyn VisitFn<u32>) -> Result<()> {
        self.visits.fetch_add(1, Ordering::SeqCst);
        for step in &self.steps {
            match step {
                Step::Item(value) => {
                    let mut item = Item::new(self.label.as_str(), *value);
                    op.call(Ok(&mut item)).await?;
                }
                Step::Incoming(message) => op.call(Err(Error::message(*message))).await?,
                Step::Fail(message) => return Err(Error::message(*message)),
            }
        }
        Ok(())
    }
}

/// Terminal operation recording payloads; fails on selected values.
#[derive(Default)]
pub struct Recorder {
    pub seen: Vec<u32>,
    pub sources: Vec<String>,
    fail_on: Vec<u32>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(values: &[u32]) -> Self {
        Self {
            fail_on: values.to_vec(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl VisitFn<u32> for Recorder {
    async fn call(&mut self, visited: Visited<'_, u32>) -> Result<()> {
        let item = visited?;
        if self.fail_on.contains(&item.payload) {
            return Err(Error::message(format!("bad {}", item.payload)));
        }
        self.seen.push(item.payload);
        self.sources.push(item.source.clone());
        Ok(())
    }
}

pub fn message_of(err: &Error) -> Option<&str> {
    match err {
        Error::Message(message) => Some(message.as_str()),
        _ => None,
    }
}

/// Fetcher answering from a queue of canned results.
pub struct ScriptedFetcher {
    responses: Mutex<VecDeque<Result<Bytes>>>,
    attempts: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(responses: Vec<Result<Bytes>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            attempts: AtomicUsize::new(0),
        })
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetch for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().expect("mutex poisoned").pop_front();
        next.unwrap_or_else(|| {
            Err(Error::Http {
                url: url.to_string(),
                status: 599,
            })
        })
    }
}

pub fn http_status(url: &str, status: u16) -> Result<Bytes> {
    Err(Error::Http {
        url: url.to_string(),
        status,
    })
}

/// Generator returning fixed streams, or failing.
pub struct FixedGenerator {
    outcome: std::result::Result<Vec<&'static str>, &'static str>,
    calls: AtomicUsize,
}

impl FixedGenerator {
    pub fn ok(streams: Vec<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(streams),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(message: &'static str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generate for FixedGenerator {
    async fn generate(&self, dir: &Path) -> Result<Vec<Bytes>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(streams) => Ok(streams.iter().map(|s| Bytes::from_static(s.as_bytes())).collect()),
            Err(message) => Err(Error::Generator {
                path: dir.to_path_buf(),
                message: message.to_string(),
            }),
        }
    }
}
