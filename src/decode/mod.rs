//! Turning raw bytes into payloads.
//!
//! A [`Decoder`] never aborts a whole stream for one bad document when it can
//! avoid it: every document is reported as its own `Result`, and sources turn
//! failures into [`Error::Decode`](crate::error::Error::Decode) values that the
//! visiting operation gets to see.

mod json;
mod ndjson;

use thiserror::Error;

pub use json::JsonDecoder;
pub use ndjson::NdjsonDecoder;

/// One decoded document and the line it started on.
#[derive(Debug, Clone, PartialEq)]
pub struct Document<T> {
    pub payload: T,
    pub line: Option<usize>,
}

impl<T> Document<T> {
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DecodeError {
    pub line: Option<usize>,
    pub message: String,
}

impl DecodeError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            line: None,
            message: message.into(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

pub type Decoded<T> = std::result::Result<Document<T>, DecodeError>;

pub trait Decoder<T>: Send + Sync {
    /// Decode one complete byte stream into zero or more documents.
    fn decode(&self, input: &[u8]) -> Vec<Decoded<T>>;
}

impl<T, F> Decoder<T> for F
where
    F: Fn(&[u8]) -> Vec<Decoded<T>> + Send + Sync,
{
    fn decode(&self, input: &[u8]) -> Vec<Decoded<T>> {
        self(input)
    }
}

pub(crate) fn strip_bom(input: &[u8]) -> &[u8] {
    input.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(input)
}

pub(crate) fn preview(line: &[u8]) -> String {
    const PREVIEW_LEN: usize = 80;
    let text = String::from_utf8_lossy(line);
    let escaped = text.replace('\n', "\\n").replace('\r', "\\r");
    let mut short = escaped.chars().take(PREVIEW_LEN).collect::<String>();
    if escaped.chars().count() > PREVIEW_LEN {
        short.push_str("...");
    }
    short
}
