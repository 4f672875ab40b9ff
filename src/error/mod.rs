use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed caller error carried by [`Error::Operation`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error decoding {source_label}{}: {message}", line_suffix(.line))]
    Decode {
        source_label: String,
        line: Option<usize>,
        message: String,
    },

    #[error("the path {} does not exist", .path.display())]
    NotFound { path: PathBuf },

    #[error("the path {} is a directory, expected a file", .path.display())]
    IsDirectory { path: PathBuf },

    #[error("permission denied reading {}", .path.display())]
    PermissionDenied { path: PathBuf },

    #[error("io error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("GET {url} failed with status {status}")]
    Http { url: String, status: u16 },

    #[error("GET {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("generator failed for {}: {message}", .path.display())]
    Generator { path: PathBuf, message: String },

    #[error("stream {label} was already consumed")]
    StreamConsumed { label: String },

    #[error("filter error: {0}")]
    Predicate(String),

    #[error("{0}")]
    Message(String),

    #[error("operation failed: {0}")]
    Operation(#[source] BoxError),

    #[error("visit cancelled")]
    Cancelled,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("{0}")]
    Aggregate(Aggregate),
}

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed payload.
    Decode,
    /// Missing file, unreachable URL, denied permission, failed generator.
    SourceUnavailable,
    /// A filter predicate failed.
    Predicate,
    /// Caller logic failed on a valid item.
    Operation,
    /// The pipeline was assembled incorrectly.
    Config,
    /// More than one of the above.
    Aggregate,
}

impl Error {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn predicate(message: impl Into<String>) -> Self {
        Self::Predicate(message.into())
    }

    pub fn operation(err: impl Into<BoxError>) -> Self {
        Self::Operation(err.into())
    }

    pub fn decode(source_label: impl Into<String>, err: crate::decode::DecodeError) -> Self {
        Self::Decode {
            source_label: source_label.into(),
            line: err.line,
            message: err.message,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Decode { .. } => ErrorKind::Decode,
            Self::NotFound { .. }
            | Self::IsDirectory { .. }
            | Self::PermissionDenied { .. }
            | Self::Io { .. }
            | Self::InvalidUrl { .. }
            | Self::Http { .. }
            | Self::Transport { .. }
            | Self::Generator { .. }
            | Self::StreamConsumed { .. } => ErrorKind::SourceUnavailable,
            Self::Predicate(_) => ErrorKind::Predicate,
            Self::Message(_) | Self::Operation(_) | Self::Cancelled => ErrorKind::Operation,
            Self::Config(_) => ErrorKind::Config,
            Self::Aggregate(_) => ErrorKind::Aggregate,
        }
    }

    pub fn is_source_unavailable(&self) -> bool {
        self.kind() == ErrorKind::SourceUnavailable
    }

    /// Whether a fetch failing with this error may succeed when repeated.
    ///
    /// Only transport-level failures and 5xx statuses qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => (500..600).contains(status),
            Self::Transport { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request() || source.is_body()
            }
            _ => false,
        }
    }

    /// Combine `errors` into one value.
    ///
    /// Nested aggregates are flattened. Zero errors yield `None`, exactly one
    /// yields that error itself, more yield [`Error::Aggregate`].
    pub fn aggregate(errors: Vec<Error>) -> Option<Error> {
        let mut flat = Vec::with_capacity(errors.len());
        for err in errors {
            match err {
                Self::Aggregate(inner) => flat.extend(inner.0),
                other => flat.push(other),
            }
        }

        match flat.len() {
            0 => None,
            1 => flat.pop(),
            _ => Some(Self::Aggregate(Aggregate(flat))),
        }
    }

    /// Underlying failures: the members of an aggregate, or `self` alone.
    pub fn errors(&self) -> &[Error] {
        match self {
            Self::Aggregate(inner) => &inner.0,
            other => std::slice::from_ref(other),
        }
    }

    pub fn into_errors(self) -> Vec<Error> {
        match self {
            Self::Aggregate(inner) => inner.0,
            other => vec![other],
        }
    }
}

/// Ordered collection of failures gathered by an aggregating visitor.
///
/// Always holds at least two errors; see [`Error::aggregate`].
#[derive(Debug)]
pub struct Aggregate(Vec<Error>);

impl Aggregate {
    pub fn errors(&self) -> &[Error] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{err}")?;
        }
        f.write_str("]")
    }
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (line {line})"),
        None => String::new(),
    }
}
