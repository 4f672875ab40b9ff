use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncReadExt;

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::pipeline::visitor::{VisitFn, Visitor};
use crate::source::stream::dispatch;

/// Path that selects standard input instead of a file.
pub const STDIN_MARKER: &str = "-";

/// Source label given to items read from standard input.
pub const STDIN_LABEL: &str = "STDIN";

/// Reads and decodes one file, or standard input for [`STDIN_MARKER`].
pub struct FileVisitor<T> {
    path: PathBuf,
    decoder: Arc<dyn Decoder<T>>,
}

impl<T> FileVisitor<T> {
    pub fn new(path: impl Into<PathBuf>, decoder: Arc<dyn Decoder<T>>) -> Self {
        Self {
            path: path.into(),
            decoder,
        }
    }

    pub fn stdin(decoder: Arc<dyn Decoder<T>>) -> Self {
        Self::new(STDIN_MARKER, decoder)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_stdin(&self) -> bool {
        self.path == Path::new(STDIN_MARKER)
    }

    /// Source label carried by the items this visitor produces.
    pub fn label(&self) -> String {
        if self.is_stdin() {
            STDIN_LABEL.to_string()
        } else {
            self.path.display().to_string()
        }
    }
}

#[async_trait]
impl<T> Visitor<T> for FileVisitor<T>
where
    T: Send + 'static,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        #[cfg(feature = "tracing")]
        tracing::event!(
            tracing::Level::DEBUG,
            event = "resvisit.source.open",
            path = %self.label(),
            "resvisit.source.open"
        );

        if self.is_stdin() {
            let mut buf = Vec::new();
            tokio::io::stdin()
                .read_to_end(&mut buf)
                .await
                .map_err(|err| classify_io_error(&self.path, err))?;
            return dispatch(STDIN_LABEL, &buf, self.decoder.as_ref(), op).await;
        }

        let buf = read_file(&self.path).await?;
        dispatch(&self.label(), &buf, self.decoder.as_ref(), op).await
    }
}

async fn read_file(path: &Path) -> Result<Vec<u8>> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|err| classify_io_error(path, err))?;
    if metadata.is_dir() {
        return Err(Error::IsDirectory {
            path: path.to_path_buf(),
        });
    }

    tokio::fs::read(path)
        .await
        .map_err(|err| classify_io_error(path, err))
}

pub(crate) fn classify_io_error(path: &Path, err: io::Error) -> Error {
    let path = path.to_path_buf();
    match err.kind() {
        io::ErrorKind::NotFound => Error::NotFound { path },
        io::ErrorKind::PermissionDenied => Error::PermissionDenied { path },
        _ => Error::Io { path, source: err },
    }
}
