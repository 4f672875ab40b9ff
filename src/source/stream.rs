use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::item::Item;
use crate::pipeline::visitor::{VisitFn, Visitor};

type BoxReader = Box<dyn AsyncRead + Send + Unpin>;

/// Decodes everything readable from a byte stream.
///
/// The stream is consumed by the first `visit`; visiting again fails with
/// [`Error::StreamConsumed`].
pub struct StreamVisitor<T> {
    label: String,
    reader: Mutex<Option<BoxReader>>,
    decoder: Arc<dyn Decoder<T>>,
}

impl<T> StreamVisitor<T> {
    pub fn new<R>(label: impl Into<String>, reader: R, decoder: Arc<dyn Decoder<T>>) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            label: label.into(),
            reader: Mutex::new(Some(Box::new(reader))),
            decoder,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    fn take_reader(&self) -> Option<BoxReader> {
        match self.reader.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

#[async_trait]
impl<T> Visitor<T> for StreamVisitor<T>
where
    T: Send + 'static,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let Some(mut reader) = self.take_reader() else {
            return Err(Error::StreamConsumed {
                label: self.label.clone(),
            });
        };

        let mut buf = Vec::new();
        reader
            .read_to_end(&mut buf)
            .await
            .map_err(|source| Error::Io {
                path: PathBuf::from(&self.label),
                source,
            })?;

        dispatch(&self.label, &buf, self.decoder.as_ref(), op).await
    }
}

/// Decode `input` and hand every document, or decode failure, to `op`.
pub(crate) async fn dispatch<T>(
    label: &str,
    input: &[u8],
    decoder: &dyn Decoder<T>,
    op: &mut dyn VisitFn<T>,
) -> Result<()>
where
    T: Send + 'static,
{
    for decoded in decoder.decode(input) {
        match decoded {
            Ok(document) => {
                let mut item = Item {
                    source: label.to_string(),
                    line: document.line,
                    payload: document.payload,
                };
                op.call(Ok(&mut item)).await?;
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::event!(
                    tracing::Level::DEBUG,
                    event = "resvisit.decode.failed",
                    source = label,
                    line = ?err.line,
                    error = %err,
                    "resvisit.decode.failed"
                );
                op.call(Err(Error::decode(label, err))).await?;
            }
        }
    }
    Ok(())
}
