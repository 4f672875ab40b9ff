use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::process::Command;

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::pipeline::visitor::{VisitFn, Visitor};
use crate::source::stream::dispatch;

/// External tool that derives byte streams from a directory.
#[async_trait]
pub trait Generate: Send + Sync {
    async fn generate(&self, dir: &Path) -> Result<Vec<Bytes>>;
}

/// Runs a program with the directory appended as its last argument and
/// takes its standard output as a single stream.
#[derive(Clone, Debug)]
pub struct CommandGenerator {
    program: OsString,
    args: Vec<OsString>,
}

impl CommandGenerator {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

#[async_trait]
impl Generate for CommandGenerator {
    async fn generate(&self, dir: &Path) -> Result<Vec<Bytes>> {
        let program = self.program.to_string_lossy().into_owned();
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(dir)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|err| Error::Generator {
                path: dir.to_path_buf(),
                message: format!("failed to run {program}: {err}"),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let message = if stderr.is_empty() {
                format!("{program} exited with {}", output.status)
            } else {
                format!("{program} exited with {}: {stderr}", output.status)
            };
            return Err(Error::Generator {
                path: dir.to_path_buf(),
                message,
            });
        }

        Ok(vec![Bytes::from(output.stdout)])
    }
}

/// Decodes the streams a [`Generate`] tool produces for a directory.
///
/// Generation completes before anything is dispatched, so a failing tool
/// yields its error and no items.
pub struct GeneratorVisitor<T> {
    dir: PathBuf,
    generator: Arc<dyn Generate>,
    decoder: Arc<dyn Decoder<T>>,
}

impl<T> GeneratorVisitor<T> {
    pub fn new(
        dir: impl Into<PathBuf>,
        generator: Arc<dyn Generate>,
        decoder: Arc<dyn Decoder<T>>,
    ) -> Self {
        Self {
            dir: dir.into(),
            generator,
            decoder,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl<T> Visitor<T> for GeneratorVisitor<T>
where
    T: Send + 'static,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let streams = match self.generator.generate(&self.dir).await {
            Ok(streams) => streams,
            Err(err) => {
                #[cfg(feature = "tracing")]
                tracing::event!(
                    tracing::Level::WARN,
                    event = "resvisit.generator.failed",
                    dir = %self.dir.display(),
                    error = %err,
                    "resvisit.generator.failed"
                );
                return Err(err);
            }
        };

        let label = self.dir.display().to_string();
        for stream in &streams {
            dispatch(&label, stream, self.decoder.as_ref(), op).await?;
        }
        Ok(())
    }
}
