use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use walkdir::WalkDir;

use crate::decode::Decoder;
use crate::error::Result;
use crate::pipeline::visitor::{BoxVisitor, VisitFn, Visitor};
use crate::source::file::{classify_io_error, FileVisitor, STDIN_MARKER};
use crate::source::generator::{Generate, GeneratorVisitor};

/// Extensions picked up when walking a directory, without the leading dot.
pub const DEFAULT_EXTENSIONS: &[&str] = &["json", "ndjson", "jsonl"];

/// Hands directories containing a marker file to a generator instead of
/// walking them.
#[derive(Clone)]
pub struct GeneratorRule {
    pub markers: Vec<String>,
    pub generator: Arc<dyn Generate>,
}

impl fmt::Debug for GeneratorRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeneratorRule")
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug)]
pub struct PathOptions {
    /// Descend into subdirectories.
    pub recursive: bool,
    /// File extensions kept while walking directories.
    pub extensions: Vec<String>,
    pub generator: Option<GeneratorRule>,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            extensions: DEFAULT_EXTENSIONS.iter().map(|ext| ext.to_string()).collect(),
            generator: None,
        }
    }
}

/// Turn paths into one visitor per file.
///
/// `-` reads standard input. Directories are walked in lexical order without
/// following symlinked directories, and only files with a configured extension
/// are kept; explicitly named files are always kept. Paths that cannot be
/// inspected become visitors that report the problem when visited.
pub fn expand_paths<T, P>(
    paths: &[P],
    options: &PathOptions,
    decoder: &Arc<dyn Decoder<T>>,
) -> Vec<BoxVisitor<T>>
where
    T: Send + 'static,
    P: AsRef<Path>,
{
    let mut visitors: Vec<BoxVisitor<T>> = Vec::new();

    for path in paths {
        let path = path.as_ref();
        if path == Path::new(STDIN_MARKER) {
            visitors.push(Box::new(FileVisitor::stdin(decoder.clone())));
            continue;
        }

        match std::fs::metadata(path) {
            Ok(metadata) if metadata.is_dir() => {
                expand_dir(path, options, decoder, &mut visitors);
            }
            _ => visitors.push(Box::new(FileVisitor::new(path, decoder.clone()))),
        }
    }

    visitors
}

fn expand_dir<T>(
    dir: &Path,
    options: &PathOptions,
    decoder: &Arc<dyn Decoder<T>>,
    visitors: &mut Vec<BoxVisitor<T>>,
) where
    T: Send + 'static,
{
    let mut walk = WalkDir::new(dir).follow_links(false).sort_by_file_name();
    if !options.recursive {
        walk = walk.max_depth(1);
    }

    let mut entries = walk.into_iter();
    while let Some(entry) = entries.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                visitors.push(Box::new(UnreadableVisitor::new(dir, &err)));
                continue;
            }
        };
        let path = entry.path();
        let file_type = entry.file_type();

        if file_type.is_dir() {
            if entry.depth() > 0 && !options.recursive {
                skipped(path, "directory");
                continue;
            }
            if let Some(rule) = generator_for(path, options) {
                visitors.push(Box::new(GeneratorVisitor::new(
                    path,
                    rule.generator.clone(),
                    decoder.clone(),
                )));
                entries.skip_current_dir();
            }
            continue;
        }

        // Symlinked files are read through the link; symlinked directories
        // are never entered.
        if file_type.is_symlink() && !path.is_file() {
            skipped(path, "symlink");
            continue;
        }

        if has_extension(path, &options.extensions) {
            visitors.push(Box::new(FileVisitor::new(path, decoder.clone())));
        } else {
            skipped(path, "extension");
        }
    }
}

fn generator_for<'a>(dir: &Path, options: &'a PathOptions) -> Option<&'a GeneratorRule> {
    options
        .generator
        .as_ref()
        .filter(|rule| rule.markers.iter().any(|marker| dir.join(marker).is_file()))
}

/// Stands in for a directory entry the walk could not read.
struct UnreadableVisitor {
    path: PathBuf,
    kind: io::ErrorKind,
    message: String,
}

impl UnreadableVisitor {
    fn new(root: &Path, err: &walkdir::Error) -> Self {
        let visitor = Self {
            path: err.path().unwrap_or(root).to_path_buf(),
            kind: err
                .io_error()
                .map_or(io::ErrorKind::Other, |source| source.kind()),
            message: err.to_string(),
        };

        #[cfg(feature = "tracing")]
        tracing::event!(
            tracing::Level::WARN,
            event = "resvisit.path.unreadable",
            path = %visitor.path.display(),
            error = %visitor.message,
            "resvisit.path.unreadable"
        );

        visitor
    }
}

#[async_trait]
impl<T> Visitor<T> for UnreadableVisitor
where
    T: Send + 'static,
{
    async fn visit(&self, _op: &mut dyn VisitFn<T>) -> Result<()> {
        Err(classify_io_error(
            &self.path,
            io::Error::new(self.kind, self.message.clone()),
        ))
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|wanted| wanted.trim_start_matches('.') == ext)
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn skipped(path: &Path, reason: &'static str) {
    #[cfg(feature = "tracing")]
    tracing::event!(
        tracing::Level::TRACE,
        event = "resvisit.path.skipped",
        path = %path.display(),
        reason = reason,
        "resvisit.path.skipped"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, ErrorKind};
    use crate::pipeline::visitor::{from_fn, Visited};

    fn unreadable(kind: io::ErrorKind) -> UnreadableVisitor {
        UnreadableVisitor {
            path: PathBuf::from("/data/locked"),
            kind,
            message: "walk failed".into(),
        }
    }

    async fn visit_once(visitor: &UnreadableVisitor) -> (usize, Error) {
        let mut calls = 0;
        let mut op = from_fn(|_: Visited<'_, serde_json::Value>| {
            calls += 1;
            Ok(())
        });
        let err = Visitor::<serde_json::Value>::visit(visitor, &mut op)
            .await
            .unwrap_err();
        drop(op);
        (calls, err)
    }

    #[tokio::test]
    async fn unreadable_entry_fails_on_every_visit() {
        let visitor = unreadable(io::ErrorKind::PermissionDenied);

        for _ in 0..2 {
            let (calls, err) = visit_once(&visitor).await;
            assert_eq!(calls, 0);
            assert!(
                matches!(&err, Error::PermissionDenied { path } if path == Path::new("/data/locked")),
                "{err:?}"
            );
            assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
        }
    }

    #[tokio::test]
    async fn unreadable_entry_keeps_the_io_kind() {
        let (_, err) = visit_once(&unreadable(io::ErrorKind::NotFound)).await;
        assert!(matches!(err, Error::NotFound { .. }));

        let (_, err) = visit_once(&unreadable(io::ErrorKind::Other)).await;
        match err {
            Error::Io { source, .. } => assert_eq!(source.to_string(), "walk failed"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn extensions_match_with_or_without_dot() {
        let wanted = vec![".json".to_string(), "ndjson".to_string()];
        assert!(has_extension(Path::new("a.json"), &wanted));
        assert!(has_extension(Path::new("b.ndjson"), &wanted));
        assert!(!has_extension(Path::new("c.txt"), &wanted));
        assert!(!has_extension(Path::new("README"), &wanted));
    }
}
