use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncRead;

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::item::Item;
use crate::pipeline::continue_on_error::ContinueOnErrorVisitor;
use crate::pipeline::decorated::{DecoratedVisitor, DecoratorFn};
use crate::pipeline::filtered::{FilterFn, FilteredVisitor};
use crate::pipeline::flatten::{ExtractFn, FlattenListVisitor};
use crate::pipeline::list::{EagerVisitorList, VisitorList};
use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::visitor::{BoxVisitor, Visitor};
use crate::source::generator::Generate;
use crate::source::paths::{expand_paths, GeneratorRule, PathOptions};
use crate::source::stream::StreamVisitor;
use crate::source::url::{is_url, Fetch, HttpFetcher, UrlVisitor, DEFAULT_TIMEOUT};
use crate::source::{ItemsVisitor, STDIN_MARKER};

enum SourceSpec<T> {
    Path(PathBuf),
    Url(String),
    Visitor(BoxVisitor<T>),
}

/// Assembles sources and combinators into one visitor.
///
/// The built chain, innermost first, is: the base visitors in the order they
/// were added, an [`EagerVisitorList`] (continue-on-error) or a
/// [`VisitorList`], then flattening, filters, decorators and finally a
/// [`ContinueOnErrorVisitor`] when continue-on-error is set.
///
/// ```no_run
/// use resvisit::decode::JsonDecoder;
/// use resvisit::pipeline::loader::Loader;
/// use resvisit::pipeline::visitor::{from_fn, Visited, Visitor};
///
/// # async fn demo() -> resvisit::error::Result<()> {
/// let visitor = Loader::new(JsonDecoder::<serde_json::Value>::new())
///     .path("manifests/")
///     .recursive(true)
///     .continue_on_error(true)
///     .build()?;
///
/// let mut print = from_fn(|visited: Visited<'_, serde_json::Value>| {
///     let item = visited?;
///     println!("{}: {}", item.source, item.payload);
///     Ok(())
/// });
/// visitor.visit(&mut print).await
/// # }
/// ```
pub struct Loader<T> {
    decoder: Arc<dyn Decoder<T>>,
    sources: Vec<SourceSpec<T>>,
    path_options: PathOptions,
    retry: RetryPolicy,
    timeout: Duration,
    fetcher: Option<Arc<dyn Fetch>>,
    continue_on_error: bool,
    flatten: Option<ExtractFn<T>>,
    filters: Vec<FilterFn<T>>,
    decorators: Vec<DecoratorFn<T>>,
}

impl<T> Loader<T>
where
    T: Send + 'static,
{
    pub fn new<D>(decoder: D) -> Self
    where
        D: Decoder<T> + 'static,
    {
        Self::with_decoder(Arc::new(decoder))
    }

    pub fn with_decoder(decoder: Arc<dyn Decoder<T>>) -> Self {
        Self {
            decoder,
            sources: Vec::new(),
            path_options: PathOptions::default(),
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            fetcher: None,
            continue_on_error: false,
            flatten: None,
            filters: Vec::new(),
            decorators: Vec::new(),
        }
    }

    /// Add a file, a directory, `-` for standard input, or an `http(s)://` URL.
    pub fn path(mut self, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        match path.to_str() {
            Some(raw) if is_url(raw) => self.sources.push(SourceSpec::Url(raw.to_string())),
            _ => self.sources.push(SourceSpec::Path(path)),
        }
        self
    }

    pub fn paths<I, P>(self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths.into_iter().fold(self, |loader, path| loader.path(path))
    }

    pub fn stdin(self) -> Self {
        self.path(STDIN_MARKER)
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.sources.push(SourceSpec::Url(url.into()));
        self
    }

    pub fn stream<R>(mut self, label: impl Into<String>, reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        let visitor = StreamVisitor::new(label, reader, self.decoder.clone());
        self.sources.push(SourceSpec::Visitor(Box::new(visitor)));
        self
    }

    pub fn items(self, items: Vec<Item<T>>) -> Self
    where
        T: Clone + Sync,
    {
        self.visitor(ItemsVisitor::new(items))
    }

    /// Add an already built visitor as one more source.
    pub fn visitor<V>(mut self, visitor: V) -> Self
    where
        V: Visitor<T> + 'static,
    {
        self.sources.push(SourceSpec::Visitor(Box::new(visitor)));
        self
    }

    pub fn recursive(mut self, yes: bool) -> Self {
        self.path_options.recursive = yes;
        self
    }

    /// Extensions kept when walking directories; replaces the defaults.
    pub fn extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_options.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Directories containing any of `markers` are handed to `generator`.
    pub fn generator<I, S>(mut self, markers: I, generator: Arc<dyn Generate>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.path_options.generator = Some(GeneratorRule {
            markers: markers.into_iter().map(Into::into).collect(),
            generator,
        });
        self
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Per-attempt limit for URL fetches; ignored when a custom
    /// [`fetcher`](Self::fetcher) is set.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetch>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn continue_on_error(mut self, yes: bool) -> Self {
        self.continue_on_error = yes;
        self
    }

    pub fn flatten<F>(mut self, extract: F) -> Self
    where
        F: Fn(&T) -> Result<Option<Vec<T>>> + Send + Sync + 'static,
    {
        self.flatten = Some(Box::new(extract));
        self
    }

    pub fn filter<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Item<T>) -> Result<bool> + Send + Sync + 'static,
    {
        self.filters.push(Box::new(pred));
        self
    }

    pub fn decorate<F>(mut self, decorator: F) -> Self
    where
        F: Fn(&mut Item<T>) -> Result<()> + Send + Sync + 'static,
    {
        self.decorators.push(Box::new(decorator));
        self
    }

    pub fn build(self) -> Result<BoxVisitor<T>> {
        let Self {
            decoder,
            sources,
            path_options,
            retry,
            timeout,
            mut fetcher,
            continue_on_error,
            flatten,
            filters,
            decorators,
        } = self;

        if sources.is_empty() {
            return Err(Error::Config(
                "at least one path, url, stream or visitor is required".into(),
            ));
        }

        let mut base: Vec<BoxVisitor<T>> = Vec::with_capacity(sources.len());
        for source in sources {
            match source {
                SourceSpec::Path(path) => {
                    base.extend(expand_paths(&[path], &path_options, &decoder));
                }
                SourceSpec::Url(url) => {
                    let fetcher = match &fetcher {
                        Some(fetcher) => fetcher.clone(),
                        None => fetcher
                            .insert(Arc::new(HttpFetcher::with_timeout(timeout)?))
                            .clone(),
                    };
                    let visitor = UrlVisitor::new(url, decoder.clone())
                        .retry(retry.clone())
                        .fetcher(fetcher);
                    base.push(Box::new(visitor));
                }
                SourceSpec::Visitor(visitor) => base.push(visitor),
            }
        }

        let mut visitor: BoxVisitor<T> = if continue_on_error {
            Box::new(EagerVisitorList::new(base))
        } else {
            Box::new(VisitorList::new(base))
        };

        if let Some(extract) = flatten {
            visitor = Box::new(FlattenListVisitor::new(visitor, extract));
        }
        if !filters.is_empty() {
            visitor = Box::new(FilteredVisitor::new(visitor, filters));
        }
        if !decorators.is_empty() {
            visitor = Box::new(DecoratedVisitor::new(visitor, decorators));
        }
        if continue_on_error {
            visitor = Box::new(ContinueOnErrorVisitor::new(visitor));
        }

        Ok(visitor)
    }
}
