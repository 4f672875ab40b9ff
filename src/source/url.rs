use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
pub use reqwest::Url;

use crate::decode::Decoder;
use crate::error::{Error, Result};
use crate::pipeline::retry::RetryPolicy;
use crate::pipeline::visitor::{VisitFn, Visitor};
use crate::source::stream::dispatch;

/// One read-only retrieval of a URL's body.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Bytes>;
}

/// Per-attempt limit used by [`HttpFetcher::new`].
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Fetch`] over HTTP(S) with `reqwest`.
///
/// Non-2xx responses become [`Error::Http`]; connection, timeout and body
/// failures become [`Error::Transport`].
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Fetcher whose attempts are bounded by [`DEFAULT_TIMEOUT`].
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Fetcher whose every attempt is bounded by `timeout`.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Config(format!("failed to build http client: {err}")))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Bytes> {
        let transport = |source| Error::Transport {
            url: url.to_string(),
            source,
        };

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.bytes().await.map_err(transport)
    }
}

/// Fetches a document over the network and decodes it.
///
/// Fetching is retried according to the [`RetryPolicy`]; errors the policy
/// does not accept (4xx statuses, malformed URLs) fail immediately, and when
/// attempts run out the last error is returned as is. Without an explicit
/// [`fetcher`](Self::fetcher), an [`HttpFetcher`] bounded by
/// [`timeout`](Self::timeout) is built on first visit.
pub struct UrlVisitor<T> {
    url: String,
    decoder: Arc<dyn Decoder<T>>,
    retry: RetryPolicy,
    timeout: Duration,
    fetcher: OnceLock<Arc<dyn Fetch>>,
}

impl<T> UrlVisitor<T> {
    pub fn new(url: impl Into<String>, decoder: Arc<dyn Decoder<T>>) -> Self {
        Self {
            url: url.into(),
            decoder,
            retry: RetryPolicy::default(),
            timeout: DEFAULT_TIMEOUT,
            fetcher: OnceLock::new(),
        }
    }

    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Per-attempt limit for the default fetcher.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn fetcher(self, fetcher: Arc<dyn Fetch>) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(fetcher);
        Self {
            fetcher: slot,
            ..self
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn resolve_fetcher(&self) -> Result<&Arc<dyn Fetch>> {
        if let Some(fetcher) = self.fetcher.get() {
            return Ok(fetcher);
        }
        let built: Arc<dyn Fetch> = Arc::new(HttpFetcher::with_timeout(self.timeout)?);
        Ok(self.fetcher.get_or_init(|| built))
    }
}

#[async_trait]
impl<T> Visitor<T> for UrlVisitor<T>
where
    T: Send + 'static,
{
    async fn visit(&self, op: &mut dyn VisitFn<T>) -> Result<()> {
        let url = parse_url(&self.url)?;
        let fetcher = self.resolve_fetcher()?;
        let body = self
            .retry
            .run(&self.url, |_| fetcher.fetch(&url))
            .await?;
        dispatch(&self.url, &body, self.decoder.as_ref(), op).await
    }
}

/// Whether `raw` should be treated as a URL rather than a path.
pub fn is_url(raw: &str) -> bool {
    raw.starts_with("http://") || raw.starts_with("https://")
}

fn parse_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|err| Error::InvalidUrl {
        url: raw.to_string(),
        message: err.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(Error::InvalidUrl {
            url: raw.to_string(),
            message: format!("unsupported scheme {other:?}"),
        }),
    }
}
