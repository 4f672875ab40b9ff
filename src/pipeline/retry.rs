use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};

type RetryPredicate = Arc<dyn Fn(&Error) -> bool + Send + Sync>;

/// Bounded retry schedule for fetching remote sources.
///
/// `max_attempts` counts every attempt, the first one included. Only errors
/// accepted by the retry predicate are retried; by default that is
/// [`Error::is_transient`]. When attempts run out the last error is returned
/// unchanged.
#[derive(Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    retry_if: RetryPredicate,
}

/// Exponential delay between attempts: `base`, `2 * base`, ... up to `cap`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Backoff {
    base: Duration,
    cap: Duration,
    jitter: bool,
}

/// What to do after a failed attempt.
#[derive(Debug, PartialEq, Eq)]
enum Next {
    Wait(Duration),
    Fail,
    Exhausted,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff {
                base: Duration::from_secs(1),
                cap: Duration::from_secs(10),
                jitter: false,
            },
            retry_if: Arc::new(Error::is_transient),
        }
    }

    /// A single attempt, no retries.
    pub fn none() -> Self {
        Self::new(1)
    }

    /// Delay after the first failure; doubles after each further one.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.backoff.base = delay;
        self
    }

    /// Upper bound for any single delay.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.backoff.cap = delay;
        self
    }

    /// Shorten each delay by a deterministic amount of up to one half.
    pub fn jitter(mut self, yes: bool) -> Self {
        self.backoff.jitter = yes;
        self
    }

    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Error) -> bool + Send + Sync + 'static,
    {
        self.retry_if = Arc::new(predicate);
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay waited after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.delay(attempt)
    }

    /// Run `attempt` until it succeeds, fails terminally, or attempts run out.
    ///
    /// `attempt` receives the 1-based attempt number. `target` names what is
    /// being retried in emitted events.
    #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
    pub async fn run<O, F, Fut>(&self, target: &str, mut attempt: F) -> Result<O>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<O>>,
    {
        let mut number = 1u32;

        loop {
            let error = match attempt(number).await {
                Ok(out) => return Ok(out),
                Err(error) => error,
            };

            let next = self.next(number, &error);

            #[cfg(feature = "tracing")]
            tracing::event!(
                tracing::Level::WARN,
                event = "resvisit.retry.attempt_failed",
                target_name = target,
                attempt = number,
                max_attempts = self.max_attempts,
                retryable = !matches!(next, Next::Fail),
                error = %error,
                "resvisit.retry.attempt_failed"
            );

            match next {
                Next::Fail => return Err(error),
                Next::Exhausted => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(
                        tracing::Level::ERROR,
                        event = "resvisit.retry.exhausted",
                        target_name = target,
                        attempts = number,
                        error = %error,
                        "resvisit.retry.exhausted"
                    );
                    return Err(error);
                }
                Next::Wait(delay) => {
                    if !delay.is_zero() {
                        #[cfg(feature = "tracing")]
                        tracing::event!(
                            tracing::Level::WARN,
                            event = "resvisit.retry.sleep",
                            target_name = target,
                            attempt = number,
                            delay_ms = delay.as_millis() as u64,
                            "resvisit.retry.sleep"
                        );
                        tokio::time::sleep(delay).await;
                    }
                }
            }

            number += 1;
        }
    }

    fn next(&self, attempt: u32, error: &Error) -> Next {
        if !(self.retry_if)(error) {
            Next::Fail
        } else if attempt >= self.max_attempts {
            Next::Exhausted
        } else {
            Next::Wait(self.backoff.delay(attempt))
        }
    }
}

impl Backoff {
    fn delay(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(31);
        let full = self
            .base
            .checked_mul(1u32 << doublings)
            .unwrap_or(self.cap)
            .min(self.cap);

        if !self.jitter {
            return full;
        }
        // Equal jitter: keep half, scale the other half by a per-attempt fraction.
        let half = full / 2;
        let percent = (mix(u64::from(attempt)) % 101) as u32;
        half + (full - half) * percent / 100
    }
}

/// splitmix64 finaliser; spreads consecutive attempt numbers apart.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9e37_79b9_7f4a_7c15);
    x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("backoff", &self.backoff)
            .finish_non_exhaustive()
    }
}
