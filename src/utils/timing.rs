use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use itertools::Itertools;
use tokio::time::{self, Instant};
use tracing::Instrument;

use crate::github::api::DEFAULT_REQUEST_TIMEOUT;

/// Signals if a retryable operation should be retried or not.
pub enum ShouldRetry<E> {
    Yes(E),
    No(E),
}

/// If we have a general error, we convert it to `ShouldRetry::Yes` automatically.
impl From<anyhow::Error> for ShouldRetry<anyhow::Error> {
    fn from(error: anyhow::Error) -> Self {
        Self::Yes(error)
    }
}

/// Decides how a remote operation gets retried in case it times out or fails.
#[derive(Debug, Clone)]
pub struct RetryMethod {
    /// After how much time should a single attempt time out.
    timeout_after: Duration,
    /// How many total attempts should be performed.
    /// An attempt might be performed either because a timeout happened, or because an error was
    /// returned.
    max_attempts: u32,
    /// Should we retry when an error was returned from the operation?
    retry_on_error: bool,
    /// For how much time should we sleep in-between attempts.
    backoff_time: Duration,
}

impl RetryMethod {
    /// Perform a single attempt. Used for operations that are not idempotent, e.g. posting
    /// a comment, where a retry after a timeout could duplicate the effect.
    pub fn no_retry() -> Self {
        Self {
            retry_on_error: false,
            max_attempts: 1,
            ..Default::default()
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_after = timeout;
        self
    }
}

impl Default for RetryMethod {
    fn default() -> Self {
        Self {
            timeout_after: DEFAULT_REQUEST_TIMEOUT,
            max_attempts: 3,
            retry_on_error: true,
            #[cfg(not(test))]
            backoff_time: Duration::from_secs(5),
            #[cfg(test)]
            backoff_time: Duration::from_millis(500),
        }
    }
}

/// Represents the result of a fallible/retryable operation.
#[derive(Debug)]
pub enum RetryableOpError<E> {
    /// The operation ended with an error on its last attempt.
    Err(E),
    /// The operation ended with a timeout on its last attempt.
    /// The data contains all previously encountered errors.
    AllAttemptsExhausted(Vec<anyhow::Error>),
}

impl<E: Into<anyhow::Error>> From<RetryableOpError<E>> for anyhow::Error {
    fn from(value: RetryableOpError<E>) -> Self {
        match value {
            RetryableOpError::Err(error) => error.into(),
            RetryableOpError::AllAttemptsExhausted(errors) => anyhow::anyhow!(
                "All attempts were exhausted, the operation was not performed successfully. Errors:\n{}",
                errors
                    .into_iter()
                    .map(|error| format!("{error:?}"))
                    .join("\n")
            ),
        }
    }
}

fn format_elapsed(start: Instant) -> String {
    format!("{:.2}ms", start.elapsed().as_secs_f64() * 1000.0)
}

/// Perform an asynchronous remote operation, bounding every attempt with a timeout.
///
/// If the operation returns an error and it was retried, the last received error will be returned
/// from the function.
///
/// The caller can explicitly specify which errors should be retried and which shouldn't.
/// By default, all errors will be turned into `ShouldRetry::Yes` due to a blanket impl.
/// If you hit an inference error, you might want to return e.g. `anyhow::Ok(...)` from `func`.
pub async fn perform_retryable<T, E, R, F, Fut>(
    operation_name: &str,
    retry_method: RetryMethod,
    func: F,
) -> Result<T, RetryableOpError<E>>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, R>>,
    R: Into<ShouldRetry<E>>,
    E: Debug,
{
    let span = tracing::trace_span!("Remote operation", operation = operation_name);

    let mut errors = vec![];
    for attempt in 1..=retry_method.max_attempts {
        let last_attempt = attempt == retry_method.max_attempts;
        let start = Instant::now();

        span.in_scope(|| {
            tracing::trace!(attempt, "Starting");
        });

        let result = time::timeout(retry_method.timeout_after, func())
            .instrument(span.clone())
            .await
            .map(|res| res.map_err(Into::into));

        match result {
            Ok(Ok(value)) => {
                span.in_scope(|| {
                    tracing::trace!(attempt, duration = format_elapsed(start), "Completed");
                });
                return Ok(value);
            }
            Ok(Err(ShouldRetry::Yes(error))) => {
                span.in_scope(|| {
                    tracing::trace!(
                        attempt,
                        duration = format_elapsed(start),
                        "Failed: {error:?}"
                    );
                });
                if last_attempt || !retry_method.retry_on_error {
                    return Err(RetryableOpError::Err(error));
                }
                errors.push(anyhow::anyhow!("{error:?}"));
            }
            Ok(Err(ShouldRetry::No(error))) => return Err(RetryableOpError::Err(error)),
            Err(_) => {
                span.in_scope(|| {
                    tracing::trace!(attempt, duration = format_elapsed(start), "Timed out");
                });
                errors.push(anyhow::anyhow!(
                    "Timeout after {}s",
                    retry_method.timeout_after.as_secs_f64()
                ));
            }
        }

        if !last_attempt {
            time::sleep(retry_method.backoff_time).await;
        }
    }

    span.in_scope(|| {
        tracing::trace!(
            "Operation failed after {} attempts",
            retry_method.max_attempts
        );
    });
    Err(RetryableOpError::AllAttemptsExhausted(errors))
}
