// This file is part of Autosend.
//
// Autosend is free software: you can redistribute it and/or modify it under the
// terms of the GNU Lesser General Public License as published by the Free Software
// Foundation, either version 3 of the License, or (at your option) any later version.
//
// Autosend is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with Autosend.
// If not, see https://www.gnu.org/licenses/.

//! Utilities for retrying operations.

use std::{future::Future, time::Duration};

use tokio::time;
use tracing::warn;

/// Options for retrying an operation with a linearly increasing wait.
#[derive(Clone, Copy, Debug)]
pub struct RetryOpts {
    /// Maximum number of attempts to make.
    pub max_attempts: u32,
    /// Wait after attempt `n` is `n * base_wait`.
    pub base_wait: Duration,
}

impl Default for RetryOpts {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_wait: Duration::from_secs(3),
        }
    }
}

/// Retry a function while its failures are classified as retryable by
/// `should_retry`. Non-retryable failures and the final attempt's failure are
/// surfaced unchanged.
pub async fn with_retries<Func, Fut, Out, Err>(
    description: &str,
    should_retry: impl Fn(&Err) -> bool,
    func: Func,
    opts: RetryOpts,
) -> Result<Out, Err>
where
    Func: Fn() -> Fut,
    Fut: Future<Output = Result<Out, Err>>,
{
    let mut attempt = 1;
    loop {
        match func().await {
            Ok(out) => return Ok(out),
            Err(error) => {
                if attempt >= opts.max_attempts || !should_retry(&error) {
                    return Err(error);
                }
                warn!("failed to {description} (attempt {attempt}/{}), retrying", opts.max_attempts);
                time::sleep(opts.base_wait * attempt).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Permanent,
    }

    fn retryable(err: &TestError) -> bool {
        matches!(err, TestError::Transient)
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retries(
            "do the thing",
            retryable,
            || async {
                match calls.fetch_add(1, Ordering::SeqCst) {
                    0 | 1 => Err(TestError::Transient),
                    _ => Ok(42),
                }
            },
            RetryOpts::default(),
        )
        .await;
        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retries(
            "do the thing",
            retryable,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Permanent)
            },
            RetryOpts::default(),
        )
        .await;
        assert_eq!(result, Err(TestError::Permanent));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, _> = with_retries(
            "do the thing",
            retryable,
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(TestError::Transient)
            },
            RetryOpts {
                max_attempts: 3,
                base_wait: Duration::from_millis(10),
            },
        )
        .await;
        assert_eq!(result, Err(TestError::Transient));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
