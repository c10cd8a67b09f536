//! Per-page failure isolation
//!
//! `process_page` is the only place where a single page's failure is
//! observed. Transport errors, unexpected errors and panics raised while
//! fetching are logged once at error level and turned into `None`, so
//! nothing a single URL does can reach sibling pages or the batch.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_page, FetchError, FetchResult, Session};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

/// How many times a transport failure is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one
    pub max_retries: u32,

    /// Fixed pause before each extra attempt
    pub delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            delay: Duration::from_millis(config.retry_delay_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

/// Fetches `url` and absorbs any failure
///
/// # Returns
///
/// * `Some(FetchResult)` - The page was fetched
/// * `None` - The fetch failed; the failure has already been logged
pub async fn process_page<S>(session: &S, url: &str, retry: &RetryPolicy) -> Option<FetchResult>
where
    S: Session + ?Sized,
{
    let mut attempt: u32 = 0;

    loop {
        let outcome = AssertUnwindSafe(fetch_page(session, url))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(page)) => return Some(page),

            Ok(Err(error)) if error.is_retryable() && attempt < retry.max_retries => {
                attempt += 1;
                tracing::warn!(
                    "Attempt {}/{} for {} failed: {}",
                    attempt,
                    retry.max_retries + 1,
                    url,
                    error
                );
                tokio::time::sleep(retry.delay).await;
            }

            Ok(Err(FetchError::Transport { status, message })) => {
                tracing::error!(
                    "HTTP exception for {} [{}]: {}",
                    url,
                    status.map_or_else(|| "None".to_string(), |s| s.to_string()),
                    message
                );
                return None;
            }

            Ok(Err(FetchError::Unexpected(detail))) => {
                tracing::error!("Unexpected error while fetching {}: {}", url, detail);
                return None;
            }

            Err(panic) => {
                tracing::error!(
                    "Unexpected panic while fetching {}: {}",
                    url,
                    panic_message(panic.as_ref())
                );
                return None;
            }
        }
    }
}

/// Extracts the message from a panic payload
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
