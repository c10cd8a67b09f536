//! Concurrent processing of one chunk
//!
//! Every URL of the chunk becomes one future (fetch, isolate, write). The
//! futures are joined on the calling task, so they interleave only while
//! waiting on the network or on the output file.

use crate::crawler::fetcher::Session;
use crate::crawler::processor::{process_page, RetryPolicy};
use crate::output::JsonArraySink;
use crate::HarvestError;
use futures::future::join_all;

/// Counts for a finished chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchOutcome {
    /// URLs in the chunk
    pub attempted: usize,

    /// Records written to the sink
    pub written: usize,
}

impl BatchOutcome {
    pub fn failed(&self) -> usize {
        self.attempted - self.written
    }
}

/// Fetches and writes every URL of `urls` concurrently through `session`
///
/// Returns only after every URL has been processed. The session is owned
/// by this call and dropped (closing its pooled connections) on return.
///
/// # Returns
///
/// * `Ok(BatchOutcome)` - All URLs processed; per-URL failures are counted, not raised
/// * `Err(HarvestError)` - A record could not be written to the sink
pub async fn crawl_batch<S>(
    session: S,
    urls: &[String],
    sink: &JsonArraySink,
    retry: &RetryPolicy,
) -> Result<BatchOutcome, HarvestError>
where
    S: Session,
{
    let session = &session;

    let results = join_all(urls.iter().map(|url| async move {
        let page = process_page(session, url, retry).await;
        let fetched = page.is_some();
        sink.write_record(url, page.as_ref()).await?;
        Ok::<bool, HarvestError>(fetched)
    }))
    .await;

    let mut outcome = BatchOutcome {
        attempted: urls.len(),
        written: 0,
    };

    // Surface the first sink failure only after every sibling has finished
    for result in results {
        if result? {
            outcome.written += 1;
        }
    }

    Ok(outcome)
}
