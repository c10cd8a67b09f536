//! Harvest coordinator - main run orchestration logic
//!
//! This module drives a whole run:
//! - Writing the output envelope before and after the chunked run
//! - Splitting the URL list into fixed-size chunks
//! - Opening a fresh session per chunk and running it to completion
//! - Reporting run statistics

use crate::config::Config;
use crate::crawler::batch::crawl_batch;
use crate::crawler::fetcher::{Connector, HttpConnector};
use crate::crawler::processor::RetryPolicy;
use crate::input::load_urls;
use crate::output::{HarvestStats, JsonArraySink};
use crate::HarvestError;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Where a run currently is
///
/// Phases only move forward: `Init → WritingEnvelopeOpen →
/// ProcessingChunk* → WritingEnvelopeClose → Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Init,
    WritingEnvelopeOpen,
    ProcessingChunk(usize),
    WritingEnvelopeClose,
    Done,
}

/// Main harvest coordinator structure
pub struct Coordinator<C: Connector> {
    connector: C,
    sink: JsonArraySink,
    chunk_size: usize,
    retry: RetryPolicy,
    phase: RunPhase,
}

impl<C: Connector> Coordinator<C> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `connector` - Opens one session per chunk
    /// * `sink` - Destination for the JSON array
    /// * `chunk_size` - URLs fetched concurrently per chunk
    pub fn new(connector: C, sink: JsonArraySink, chunk_size: usize) -> Self {
        Self {
            connector,
            sink,
            chunk_size,
            retry: RetryPolicy::none(),
            phase: RunPhase::Init,
        }
    }

    /// Sets the per-URL retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Runs the harvest over `urls`
    ///
    /// Chunks are processed strictly in order; the next chunk starts only
    /// after every URL of the previous one has been fetched and written.
    /// Per-URL failures never abort the run. Any error returned here is
    /// fatal and leaves the output incomplete.
    pub async fn run(mut self, urls: &[String]) -> Result<HarvestStats, HarvestError> {
        let result = self.run_phases(urls).await;
        if let Err(e) = &result {
            tracing::error!("Harvest aborted during {:?}: {}", self.phase, e);
        }
        result
    }

    async fn run_phases(&mut self, urls: &[String]) -> Result<HarvestStats, HarvestError> {
        if self.chunk_size == 0 {
            return Err(HarvestError::InvalidChunkSize);
        }

        let started_at = Utc::now();
        let start_time = Instant::now();

        self.enter(RunPhase::WritingEnvelopeOpen);
        self.sink.begin().await?;

        let mut chunks = 0;
        for (index, chunk) in urls.chunks(self.chunk_size).enumerate() {
            self.enter(RunPhase::ProcessingChunk(index));
            tracing::info!("chunk {} ({} URLs)", index, chunk.len());

            let session = self.connector.open_session()?;
            let outcome = crawl_batch(session, chunk, &self.sink, &self.retry).await?;
            chunks += 1;

            tracing::debug!(
                "chunk {} done: {} written, {} failed",
                index,
                outcome.written,
                outcome.failed()
            );
        }

        self.enter(RunPhase::WritingEnvelopeClose);
        self.sink.finish().await?;
        self.enter(RunPhase::Done);

        let records_written = self.sink.records_written().await;
        let stats = HarvestStats {
            total_urls: urls.len(),
            chunks,
            records_written,
            failures: urls.len() - records_written,
            started_at,
            elapsed: start_time.elapsed(),
        };

        tracing::info!(
            "Harvest completed: {} URLs in {:?} ({} written, {} failed)",
            stats.total_urls,
            stats.elapsed,
            stats.records_written,
            stats.failures
        );

        Ok(stats)
    }

    fn enter(&mut self, next: RunPhase) {
        tracing::trace!("Run phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }
}

/// Harvests `urls` into `output_path` with default output and retry settings
///
/// # Example
///
/// ```no_run
/// use page_harvest::crawler::{harvest_urls, HttpConnector};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let urls = vec!["https://example.com/".to_string()];
/// let connector = HttpConnector::new(None, None);
/// let stats = harvest_urls(connector, &urls, "out.json", 25).await?;
/// println!("{}", stats.summary_line());
/// # Ok(())
/// # }
/// ```
pub async fn harvest_urls<C: Connector>(
    connector: C,
    urls: &[String],
    output_path: impl Into<PathBuf>,
    chunk_size: usize,
) -> Result<HarvestStats, HarvestError> {
    let sink = JsonArraySink::new(output_path, false);
    Coordinator::new(connector, sink, chunk_size).run(urls).await
}

/// Runs a complete harvest as described by `config`
///
/// Loads the URL list, routes every request through the configured proxy,
/// and writes the output file.
pub async fn harvest(config: &Config) -> Result<HarvestStats, HarvestError> {
    let urls = load_urls(Path::new(&config.input.urls_path)).await?;
    tracing::info!(
        "Loaded {} URLs from {}",
        urls.len(),
        config.input.urls_path
    );

    let connector = HttpConnector::from_config(config);
    if connector.uses_proxy() {
        tracing::info!("Routing requests through configured proxy");
    }

    let sink = JsonArraySink::new(&config.output.path, config.output.trailing_comma);

    Coordinator::new(connector, sink, config.crawler.chunk_size)
        .with_retry(RetryPolicy::from_config(&config.crawler))
        .run(&urls)
        .await
}
