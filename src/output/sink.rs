//! Streaming JSON array output
//!
//! The output file is a single JSON object holding one array:
//!
//! ```text
//! {
//! "items" : [
//! { ...record... },
//! { ...record... }
//! ]
//! }
//! ```
//!
//! The opening envelope is written once before the run, each record is
//! appended as soon as its page is fetched, and the closing envelope is
//! appended after the last chunk. Nothing is buffered beyond one record.

use crate::crawler::FetchResult;
use crate::HarvestError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Opening envelope token
pub const ENVELOPE_OPEN: &str = "{\n\"items\" : [\n";

/// Closing envelope token
pub const ENVELOPE_CLOSE: &str = "]\n}";

/// Separator between consecutive records
pub const RECORD_SEPARATOR: &str = ",\n";

/// One output record
#[derive(Debug, Serialize)]
struct PageRecord<'a> {
    url: &'a str,
    status: u16,
    html: &'a str,
}

#[derive(Debug, Default)]
struct SinkState {
    records: usize,
}

/// Append-only JSON array file shared by every page of a run
///
/// Each append opens, writes and closes the file while holding an async
/// mutex, so concurrent pages never interleave bytes.
#[derive(Debug)]
pub struct JsonArraySink {
    path: PathBuf,
    trailing_comma: bool,
    state: Mutex<SinkState>,
}

impl JsonArraySink {
    /// Creates a sink for `path`
    ///
    /// With `trailing_comma` every record is terminated by `,\n`, which
    /// leaves a comma before the closing bracket. Otherwise records are
    /// separated by `,\n` and the file is strict JSON.
    pub fn new(path: impl Into<PathBuf>, trailing_comma: bool) -> Self {
        Self {
            path: path.into(),
            trailing_comma,
            state: Mutex::new(SinkState::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Truncates the file and writes the opening envelope
    pub async fn begin(&self) -> Result<(), HarvestError> {
        let mut state = self.state.lock().await;
        tokio::fs::write(&self.path, ENVELOPE_OPEN)
            .await
            .map_err(|source| self.output_error(source))?;
        state.records = 0;
        tracing::debug!("Opened output envelope at {}", self.path.display());
        Ok(())
    }

    /// Appends the record for `url`, or does nothing for an empty result
    ///
    /// A `None` result was already logged by the page processor, so it
    /// produces neither output nor a log line here.
    pub async fn write_record(
        &self,
        url: &str,
        result: Option<&FetchResult>,
    ) -> Result<(), HarvestError> {
        let Some(page) = result else {
            return Ok(());
        };

        let record = render_record(url, page)?;

        {
            let mut state = self.state.lock().await;

            let mut chunk = Vec::with_capacity(record.len() + RECORD_SEPARATOR.len());
            if self.trailing_comma {
                chunk.extend_from_slice(&record);
                chunk.extend_from_slice(RECORD_SEPARATOR.as_bytes());
            } else {
                if state.records > 0 {
                    chunk.extend_from_slice(RECORD_SEPARATOR.as_bytes());
                }
                chunk.extend_from_slice(&record);
            }

            self.append(&chunk).await?;
            state.records += 1;
        }

        tracing::info!("Wrote results for source URL: {}", url);
        Ok(())
    }

    /// Appends the closing envelope
    pub async fn finish(&self) -> Result<(), HarvestError> {
        let state = self.state.lock().await;
        if !self.trailing_comma && state.records > 0 {
            self.append(format!("\n{}", ENVELOPE_CLOSE).as_bytes()).await?;
        } else {
            self.append(ENVELOPE_CLOSE.as_bytes()).await?;
        }
        tracing::debug!(
            "Closed output envelope at {} ({} records)",
            self.path.display(),
            state.records
        );
        Ok(())
    }

    /// Number of records written since the last `begin`
    pub async fn records_written(&self) -> usize {
        self.state.lock().await.records
    }

    async fn append(&self, bytes: &[u8]) -> Result<(), HarvestError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|source| self.output_error(source))?;
        file.write_all(bytes)
            .await
            .map_err(|source| self.output_error(source))?;
        file.flush().await.map_err(|source| self.output_error(source))
    }

    fn output_error(&self, source: std::io::Error) -> HarvestError {
        HarvestError::Output {
            path: self.path.clone(),
            source,
        }
    }
}

/// Serializes a record as 4-space indented JSON
fn render_record(url: &str, page: &FetchResult) -> Result<Vec<u8>, HarvestError> {
    let record = PageRecord {
        url,
        status: page.status,
        html: &page.body,
    };

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    record
        .serialize(&mut serializer)
        .map_err(|source| HarvestError::Json {
            url: url.to_string(),
            source,
        })?;
    Ok(buf)
}
