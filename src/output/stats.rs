//! Run statistics
//!
//! Collected by the coordinator and reported to the operator once the run
//! has finished.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Summary of a finished harvest run
#[derive(Debug, Clone)]
pub struct HarvestStats {
    /// Number of URLs in the input list
    pub total_urls: usize,

    /// Number of chunks processed
    pub chunks: usize,

    /// Number of records written to the output
    pub records_written: usize,

    /// Number of URLs that produced no record
    pub failures: usize,

    /// Wall-clock start of the run
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl HarvestStats {
    /// Elapsed time in fractional seconds
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// Pages fetched per second, or 0 for an instant run
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed_secs();
        if secs > 0.0 {
            self.total_urls as f64 / secs
        } else {
            0.0
        }
    }

    /// The one-line operator summary
    pub fn summary_line(&self) -> String {
        format!(
            "downloaded and wrote {} in {} seconds",
            self.total_urls,
            self.elapsed_secs()
        )
    }
}

/// Prints run statistics to stdout
pub fn print_statistics(stats: &HarvestStats) {
    println!("{}", stats.summary_line());
    println!("  Started:         {}", stats.started_at.to_rfc3339());
    println!("  Chunks:          {}", stats.chunks);
    println!("  Records written: {}", stats.records_written);
    println!("  Failed URLs:     {}", stats.failures);
    println!("  Rate:            {:.2} pages/sec", stats.rate());
}
