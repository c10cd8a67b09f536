//! Crawler module for bulk page fetching
//!
//! This module contains the core harvesting logic, including:
//! - HTTP fetching through a shared, proxied session
//! - Per-page failure isolation
//! - Concurrent processing of one chunk
//! - Sequential chunk coordination

mod batch;
mod coordinator;
mod fetcher;
mod processor;

pub use batch::{crawl_batch, BatchOutcome};
pub use coordinator::{harvest, harvest_urls, Coordinator, RunPhase};
pub use fetcher::{
    build_http_client, fetch_page, Connector, FetchError, FetchResult, HttpConnector, HttpSession,
    Session,
};
pub use processor::{process_page, RetryPolicy};
