//! URL list loading
//!
//! The URL list is a plain text file with one URL per line. Lines are
//! whitespace-trimmed and blank lines are skipped; nothing else is validated
//! here, since an unusable URL simply fails (and is logged) at fetch time.

use crate::HarvestError;
use std::path::Path;

/// Reads the URL list at `path`
///
/// # Returns
///
/// * `Ok(Vec<String>)` - The URLs in file order
/// * `Err(HarvestError::Input)` - The file could not be read
pub async fn load_urls(path: &Path) -> Result<Vec<String>, HarvestError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| HarvestError::Input {
            path: path.to_path_buf(),
            source,
        })?;

    let urls = parse_url_list(&content);
    tracing::debug!("Loaded {} URLs from {}", urls.len(), path.display());
    Ok(urls)
}

/// Splits newline-delimited text into trimmed, non-empty URL strings
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
