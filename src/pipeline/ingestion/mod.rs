// Pipeline ingestion: fetch a resource and split it into a header plus string rows.
//
// Splitting is newline-then-comma with no quoting support; a field that
// contains a comma is split like any other.

use serde::Serialize;
use std::time::Instant;
use tracing::{info, instrument, warn};

use crate::app::ports::ResourceFetcher;
use crate::error::{FlowMapError, Result};
use crate::observability::metrics;

/// A raw delimited table with no semantic interpretation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Position of a header column, matched case-insensitively after trimming.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Split raw text into a table. The first non-blank line is the header.
pub fn split_table(text: &str) -> Table {
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.trim().is_empty());

    let header = match lines.next() {
        Some(line) => split_fields(line),
        None => return Table::default(),
    };
    let rows = lines.map(split_fields).collect();

    Table { header, rows }
}

fn split_fields(line: &str) -> Vec<String> {
    line.split(',').map(str::to_string).collect()
}

/// Fetch a resource and split it into a table.
///
/// Fails with `ResourceUnavailable` when the fetch errors or returns a non-success status.
#[instrument(skip(fetcher))]
pub async fn load(fetcher: &dyn ResourceFetcher, resource: &str, dataset: &str) -> Result<Table> {
    let started = Instant::now();
    let fetched = match fetcher.fetch(resource).await {
        Ok(fetched) => fetched,
        Err(reason) => {
            warn!("Fetch of {} failed: {}", resource, reason);
            metrics::loader::resource_failed(dataset);
            return Err(FlowMapError::unavailable(resource, reason));
        }
    };

    if !fetched.is_success() {
        warn!("Fetch of {} returned status {}", resource, fetched.status);
        metrics::loader::resource_failed(dataset);
        return Err(FlowMapError::unavailable(
            resource,
            format!("status {}", fetched.status),
        ));
    }

    let text = String::from_utf8_lossy(&fetched.bytes);
    let table = split_table(&text);
    metrics::loader::resource_loaded(dataset, fetched.bytes.len(), started.elapsed().as_secs_f64());
    info!(
        "Loaded {} rows from {} ({} bytes, {})",
        table.rows.len(),
        resource,
        fetched.bytes.len(),
        fetched.content_type
    );
    Ok(table)
}
