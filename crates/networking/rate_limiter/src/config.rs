use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Trailing window every peer budget is measured over.
pub const DEFAULT_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(60);

pub const DEFAULT_PEER_BLOCKS_RATE_LIMIT: u64 = 500;
pub const DEFAULT_PEER_BLOB_SIDECARS_RATE_LIMIT: u64 = 2000;
pub const DEFAULT_PEER_REQUEST_LIMIT: u64 = 50;

/// Resources a peer can consume through req/resp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Blocks,
    BlobSidecars,
    DataColumns,
    Requests,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Blocks,
        ResourceKind::BlobSidecars,
        ResourceKind::DataColumns,
        ResourceKind::Requests,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Blocks => "blocks",
            ResourceKind::BlobSidecars => "blob_sidecars",
            ResourceKind::DataColumns => "data_columns",
            ResourceKind::Requests => "requests",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-peer budgets, one per [`ResourceKind`], all sharing the same window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub blocks: u64,
    pub blob_sidecars: u64,
    pub data_columns: u64,
    pub requests: u64,
}

impl RateLimitConfig {
    /// Builds the budgets from the operator-facing limits. Data columns are requested per
    /// block, so their budget scales with the number of columns.
    pub fn new(
        peer_blocks_rate_limit: u64,
        peer_blob_sidecars_rate_limit: u64,
        peer_request_limit: u64,
        number_of_columns: u64,
    ) -> Self {
        Self {
            window: DEFAULT_RATE_LIMIT_WINDOW,
            blocks: peer_blocks_rate_limit,
            blob_sidecars: peer_blob_sidecars_rate_limit,
            data_columns: peer_blocks_rate_limit.saturating_mul(number_of_columns.max(1)),
            requests: peer_request_limit,
        }
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn max_units(&self, kind: ResourceKind) -> u64 {
        match kind {
            ResourceKind::Blocks => self.blocks,
            ResourceKind::BlobSidecars => self.blob_sidecars,
            ResourceKind::DataColumns => self.data_columns,
            ResourceKind::Requests => self.requests,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_PEER_BLOCKS_RATE_LIMIT,
            DEFAULT_PEER_BLOB_SIDECARS_RATE_LIMIT,
            DEFAULT_PEER_REQUEST_LIMIT,
            1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_columns_scale_with_column_count() {
        let config = RateLimitConfig::new(10, 20, 5, 128);
        assert_eq!(config.max_units(ResourceKind::Blocks), 10);
        assert_eq!(config.max_units(ResourceKind::BlobSidecars), 20);
        assert_eq!(config.max_units(ResourceKind::DataColumns), 1280);
        assert_eq!(config.max_units(ResourceKind::Requests), 5);
        assert_eq!(config.window, DEFAULT_RATE_LIMIT_WINDOW);
    }

    #[test]
    fn test_zero_columns_treated_as_one() {
        let config = RateLimitConfig::new(10, 20, 5, 0);
        assert_eq!(config.data_columns, 10);
    }
}
