//! History Module
//!
//! Remote transaction history aggregation: three paginated sources
//! (transfers, rewards/slashes, extrinsics) merged into one
//! most-recent-first sequence with a resumable per-source cursor.

mod aggregator;
mod client;
mod context;
mod cursor;
pub mod merger;
mod subscan;

pub use aggregator::*;
pub use client::*;
pub use context::*;
pub use cursor::*;
pub use merger::{MergeResult, SourcePages};
pub use subscan::*;

use crate::config::HistoryConfig;
use crate::error::HistoryResult;
use crate::types::HistoryPage;

/// Request the next page from the explorer described by `config`
pub async fn fetch_next_page(
    config: &HistoryConfig,
    context: &HistoryContext,
    address: &str,
) -> HistoryResult<HistoryPage> {
    let aggregator = HistoryAggregator::new(SubscanClient::from_config(config)?);
    aggregator.request_next_page(context, address).await
}
