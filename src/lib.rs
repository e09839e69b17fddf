//! Wallet History Core
//!
//! Remote transaction history for the wallet app: fetches transfers,
//! staking rewards/slashes and extrinsics for an account from a
//! Subscan-compatible explorer and pages through them as one
//! most-recent-first feed.
//!
//! # Architecture
//!
//! This crate provides:
//! - **history**: source cursors, the resumable context, merge and
//!   aggregation logic, and the explorer client
//! - **config**: endpoint and paging configuration
//! - **ffi**: C-ABI exports for the mobile shell
//!
//! # Paging
//!
//! Each call is a function of `(context, address) -> (items, next context)`.
//! The caller keeps the context between calls and starts a new one when
//! the account or filter changes.
//!
//! ```rust,ignore
//! use wallet_history::{HistoryAggregator, HistoryConfig, SubscanClient};
//!
//! let config = HistoryConfig::from_env();
//! let aggregator = HistoryAggregator::new(SubscanClient::from_config(&config)?);
//! let page = aggregator.request_next_page(&config.initial_context(), address).await?;
//! ```

pub mod config;
pub mod error;
pub mod ffi;
pub mod history;
pub mod types;
pub mod utils;

pub use config::HistoryConfig;
pub use error::{ErrorCode, HistoryError, HistoryResult};
pub use history::{
    HistoryAggregator, HistoryContext, HistorySourceClient, RawPage, SourceCursor, SubscanClient,
};
pub use types::*;

pub use ffi::{wallet_history_free_string, wallet_history_new_context, wallet_history_next_page};
