//! Remote history source capability

use async_trait::async_trait;

use crate::error::HistoryResult;
use crate::types::*;

/// One page of raw records as returned by a remote source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawPage {
    Transfers(Vec<TransferRecord>),
    Rewards(Vec<RewardRecord>),
    Extrinsics(Vec<ExtrinsicRecord>),
}

impl RawPage {
    /// Empty page for a label
    pub fn empty(label: SourceLabel) -> Self {
        match label {
            SourceLabel::Transfers => RawPage::Transfers(Vec::new()),
            SourceLabel::Rewards => RawPage::Rewards(Vec::new()),
            SourceLabel::Extrinsics => RawPage::Extrinsics(Vec::new()),
        }
    }

    pub fn label(&self) -> SourceLabel {
        match self {
            RawPage::Transfers(_) => SourceLabel::Transfers,
            RawPage::Rewards(_) => SourceLabel::Rewards,
            RawPage::Extrinsics(_) => SourceLabel::Extrinsics,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RawPage::Transfers(records) => records.len(),
            RawPage::Rewards(records) => records.len(),
            RawPage::Extrinsics(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Normalize into history items tagged with the page's label
    pub fn into_items(self) -> Vec<HistoryItem> {
        match self {
            RawPage::Transfers(records) => records.into_iter().map(HistoryItem::from_transfer).collect(),
            RawPage::Rewards(records) => records.into_iter().map(HistoryItem::from_reward).collect(),
            RawPage::Extrinsics(records) => {
                records.into_iter().map(HistoryItem::from_extrinsic).collect()
            }
        }
    }
}

/// Fetches one page of one source for an account.
///
/// A single round-trip per call: implementations do not retry or cache.
/// The returned page must belong to the requested `label`.
#[async_trait]
pub trait HistorySourceClient: Send + Sync {
    async fn fetch_page(
        &self,
        label: SourceLabel,
        address: &str,
        row: u32,
        page: u32,
    ) -> HistoryResult<RawPage>;
}
