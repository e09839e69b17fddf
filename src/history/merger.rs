//! History Merger
//!
//! Combines the pages fetched from every source into one most-recent-first
//! sequence and cuts it where a source that may still have unseen data
//! stops contributing.

use std::cmp::Ordering;
use std::collections::HashMap;

use super::client::RawPage;
use super::context::HistoryContext;
use crate::types::{HistoryItem, SourceLabel};

/// Pages fetched this round. `None` means the source was already complete
/// and was not fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourcePages {
    pub transfers: Option<RawPage>,
    pub rewards: Option<RawPage>,
    pub extrinsics: Option<RawPage>,
}

impl SourcePages {
    pub fn get(&self, label: SourceLabel) -> Option<&RawPage> {
        match label {
            SourceLabel::Transfers => self.transfers.as_ref(),
            SourceLabel::Rewards => self.rewards.as_ref(),
            SourceLabel::Extrinsics => self.extrinsics.as_ref(),
        }
    }

    pub fn set(&mut self, label: SourceLabel, page: RawPage) {
        match label {
            SourceLabel::Transfers => self.transfers = Some(page),
            SourceLabel::Rewards => self.rewards = Some(page),
            SourceLabel::Extrinsics => self.extrinsics = Some(page),
        }
    }

    fn take_items(&mut self, label: SourceLabel) -> Vec<HistoryItem> {
        let page = match label {
            SourceLabel::Transfers => self.transfers.take(),
            SourceLabel::Rewards => self.rewards.take(),
            SourceLabel::Extrinsics => self.extrinsics.take(),
        };
        page.map(RawPage::into_items).unwrap_or_default()
    }
}

/// Outcome of one merge round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub items: Vec<HistoryItem>,
    /// Items fetched per source before truncation
    pub original_counters: HashMap<SourceLabel, usize>,
}

impl MergeResult {
    pub fn original_count(&self, label: SourceLabel) -> usize {
        self.original_counters.get(&label).copied().unwrap_or(0)
    }

    /// Items per source that survived truncation
    pub fn filtered_counters(&self) -> HashMap<SourceLabel, usize> {
        self.items.iter().fold(HashMap::new(), |mut counters, item| {
            *counters.entry(item.label).or_insert(0) += 1;
            counters
        })
    }
}

/// Most recent first: block number descending, then extrinsic index
/// descending. Items equal in both keys compare equal so a stable sort
/// keeps their concatenation order.
pub fn compare_items(a: &HistoryItem, b: &HistoryItem) -> Ordering {
    b.block_number
        .cmp(&a.block_number)
        .then_with(|| b.extrinsic_index.cmp(&a.extrinsic_index))
}

/// Whether a source returned fewer items than it was asked for this round
pub fn exhausted_this_round(context: &HistoryContext, label: SourceLabel, fetched: usize) -> bool {
    (fetched as u64) < u64::from(context.source_context(label).row)
}

/// Length the merged sequence is cut to, or `None` to keep it whole.
///
/// Among sources that still may have unseen data, the one whose last
/// contribution sits earliest bounds the safe prefix.
pub fn truncation_length(
    items: &[HistoryItem],
    completion: &HashMap<SourceLabel, bool>,
) -> Option<usize> {
    SourceLabel::all()
        .into_iter()
        .filter(|label| !completion.get(label).copied().unwrap_or(false))
        .filter_map(|label| items.iter().rposition(|item| item.label == label))
        .min()
        .map(|index| index + 1)
}

/// Merge one round of fetched pages against the context they were
/// requested with.
pub fn merge(mut pages: SourcePages, context: &HistoryContext) -> MergeResult {
    let rewards = pages.take_items(SourceLabel::Rewards);
    let extrinsics = pages.take_items(SourceLabel::Extrinsics);
    let transfers = pages.take_items(SourceLabel::Transfers);

    let original_counters: HashMap<SourceLabel, usize> = [
        (SourceLabel::Transfers, transfers.len()),
        (SourceLabel::Rewards, rewards.len()),
        (SourceLabel::Extrinsics, extrinsics.len()),
    ]
    .into_iter()
    .collect();

    let completion: HashMap<SourceLabel, bool> = original_counters
        .iter()
        .map(|(label, count)| (*label, exhausted_this_round(context, *label, *count)))
        .collect();

    let mut items: Vec<HistoryItem> = rewards
        .into_iter()
        .chain(extrinsics)
        .chain(transfers)
        .collect();
    items.sort_by(compare_items);

    if let Some(length) = truncation_length(&items, &completion) {
        items.truncate(length);
    }

    MergeResult {
        items,
        original_counters,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;

    fn transfer(block: u64, index: u32) -> TransferRecord {
        TransferRecord {
            block_num: block,
            extrinsic_index: format!("{}-{}", block, index),
            ..Default::default()
        }
    }

    fn reward(block: u64, index: u32) -> RewardRecord {
        RewardRecord {
            block_num: block,
            extrinsic_idx: index,
            event_id: "Reward".to_string(),
            ..Default::default()
        }
    }

    fn extrinsic(block: u64, index: u32) -> ExtrinsicRecord {
        ExtrinsicRecord {
            block_num: block,
            extrinsic_index: format!("{}-{}", block, index),
            ..Default::default()
        }
    }

    fn labels(result: &MergeResult) -> Vec<(u64, SourceLabel)> {
        result.items.iter().map(|i| (i.block_number, i.label)).collect()
    }

    #[test]
    fn test_merge_orders_across_sources() {
        let pages = SourcePages {
            transfers: Some(RawPage::Transfers(vec![transfer(50, 1), transfer(20, 0)])),
            rewards: Some(RawPage::Rewards(vec![reward(40, 0)])),
            extrinsics: Some(RawPage::Extrinsics(vec![extrinsic(50, 3), extrinsic(10, 0)])),
        };
        let result = merge(pages, &HistoryContext::new(10));

        assert_eq!(
            labels(&result),
            vec![
                (50, SourceLabel::Extrinsics),
                (50, SourceLabel::Transfers),
                (40, SourceLabel::Rewards),
                (20, SourceLabel::Transfers),
                (10, SourceLabel::Extrinsics),
            ]
        );
    }

    #[test]
    fn test_equal_keys_keep_concatenation_order() {
        let pages = SourcePages {
            transfers: Some(RawPage::Transfers(vec![transfer(30, 2)])),
            rewards: Some(RawPage::Rewards(vec![reward(30, 2)])),
            extrinsics: Some(RawPage::Extrinsics(vec![extrinsic(30, 2)])),
        };
        let result = merge(pages, &HistoryContext::new(10));

        let order: Vec<SourceLabel> = result.items.iter().map(|i| i.label).collect();
        assert_eq!(
            order,
            vec![SourceLabel::Rewards, SourceLabel::Extrinsics, SourceLabel::Transfers]
        );
    }

    #[test]
    fn test_truncates_at_earliest_unfinished_source() {
        // Transfers filled its page (row 3) so it may have more below block 80.
        let pages = SourcePages {
            transfers: Some(RawPage::Transfers(vec![
                transfer(100, 0),
                transfer(90, 0),
                transfer(80, 0),
            ])),
            rewards: Some(RawPage::Rewards(vec![reward(85, 0), reward(60, 0)])),
            extrinsics: Some(RawPage::Extrinsics(vec![])),
        };
        let result = merge(pages, &HistoryContext::new(3));

        assert_eq!(result.items.len(), 4);
        assert_eq!(result.items.last().unwrap().block_number, 80);
        assert_eq!(result.original_count(SourceLabel::Rewards), 2);
        assert_eq!(result.filtered_counters().get(&SourceLabel::Rewards), Some(&1));
    }

    #[test]
    fn test_everything_exhausted_keeps_all() {
        let pages = SourcePages {
            transfers: Some(RawPage::Transfers(vec![transfer(5, 0)])),
            rewards: Some(RawPage::Rewards(vec![reward(9, 0), reward(1, 0)])),
            extrinsics: None,
        };
        let result = merge(pages, &HistoryContext::new(10));

        assert_eq!(result.items.len(), 3);
        assert_eq!(result.original_count(SourceLabel::Extrinsics), 0);
    }

    #[test]
    fn test_unfinished_source_without_items_does_not_cut() {
        let completion: HashMap<SourceLabel, bool> = [
            (SourceLabel::Transfers, false),
            (SourceLabel::Rewards, true),
            (SourceLabel::Extrinsics, true),
        ]
        .into_iter()
        .collect();

        let items = vec![
            HistoryItem::from_reward(reward(3, 0)),
            HistoryItem::from_extrinsic(extrinsic(2, 0)),
        ];
        assert_eq!(truncation_length(&items, &completion), None);
        assert_eq!(truncation_length(&[], &completion), None);
    }

    #[test]
    fn test_exhausted_this_round() {
        let context = HistoryContext::new(10);
        assert!(exhausted_this_round(&context, SourceLabel::Transfers, 9));
        assert!(!exhausted_this_round(&context, SourceLabel::Transfers, 10));
        assert!(exhausted_this_round(&context, SourceLabel::Rewards, 0));
    }
}
