#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use wallet_history::{
    ExtrinsicRecord, HistoryError, HistoryResult, HistorySourceClient, RawPage, RewardRecord,
    SourceLabel, TransferRecord,
};

pub fn transfer(block: u64, index: u32) -> TransferRecord {
    TransferRecord {
        block_num: block,
        extrinsic_index: format!("{}-{}", block, index),
        hash: format!("0xt{}-{}", block, index),
        success: true,
        ..Default::default()
    }
}

pub fn reward(block: u64, index: u32) -> RewardRecord {
    RewardRecord {
        event_index: format!("{}-{}", block, index),
        block_num: block,
        extrinsic_idx: index,
        event_id: "Reward".to_string(),
        ..Default::default()
    }
}

pub fn extrinsic(block: u64, index: u32) -> ExtrinsicRecord {
    ExtrinsicRecord {
        block_num: block,
        extrinsic_index: format!("{}-{}", block, index),
        extrinsic_hash: format!("0xe{}-{}", block, index),
        success: true,
        ..Default::default()
    }
}

/// Serves pages out of complete per-source datasets, newest first,
/// and records every request it sees.
#[derive(Default)]
pub struct DatasetClient {
    pub transfers: Vec<TransferRecord>,
    pub rewards: Vec<RewardRecord>,
    pub extrinsics: Vec<ExtrinsicRecord>,
    pub failing: Option<SourceLabel>,
    calls: AtomicUsize,
    requests: Mutex<Vec<(SourceLabel, u32, u32)>>,
}

impl DatasetClient {
    pub fn new(
        transfers: Vec<TransferRecord>,
        rewards: Vec<RewardRecord>,
        extrinsics: Vec<ExtrinsicRecord>,
    ) -> Self {
        Self {
            transfers,
            rewards,
            extrinsics,
            ..Default::default()
        }
    }

    pub fn failing_on(mut self, label: SourceLabel) -> Self {
        self.failing = Some(label);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<(SourceLabel, u32, u32)> {
        let mut requests = self.requests.lock().unwrap().clone();
        requests.sort();
        requests
    }

    pub fn calls_per_label(&self) -> HashMap<SourceLabel, usize> {
        let mut counts = HashMap::new();
        for (label, _, _) in self.requests.lock().unwrap().iter() {
            *counts.entry(*label).or_insert(0) += 1;
        }
        counts
    }

    pub fn total_items(&self) -> usize {
        self.transfers.len() + self.rewards.len() + self.extrinsics.len()
    }
}

fn slice<T: Clone>(records: &[T], row: u32, page: u32) -> Vec<T> {
    let start = (row as usize) * (page as usize);
    if start >= records.len() {
        return Vec::new();
    }
    let end = (start + row as usize).min(records.len());
    records[start..end].to_vec()
}

#[async_trait]
impl HistorySourceClient for DatasetClient {
    async fn fetch_page(
        &self,
        label: SourceLabel,
        _address: &str,
        row: u32,
        page: u32,
    ) -> HistoryResult<RawPage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push((label, row, page));

        if self.failing == Some(label) {
            return Err(HistoryError::network_error("Explorer unavailable"));
        }

        Ok(match label {
            SourceLabel::Transfers => RawPage::Transfers(slice(&self.transfers, row, page)),
            SourceLabel::Rewards => RawPage::Rewards(slice(&self.rewards, row, page)),
            SourceLabel::Extrinsics => RawPage::Extrinsics(slice(&self.extrinsics, row, page)),
        })
    }
}
