//! Shared types for the history core
//!
//! All data structures that cross module boundaries are defined here
//! for consistent serialization and FFI compatibility.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::history::HistoryContext;

// =============================================================================
// Source Labels
// =============================================================================

/// Remote source a history item originates from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLabel {
    Transfers,
    Rewards,
    Extrinsics,
}

impl SourceLabel {
    /// Every label, in the order contexts are advanced
    pub fn all() -> [SourceLabel; 3] {
        [SourceLabel::Transfers, SourceLabel::Rewards, SourceLabel::Extrinsics]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Transfers => "transfers",
            SourceLabel::Rewards => "rewards",
            SourceLabel::Extrinsics => "extrinsics",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SourceLabel::all()
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown history source: {}", s))
    }
}

// =============================================================================
// Raw Records (as served by the explorer)
// =============================================================================

/// Balance transfer record
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransferRecord {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub to: String,
    /// `"<block>-<index>"`
    #[serde(default)]
    pub extrinsic_index: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub hash: String,
    pub block_num: u64,
    #[serde(default)]
    pub block_timestamp: i64,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub fee: String,
}

/// Staking reward or slash event
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RewardRecord {
    /// `"<block>-<index>"`
    #[serde(default)]
    pub event_index: String,
    pub block_num: u64,
    #[serde(default)]
    pub extrinsic_idx: u32,
    #[serde(default)]
    pub module_id: String,
    /// `"Reward"` or `"Slash"`
    #[serde(default)]
    pub event_id: String,
    #[serde(default)]
    pub extrinsic_hash: String,
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub block_timestamp: i64,
}

impl RewardRecord {
    pub fn is_slash(&self) -> bool {
        self.event_id.eq_ignore_ascii_case("slash")
    }
}

/// Signed extrinsic submitted by the account
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtrinsicRecord {
    pub block_num: u64,
    #[serde(default)]
    pub block_timestamp: i64,
    /// `"<block>-<index>"`
    #[serde(default)]
    pub extrinsic_index: String,
    #[serde(default)]
    pub call_module: String,
    #[serde(default)]
    pub call_module_function: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub fee: String,
    #[serde(default)]
    pub extrinsic_hash: String,
}

/// Parse the index part of a `"<block>-<index>"` identifier.
/// Unparsable identifiers sort as index 0.
pub fn parse_extrinsic_index(identifier: &str) -> u32 {
    identifier
        .rsplit_once('-')
        .and_then(|(_, index)| index.trim().parse().ok())
        .unwrap_or(0)
}

// =============================================================================
// History Items
// =============================================================================

/// Source-specific part of a history item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "record", rename_all = "snake_case")]
pub enum HistoryPayload {
    Transfer(TransferRecord),
    Reward(RewardRecord),
    Extrinsic(ExtrinsicRecord),
}

/// A single historical event, ordered by `(block_number, extrinsic_index)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub block_number: u64,
    pub extrinsic_index: u32,
    pub label: SourceLabel,
    pub payload: HistoryPayload,
}

impl HistoryItem {
    pub fn from_transfer(record: TransferRecord) -> Self {
        Self {
            block_number: record.block_num,
            extrinsic_index: parse_extrinsic_index(&record.extrinsic_index),
            label: SourceLabel::Transfers,
            payload: HistoryPayload::Transfer(record),
        }
    }

    pub fn from_reward(record: RewardRecord) -> Self {
        Self {
            block_number: record.block_num,
            extrinsic_index: record.extrinsic_idx,
            label: SourceLabel::Rewards,
            payload: HistoryPayload::Reward(record),
        }
    }

    pub fn from_extrinsic(record: ExtrinsicRecord) -> Self {
        Self {
            block_number: record.block_num,
            extrinsic_index: parse_extrinsic_index(&record.extrinsic_index),
            label: SourceLabel::Extrinsics,
            payload: HistoryPayload::Extrinsic(record),
        }
    }

    /// Explorer identifier of the underlying record
    pub fn identifier(&self) -> &str {
        match &self.payload {
            HistoryPayload::Transfer(t) => &t.hash,
            HistoryPayload::Reward(r) => &r.event_index,
            HistoryPayload::Extrinsic(e) => &e.extrinsic_hash,
        }
    }
}

// =============================================================================
// Page Responses
// =============================================================================

/// One merged page plus the context to resume from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPage {
    pub items: Vec<HistoryItem>,
    pub context: HistoryContext,
}

/// Standard API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<crate::error::HistoryError>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: crate::error::HistoryError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"success":false,"error":{"code":"internal","message":"Serialization failed"}}"#.to_string()
        })
    }
}
