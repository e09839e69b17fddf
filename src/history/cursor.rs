//! Per-source pagination state

use serde::{Deserialize, Serialize};

use crate::error::{HistoryError, HistoryResult};
use crate::types::SourceLabel;

/// Pagination position of one remote source.
///
/// `row` is the page size requested from the source and is never zero.
/// Once `is_complete` is set it stays set for the lifetime of the
/// context; a new address or filter starts from a fresh context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceCursor {
    pub page: u32,
    pub row: u32,
    pub is_complete: bool,
}

impl SourceCursor {
    /// Cursor at the first page
    pub fn new(row: u32) -> Self {
        Self {
            page: 0,
            row,
            is_complete: false,
        }
    }

    pub fn by_replacing_page(self, page: u32) -> Self {
        Self { page, ..self }
    }

    pub fn by_replacing_row(self, row: u32) -> Self {
        Self { row, ..self }
    }

    pub fn by_replacing_completion(self, is_complete: bool) -> Self {
        Self { is_complete, ..self }
    }

    /// Items of this source already consumed by earlier pages
    pub fn consumed(&self) -> u64 {
        u64::from(self.page) * u64::from(self.row)
    }

    pub(crate) fn validate(&self, label: SourceLabel) -> HistoryResult<()> {
        if self.row == 0 {
            return Err(HistoryError::invariant_violation(format!(
                "{} cursor has zero row size",
                label
            ))
            .with_source(label));
        }
        Ok(())
    }
}
