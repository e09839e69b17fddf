//! History Aggregator
//!
//! Fans out to every unfinished source concurrently, merges the pages and
//! derives the context the caller resumes from.

use super::client::{HistorySourceClient, RawPage};
use super::context::HistoryContext;
use super::merger::{self, MergeResult, SourcePages};
use crate::error::{HistoryError, HistoryResult};
use crate::types::{HistoryPage, SourceLabel};
use crate::{log_debug, log_info, log_warn};

const MODULE: &str = "history::aggregator";

/// Orchestrates page requests against an injected source client
pub struct HistoryAggregator<C> {
    client: C,
}

impl<C: HistorySourceClient> HistoryAggregator<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Request the next merged page for `address`.
    ///
    /// A complete context is returned unchanged with no items and no
    /// fetches. If any dispatched fetch fails the whole call fails and
    /// the caller's context stays valid for a retry.
    pub async fn request_next_page(
        &self,
        context: &HistoryContext,
        address: &str,
    ) -> HistoryResult<HistoryPage> {
        if address.trim().is_empty() {
            return Err(HistoryError::invalid_address("Address must not be empty"));
        }
        context.validate()?;

        if context.is_complete() {
            log_debug!(MODULE, "History already complete", address = address);
            return Ok(HistoryPage {
                items: Vec::new(),
                context: *context,
            });
        }

        log_debug!(
            MODULE,
            "Requesting history page",
            address = address,
            sources = format!("{:?}", context.pending_sources()),
        );

        let pages = match self.fetch_pages(context, address).await {
            Ok(pages) => pages,
            Err(e) => {
                log_warn!(MODULE, "History page request failed", error = e);
                return Err(e);
            }
        };

        let merged = merger::merge(pages, context);
        let next_context = advance_context(context, &merged)?;

        log_info!(
            MODULE,
            "History page merged",
            items = merged.items.len(),
            complete = next_context.is_complete(),
        );

        Ok(HistoryPage {
            items: merged.items,
            context: next_context,
        })
    }

    async fn fetch_pages(&self, context: &HistoryContext, address: &str) -> HistoryResult<SourcePages> {
        let (transfers, rewards, extrinsics) = tokio::try_join!(
            self.fetch_if_needed(context, SourceLabel::Transfers, address),
            self.fetch_if_needed(context, SourceLabel::Rewards, address),
            self.fetch_if_needed(context, SourceLabel::Extrinsics, address),
        )?;

        Ok(SourcePages {
            transfers,
            rewards,
            extrinsics,
        })
    }

    async fn fetch_if_needed(
        &self,
        context: &HistoryContext,
        label: SourceLabel,
        address: &str,
    ) -> HistoryResult<Option<RawPage>> {
        let cursor = context.source_context(label);
        if cursor.is_complete {
            return Ok(None);
        }

        let page = self
            .client
            .fetch_page(label, address, cursor.row, cursor.page)
            .await
            .map_err(|e| match e.source_label {
                Some(_) => e,
                None => e.with_source(label),
            })?;

        if page.label() != label {
            return Err(HistoryError::invariant_violation(format!(
                "Client answered {} request with a {} page",
                label,
                page.label()
            ))
            .with_source(label));
        }

        Ok(Some(page))
    }
}

/// Largest page size in `1..=default_row` that divides `total`.
///
/// Divisors come in pairs `(i, total / i)`, so at most
/// `min(default_row, sqrt(total))` candidates are tried.
pub fn first_divider(total: u64, default_row: u32) -> u32 {
    let limit = u64::from(default_row.max(1));
    if total == 0 {
        return default_row.max(1);
    }
    if total <= limit {
        return total as u32;
    }

    let mut best = 1;
    let mut i = 1;
    while i <= limit && i <= total / i {
        if total % i == 0 {
            let pair = total / i;
            // Pairs shrink as `i` grows: the first one that fits is the largest.
            if pair <= limit {
                return pair as u32;
            }
            best = i;
        }
        i += 1;
    }
    best as u32
}

/// Derive the next context from a merge round.
///
/// Complete cursors are left untouched. Every other cursor is repositioned
/// so that `page * row` equals the number of its items handed out so far,
/// and is marked complete only when the source ran dry and none of its
/// items were cut off by truncation.
pub fn advance_context(context: &HistoryContext, merged: &MergeResult) -> HistoryResult<HistoryContext> {
    let filtered = merged.filtered_counters();

    SourceLabel::all()
        .into_iter()
        .try_fold(*context, |result, label| {
            let cursor = result.source_context(label);
            if cursor.is_complete {
                return Ok(result);
            }

            let filtered_count = filtered.get(&label).copied().unwrap_or(0);
            let total = cursor.consumed() + filtered_count as u64;
            let row = first_divider(total, result.default_row);
            let next_page = u32::try_from(total / u64::from(row)).map_err(|_| {
                HistoryError::invariant_violation(format!("{} page index overflow", label))
                    .with_source(label)
            })?;

            let original_count = merged.original_count(label);
            let is_completed = if original_count == filtered_count {
                (original_count as u64) < u64::from(cursor.row)
            } else {
                false
            };

            let next_cursor = cursor
                .by_replacing_page(next_page)
                .by_replacing_row(row)
                .by_replacing_completion(is_completed);

            Ok(result.by_replacing_source(next_cursor, label))
        })
}
