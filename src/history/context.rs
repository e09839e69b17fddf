//! Resumable aggregation state across all sources

use serde::{Deserialize, Serialize};

use super::cursor::SourceCursor;
use crate::config::MAX_ROW;
use crate::error::{HistoryError, HistoryResult};
use crate::types::SourceLabel;

/// Position of every remote source plus the preferred page size.
///
/// Owned by the caller for the duration of a history session and passed
/// back on every page request. The core never mutates a context in place:
/// advancing returns a new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryContext {
    pub transfers: SourceCursor,
    pub rewards: SourceCursor,
    pub extrinsics: SourceCursor,
    pub default_row: u32,
}

impl HistoryContext {
    /// Fresh context with every source at page 0
    pub fn new(default_row: u32) -> Self {
        Self {
            transfers: SourceCursor::new(default_row),
            rewards: SourceCursor::new(default_row),
            extrinsics: SourceCursor::new(default_row),
            default_row,
        }
    }

    /// Fresh context that only queries `sources`; every other source
    /// starts out complete. Used when the history filter excludes some.
    pub fn for_sources(default_row: u32, sources: &[SourceLabel]) -> Self {
        SourceLabel::all()
            .into_iter()
            .filter(|label| !sources.contains(label))
            .fold(Self::new(default_row), |context, label| {
                let skipped = context.source_context(label).by_replacing_completion(true);
                context.by_replacing_source(skipped, label)
            })
    }

    /// True iff all three sources are complete
    pub fn is_complete(&self) -> bool {
        self.transfers.is_complete && self.rewards.is_complete && self.extrinsics.is_complete
    }

    pub fn source_context(&self, label: SourceLabel) -> SourceCursor {
        match label {
            SourceLabel::Transfers => self.transfers,
            SourceLabel::Rewards => self.rewards,
            SourceLabel::Extrinsics => self.extrinsics,
        }
    }

    pub fn by_replacing_source(self, cursor: SourceCursor, label: SourceLabel) -> Self {
        match label {
            SourceLabel::Transfers => Self { transfers: cursor, ..self },
            SourceLabel::Rewards => Self { rewards: cursor, ..self },
            SourceLabel::Extrinsics => Self { extrinsics: cursor, ..self },
        }
    }

    /// Labels whose cursor still has data to fetch
    pub fn pending_sources(&self) -> Vec<SourceLabel> {
        SourceLabel::all()
            .into_iter()
            .filter(|label| !self.source_context(*label).is_complete)
            .collect()
    }

    /// Fail fast on cursor state no correct caller can produce
    pub fn validate(&self) -> HistoryResult<()> {
        if self.default_row == 0 {
            return Err(HistoryError::invariant_violation("default row size is zero"));
        }
        if self.default_row > MAX_ROW {
            return Err(HistoryError::invariant_violation(format!(
                "default row size {} exceeds {}",
                self.default_row, MAX_ROW
            )));
        }
        for label in SourceLabel::all() {
            self.source_context(label).validate(label)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_is_incomplete() {
        let context = HistoryContext::new(100);
        assert!(!context.is_complete());
        assert_eq!(context.pending_sources().len(), 3);
        for label in SourceLabel::all() {
            assert_eq!(context.source_context(label), SourceCursor::new(100));
        }
    }

    #[test]
    fn test_completion_requires_all_sources() {
        let done = SourceCursor::new(10).by_replacing_completion(true);
        let context = HistoryContext::new(10)
            .by_replacing_source(done, SourceLabel::Transfers)
            .by_replacing_source(done, SourceLabel::Rewards);

        assert!(!context.is_complete());
        assert_eq!(context.pending_sources(), vec![SourceLabel::Extrinsics]);
        assert!(context
            .by_replacing_source(done, SourceLabel::Extrinsics)
            .is_complete());
    }

    #[test]
    fn test_replacing_source_leaves_others() {
        let original = HistoryContext::new(10);
        let cursor = SourceCursor::new(5).by_replacing_page(2);
        let replaced = original.by_replacing_source(cursor, SourceLabel::Rewards);

        assert_eq!(replaced.rewards, cursor);
        assert_eq!(replaced.transfers, original.transfers);
        assert_eq!(replaced.extrinsics, original.extrinsics);
        assert_eq!(replaced.default_row, 10);
    }

    #[test]
    fn test_validate() {
        assert!(HistoryContext::new(10).validate().is_ok());
        assert!(HistoryContext::new(0).validate().is_err());

        let broken = HistoryContext::new(10)
            .by_replacing_source(SourceCursor::new(0), SourceLabel::Extrinsics);
        let err = broken.validate().unwrap_err();
        assert_eq!(err.source_label, Some(SourceLabel::Extrinsics));
    }

    #[test]
    fn test_default_row_cap() {
        assert!(HistoryContext::new(MAX_ROW).validate().is_ok());
        let err = HistoryContext::new(MAX_ROW + 1).validate().unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::InvariantViolation);
    }

    #[test]
    fn test_for_sources_skips_unselected() {
        let context = HistoryContext::for_sources(20, &[SourceLabel::Rewards]);
        assert_eq!(context.pending_sources(), vec![SourceLabel::Rewards]);
        assert!(context.transfers.is_complete);
        assert_eq!(context.transfers.page, 0);
        assert_eq!(context.rewards, SourceCursor::new(20));

        assert_eq!(
            HistoryContext::for_sources(20, &SourceLabel::all()),
            HistoryContext::new(20)
        );
        assert!(HistoryContext::for_sources(20, &[]).is_complete());
    }

    #[test]
    fn test_context_json_roundtrip() {
        let context = HistoryContext::new(50)
            .by_replacing_source(SourceCursor::new(25).by_replacing_page(2), SourceLabel::Transfers);
        let json = serde_json::to_string(&context).unwrap();
        let restored: HistoryContext = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, context);
    }
}
