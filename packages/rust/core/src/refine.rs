//! Outline refinement: append the fixed elaboration suffix to each record.
//!
//! A pure, order-preserving map over an [`OutlineBatch`]. Only
//! `outline_body` changes; `group_summary` and `idea` pass through
//! untouched. Refined batches are derived output — the core never persists
//! them.

use keywordforge_shared::{KeywordForgeError, OutlineBatch, OutlineRecord, RefinedOutlineBatch, Result};

/// Elaboration guidance appended to every refined outline body.
pub const REFINEMENT_SUFFIX: &str = "\n\nRefined version: Add more examples and subpoints";

/// Refine a previously synthesized outline batch.
///
/// Returns [`KeywordForgeError::EmptyBatch`] when the batch has no records.
pub fn refine(batch: &OutlineBatch) -> Result<RefinedOutlineBatch> {
    if batch.records.is_empty() {
        return Err(KeywordForgeError::empty_batch("outline batch has no records"));
    }

    let records = batch
        .records
        .iter()
        .map(|record| OutlineRecord {
            group_summary: record.group_summary.clone(),
            idea: record.idea.clone(),
            outline_body: format!("{}{REFINEMENT_SUFFIX}", record.outline_body),
        })
        .collect();

    Ok(RefinedOutlineBatch {
        records,
        created_at: batch.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn batch(records: Vec<OutlineRecord>) -> OutlineBatch {
        OutlineBatch {
            records,
            created_at: Utc::now(),
        }
    }

    fn record(summary: &str, body: &str) -> OutlineRecord {
        OutlineRecord {
            group_summary: summary.into(),
            idea: format!("Idea about {summary}"),
            outline_body: body.into(),
        }
    }

    #[test]
    fn appends_exactly_the_fixed_suffix() {
        let refined = refine(&batch(vec![record("seo", "A\nB")])).expect("refine");
        assert_eq!(
            refined.records[0].outline_body,
            format!("A\nB{REFINEMENT_SUFFIX}")
        );
        assert_eq!(refined.records[0].group_summary, "seo");
        assert_eq!(refined.records[0].idea, "Idea about seo");
    }

    #[test]
    fn preserves_order_and_length() {
        let source = batch(vec![record("one", "x"), record("two", "y"), record("three", "z")]);
        let refined = refine(&source).expect("refine");
        assert_eq!(refined.records.len(), 3);
        for (before, after) in source.records.iter().zip(&refined.records) {
            assert_eq!(before.group_summary, after.group_summary);
            assert_eq!(before.idea, after.idea);
            assert!(after.outline_body.starts_with(&before.outline_body));
        }
    }

    #[test]
    fn keeps_source_timestamp() {
        let source = batch(vec![record("seo", "x")]);
        let refined = refine(&source).expect("refine");
        assert_eq!(refined.created_at, source.created_at);
    }

    #[test]
    fn empty_batch_is_rejected() {
        let err = refine(&batch(vec![])).expect_err("should reject");
        assert!(matches!(err, KeywordForgeError::EmptyBatch { .. }));
    }
}
