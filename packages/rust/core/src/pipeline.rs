//! End-to-end pipeline operations: submission → pool → clusters → outlines.
//!
//! Each operation is one user-visible command. The only state between
//! invocations is the append-only record log owned by
//! [`Storage`](keywordforge_storage::Storage); "latest" is always resolved
//! through the store, never through in-process globals. Failures persist
//! nothing, so every operation is safe to retry.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use keywordforge_cluster::cluster;
use keywordforge_embeddings::Embedder;
use keywordforge_shared::{
    BatchId, ClusterSnapshot, KeywordBatch, KeywordForgeError, OutlineBatch, RefinedOutlineBatch,
    Result,
};
use keywordforge_storage::Storage;

use crate::refine::refine;
use crate::synthesis::synthesize;

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
}

// ---------------------------------------------------------------------------
// Ingest
// ---------------------------------------------------------------------------

/// Result of one keyword submission.
#[derive(Debug)]
pub struct IngestResult {
    /// Identifier of the persisted batch.
    pub batch_id: BatchId,
    /// Number of cleaned keywords saved.
    pub keyword_count: usize,
}

/// Normalize a raw submission and append it as a keyword batch.
#[instrument(skip_all, fields(submitter = %submitter_id))]
pub async fn ingest(
    storage: &Storage,
    submitter_id: &str,
    raw_text: &str,
    progress: &dyn ProgressReporter,
) -> Result<IngestResult> {
    progress.phase("Cleaning keywords");
    let cleaned = keywordforge_normalize::normalize(raw_text)?;
    let raw = keywordforge_normalize::raw_tokens(raw_text);

    let batch = KeywordBatch {
        id: BatchId::new(),
        submitter_id: submitter_id.to_string(),
        raw_keywords: raw,
        cleaned_keywords: cleaned,
        created_at: Utc::now(),
    };

    progress.phase("Saving keyword batch");
    storage.append_keyword_batch(&batch).await?;

    info!(
        batch_id = %batch.id,
        keywords = batch.cleaned_keywords.len(),
        "keyword batch ingested"
    );

    Ok(IngestResult {
        keyword_count: batch.cleaned_keywords.len(),
        batch_id: batch.id,
    })
}

// ---------------------------------------------------------------------------
// Group
// ---------------------------------------------------------------------------

/// Result of one clustering run.
#[derive(Debug)]
pub struct GroupResult {
    /// The persisted snapshot.
    pub snapshot: ClusterSnapshot,
    /// Pool size before global deduplication.
    pub pool_size: usize,
    /// Distinct keywords fed into the engine.
    pub distinct_count: usize,
}

/// Cluster the accumulated keyword pool and persist the snapshot.
///
/// The pool is deduplicated globally before clustering: the first
/// occurrence of a keyword (across all batches, in insertion order) wins.
#[instrument(skip_all, fields(max_groups))]
pub async fn group<E: Embedder>(
    storage: &Storage,
    embedder: &E,
    max_groups: u32,
    progress: &dyn ProgressReporter,
) -> Result<GroupResult> {
    progress.phase("Loading keyword pool");
    let pool = storage.accumulated_keywords().await?;
    if pool.is_empty() {
        return Err(KeywordForgeError::empty_input(
            "no keywords found; run ingest first",
        ));
    }

    let pool_size = pool.len();
    let mut seen = std::collections::HashSet::new();
    let distinct: Vec<String> = pool
        .into_iter()
        .filter(|k| seen.insert(k.clone()))
        .collect();

    progress.phase("Embedding and clustering");
    let snapshot = cluster(&distinct, embedder, max_groups).await?;

    progress.phase("Saving cluster snapshot");
    storage.append_cluster_snapshot(&snapshot).await?;

    info!(
        pool = pool_size,
        distinct = distinct.len(),
        groups = snapshot.groups.len(),
        "cluster snapshot saved"
    );

    Ok(GroupResult {
        snapshot,
        pool_size,
        distinct_count: distinct.len(),
    })
}

// ---------------------------------------------------------------------------
// Outlines
// ---------------------------------------------------------------------------

/// Synthesize outlines from the latest cluster snapshot and persist them.
#[instrument(skip_all)]
pub async fn generate_outlines(
    storage: &Storage,
    progress: &dyn ProgressReporter,
) -> Result<OutlineBatch> {
    progress.phase("Loading latest cluster snapshot");
    let snapshot = storage.latest_cluster_snapshot().await?.ok_or_else(|| {
        KeywordForgeError::empty_snapshot("no cluster snapshot found; run group first")
    })?;

    progress.phase("Synthesizing outlines");
    let records = synthesize(&snapshot)?;

    let batch = OutlineBatch {
        records,
        created_at: Utc::now(),
    };

    progress.phase("Saving outline batch");
    storage.append_outline_batch(&batch).await?;

    info!(records = batch.records.len(), "outline batch saved");

    Ok(batch)
}

/// Refine the latest outline batch.
///
/// The refined result is returned, not persisted — persistence of refined
/// output is the caller's decision.
#[instrument(skip_all)]
pub async fn refine_latest(
    storage: &Storage,
    progress: &dyn ProgressReporter,
) -> Result<RefinedOutlineBatch> {
    progress.phase("Loading latest outline batch");
    let batch = storage.latest_outline_batch().await?.ok_or_else(|| {
        KeywordForgeError::empty_batch("no outline batch found; run outline first")
    })?;

    progress.phase("Refining outlines");
    refine(&batch)
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// One row of outline history.
#[derive(Debug)]
pub struct HistoryEntry {
    /// When the batch was persisted.
    pub created_at: DateTime<Utc>,
    /// Group summaries of the batch's records, in record order.
    pub group_summaries: Vec<String>,
}

/// The `n` most recent outline batches, newest first.
pub async fn history(storage: &Storage, n: u32) -> Result<Vec<HistoryEntry>> {
    let batches = storage.latest_outline_batches(n).await?;
    Ok(batches
        .into_iter()
        .map(|batch| HistoryEntry {
            created_at: batch.created_at,
            group_summaries: batch
                .records
                .iter()
                .map(|r| r.group_summary.clone())
                .collect(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refine::REFINEMENT_SUFFIX;
    use keywordforge_embeddings::HashEmbedder;
    use uuid::Uuid;

    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("kf_core_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    #[tokio::test]
    async fn full_pipeline_roundtrip() {
        let storage = test_storage().await;
        let embedder = HashEmbedder::new();

        let ingested = ingest(&storage, "U1", "SEO, seo , Marketing", &SilentProgress)
            .await
            .expect("ingest");
        assert_eq!(ingested.keyword_count, 2);

        ingest(&storage, "U2", "ppc, email, crm", &SilentProgress)
            .await
            .expect("second ingest");

        let grouped = group(&storage, &embedder, 5, &SilentProgress)
            .await
            .expect("group");
        assert_eq!(grouped.pool_size, 5);
        assert_eq!(grouped.distinct_count, 5);
        assert_eq!(grouped.snapshot.groups.len(), 5);

        let outlines = generate_outlines(&storage, &SilentProgress)
            .await
            .expect("outlines");
        assert_eq!(outlines.records.len(), 5);

        let refined = refine_latest(&storage, &SilentProgress)
            .await
            .expect("refine");
        assert_eq!(refined.records.len(), 5);
        for (before, after) in outlines.records.iter().zip(&refined.records) {
            assert_eq!(before.group_summary, after.group_summary);
            assert_eq!(before.idea, after.idea);
            assert_eq!(
                after.outline_body,
                format!("{}{REFINEMENT_SUFFIX}", before.outline_body)
            );
        }

        let rows = history(&storage, 10).await.expect("history");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].group_summaries.len(), 5);
    }

    #[tokio::test]
    async fn pool_is_deduplicated_globally_before_clustering() {
        let storage = test_storage().await;

        ingest(&storage, "U1", "seo, ppc", &SilentProgress).await.unwrap();
        ingest(&storage, "U1", "seo, email", &SilentProgress).await.unwrap();

        let grouped = group(&storage, &HashEmbedder::new(), 5, &SilentProgress)
            .await
            .expect("group");
        assert_eq!(grouped.pool_size, 4);
        assert_eq!(grouped.distinct_count, 3);
        assert_eq!(grouped.snapshot.groups.len(), 3);
        assert_eq!(grouped.snapshot.keyword_count(), 3);
    }

    #[tokio::test]
    async fn empty_submission_persists_nothing() {
        let storage = test_storage().await;

        let err = ingest(&storage, "U1", ",, ,", &SilentProgress)
            .await
            .expect_err("should reject");
        assert!(matches!(err, KeywordForgeError::EmptyInput { .. }));
        assert!(storage.accumulated_keywords().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn group_without_keywords_is_rejected() {
        let storage = test_storage().await;
        let err = group(&storage, &HashEmbedder::new(), 5, &SilentProgress)
            .await
            .expect_err("should reject");
        assert!(matches!(err, KeywordForgeError::EmptyInput { .. }));
        // No partial snapshot persisted
        assert!(storage.latest_cluster_snapshot().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn outlines_without_snapshot_are_rejected() {
        let storage = test_storage().await;
        let err = generate_outlines(&storage, &SilentProgress)
            .await
            .expect_err("should reject");
        assert!(matches!(err, KeywordForgeError::EmptySnapshot { .. }));
        assert!(storage.latest_outline_batch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refine_without_outlines_is_rejected() {
        let storage = test_storage().await;
        let err = refine_latest(&storage, &SilentProgress)
            .await
            .expect_err("should reject");
        assert!(matches!(err, KeywordForgeError::EmptyBatch { .. }));
    }

    #[tokio::test]
    async fn regenerate_uses_latest_snapshot() {
        let storage = test_storage().await;
        let embedder = HashEmbedder::new();

        ingest(&storage, "U1", "seo, ppc", &SilentProgress).await.unwrap();
        group(&storage, &embedder, 5, &SilentProgress).await.unwrap();
        let first = generate_outlines(&storage, &SilentProgress).await.unwrap();

        // Regenerating from the unchanged latest snapshot yields identical
        // records (timestamps aside).
        let second = generate_outlines(&storage, &SilentProgress).await.unwrap();
        assert_eq!(first.records, second.records);

        let rows = history(&storage, 10).await.expect("history");
        assert_eq!(rows.len(), 2);
    }
}
