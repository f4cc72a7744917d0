//! The clustering contract: keywords in, [`ClusterSnapshot`] out.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};

use keywordforge_embeddings::Embedder;
use keywordforge_shared::{ClusterSnapshot, KeywordForgeError, Result};

use crate::kmeans::kmeans;

/// Fixed seed for centroid initialization. Determinism over identical input
/// is a correctness requirement, not a promise of semantic stability.
pub const CLUSTER_SEED: u64 = 42;

/// Iteration cap for the partition loop.
const MAX_ITERS: usize = 100;

/// Partition `keywords` into at most `max_groups` semantic groups.
///
/// The group count is `min(max_groups, distinct keyword count)`. Duplicate
/// keywords are tolerated: identical text embeds to the identical vector and
/// lands in the same group, and `k` is derived from the distinct count, so
/// both the coverage and group-bound invariants hold either way. Group
/// labels are dense `0..k` indices in first-appearance order of the input —
/// transient per run, never durable keys.
///
/// Provider failures surface as
/// [`KeywordForgeError::EmbeddingUnavailable`]; nothing is persisted here,
/// so the caller can simply retry.
pub async fn cluster<E: Embedder>(
    keywords: &[String],
    embedder: &E,
    max_groups: u32,
) -> Result<ClusterSnapshot> {
    if keywords.is_empty() {
        return Err(KeywordForgeError::validation(
            "cluster requires at least one keyword",
        ));
    }
    if max_groups == 0 {
        return Err(KeywordForgeError::validation("max_groups must be >= 1"));
    }

    let distinct: HashSet<&String> = keywords.iter().collect();
    let k = (max_groups as usize).min(distinct.len());

    debug!(
        keywords = keywords.len(),
        distinct = distinct.len(),
        k,
        "clustering keyword pool"
    );

    let vectors = embedder.embed(keywords).await?;
    if vectors.len() != keywords.len() {
        return Err(KeywordForgeError::EmbeddingUnavailable(format!(
            "provider returned {} vectors for {} keywords",
            vectors.len(),
            keywords.len()
        )));
    }
    let dim = vectors[0].len();
    if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
        return Err(KeywordForgeError::EmbeddingUnavailable(
            "provider returned vectors of mismatched dimension".into(),
        ));
    }

    let raw_labels = kmeans(&vectors, k, CLUSTER_SEED, MAX_ITERS);

    // Relabel to dense 0..k in first-appearance order of the input.
    let mut relabel: HashMap<usize, u32> = HashMap::new();
    let mut groups: BTreeMap<u32, Vec<String>> = BTreeMap::new();
    for (keyword, &raw) in keywords.iter().zip(&raw_labels) {
        let next = relabel.len() as u32;
        let label = *relabel.entry(raw).or_insert(next);
        groups.entry(label).or_default().push(keyword.clone());
    }

    info!(groups = groups.len(), keywords = keywords.len(), "clustering complete");

    Ok(ClusterSnapshot {
        groups,
        created_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use keywordforge_embeddings::HashEmbedder;

    /// Embedder with hand-placed vectors so group membership is predictable.
    struct StubEmbedder;

    impl Embedder for StubEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let vectors = texts
                .iter()
                .map(|t| match t.as_str() {
                    "seo" => vec![0.0, 0.1],
                    "sem" => vec![0.1, 0.0],
                    "espresso" => vec![10.0, 10.0],
                    "latte" => vec![10.1, 9.9],
                    other => vec![other.len() as f32 * 3.0, 50.0],
                })
                .collect();
            Ok(vectors)
        }
    }

    /// Embedder that collapses every input to one vector, as a quantized
    /// or otherwise degenerate provider might.
    struct ConstantEmbedder;

    impl Embedder for ConstantEmbedder {
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(vec![vec![1.0, 1.0]; texts.len()])
        }
    }

    /// Embedder that always fails, for propagation tests.
    struct DownEmbedder;

    impl Embedder for DownEmbedder {
        async fn embed(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(KeywordForgeError::EmbeddingUnavailable("connection refused".into()))
        }
    }

    fn pool(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn related_keywords_share_a_group() {
        let snapshot = cluster(&pool(&["seo", "espresso", "sem", "latte"]), &StubEmbedder, 2)
            .await
            .expect("cluster");

        assert_eq!(snapshot.groups.len(), 2);
        // Labels follow first-appearance order: "seo" opens group 0.
        assert_eq!(snapshot.groups[&0], vec!["seo", "sem"]);
        assert_eq!(snapshot.groups[&1], vec!["espresso", "latte"]);
    }

    #[tokio::test]
    async fn repeated_runs_are_identical() {
        let keywords = pool(&["seo", "ppc", "email", "crm", "content marketing", "link building"]);
        let embedder = HashEmbedder::new();
        let a = cluster(&keywords, &embedder, 3).await.expect("first run");
        let b = cluster(&keywords, &embedder, 3).await.expect("second run");
        assert_eq!(a.groups, b.groups);
    }

    #[tokio::test]
    async fn coverage_is_a_multiset_identity() {
        let keywords = pool(&["seo", "ppc", "email", "crm", "seo"]);
        let snapshot = cluster(&keywords, &HashEmbedder::new(), 5).await.expect("cluster");

        let mut flattened: Vec<String> = snapshot.groups.values().flatten().cloned().collect();
        let mut expected = keywords.clone();
        flattened.sort();
        expected.sort();
        assert_eq!(flattened, expected);
    }

    #[tokio::test]
    async fn group_count_is_bounded_by_distinct_keywords() {
        // 5 entries, 4 distinct: expect min(5, 4) = 4 groups
        let keywords = pool(&["seo", "ppc", "email", "crm", "seo"]);
        let snapshot = cluster(&keywords, &HashEmbedder::new(), 5).await.expect("cluster");
        assert_eq!(snapshot.groups.len(), 4);

        let snapshot = cluster(&keywords, &HashEmbedder::new(), 2).await.expect("cluster");
        assert_eq!(snapshot.groups.len(), 2);
    }

    #[tokio::test]
    async fn single_keyword_forces_one_group() {
        let snapshot = cluster(&pool(&["seo"]), &HashEmbedder::new(), 5).await.expect("cluster");
        assert_eq!(snapshot.groups.len(), 1);
        assert_eq!(snapshot.groups[&0], vec!["seo"]);
    }

    #[tokio::test]
    async fn labels_are_dense_and_ascending() {
        let keywords = pool(&["a", "bb", "ccc", "dddd", "eeeee", "ffffff"]);
        let snapshot = cluster(&keywords, &HashEmbedder::new(), 4).await.expect("cluster");
        let labels: Vec<u32> = snapshot.groups.keys().copied().collect();
        assert_eq!(labels, (0..snapshot.groups.len() as u32).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn collapsed_embeddings_still_partition_distinct_keywords() {
        // Distinct keywords, identical vectors: the group-count invariant
        // holds and no keyword is dropped.
        let snapshot = cluster(&pool(&["alpha", "beta"]), &ConstantEmbedder, 2)
            .await
            .expect("cluster");
        assert_eq!(snapshot.groups.len(), 2);
        assert_eq!(snapshot.keyword_count(), 2);

        let snapshot = cluster(&pool(&["alpha", "beta", "gamma"]), &ConstantEmbedder, 2)
            .await
            .expect("cluster");
        assert_eq!(snapshot.groups.len(), 2);
        assert_eq!(snapshot.keyword_count(), 3);
    }

    #[tokio::test]
    async fn provider_failure_propagates_as_unavailable() {
        let err = cluster(&pool(&["seo"]), &DownEmbedder, 5).await.expect_err("should fail");
        assert!(matches!(err, KeywordForgeError::EmbeddingUnavailable(_)));
    }

    #[tokio::test]
    async fn empty_pool_is_rejected() {
        let err = cluster(&[], &HashEmbedder::new(), 5).await.expect_err("should fail");
        assert!(matches!(err, KeywordForgeError::Validation { .. }));
    }
}
