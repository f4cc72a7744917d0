//! Cluster engine: partitions the keyword pool into semantic groups.
//!
//! Keywords are embedded via an [`Embedder`](keywordforge_embeddings::Embedder)
//! and partitioned with fixed-seed k-means, so repeated runs over identical
//! input produce identical group assignments.

mod engine;
mod kmeans;

pub use engine::{CLUSTER_SEED, cluster};
