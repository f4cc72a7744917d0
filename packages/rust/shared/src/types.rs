//! Core domain types for the KeywordForge pipeline.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{KeywordForgeError, Result};

// ---------------------------------------------------------------------------
// BatchId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for stored record identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchId(pub Uuid);

impl BatchId {
    /// Generate a new time-sortable identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BatchId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// KeywordBatch
// ---------------------------------------------------------------------------

/// One normalized keyword submission, immutable once stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeywordBatch {
    /// Unique batch identifier.
    pub id: BatchId,
    /// Opaque identifier of the submitting user.
    pub submitter_id: String,
    /// Raw comma-separated tokens as submitted, in order.
    pub raw_keywords: Vec<String>,
    /// Lower-cased, trimmed, deduplicated keywords in first-occurrence order.
    pub cleaned_keywords: Vec<String>,
    /// When the batch was persisted.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// ClusterSnapshot
// ---------------------------------------------------------------------------

/// An immutable record of one clustering run over the accumulated pool.
///
/// Group labels are transient per-run indices; they carry no meaning across
/// snapshots and are never used as durable keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    /// Group label → keywords in that group, in original input order.
    pub groups: BTreeMap<u32, Vec<String>>,
    /// When the snapshot was persisted.
    pub created_at: DateTime<Utc>,
}

impl ClusterSnapshot {
    /// Total keyword count across all groups.
    pub fn keyword_count(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

// ---------------------------------------------------------------------------
// OutlineRecord / OutlineBatch
// ---------------------------------------------------------------------------

/// One synthesized outline, derived from a single cluster group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineRecord {
    /// Comma-joined keyword list of the source group.
    pub group_summary: String,
    /// One-line post idea parameterized by the group's topic keyword.
    pub idea: String,
    /// Multi-line outline body.
    pub outline_body: String,
}

/// A batch of outline records synthesized from one cluster snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineBatch {
    /// Records in ascending group-label order.
    pub records: Vec<OutlineRecord>,
    /// When the batch was persisted.
    pub created_at: DateTime<Utc>,
}

/// An outline batch with the elaboration suffix applied to each record.
///
/// Derived, not separately versioned against its source; the core never
/// persists it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedOutlineBatch {
    /// Records in the same order as the source batch.
    pub records: Vec<OutlineRecord>,
    /// Timestamp of the source batch.
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Email validation
// ---------------------------------------------------------------------------

/// Validate an email address for the set-email preference.
///
/// Intentionally loose: one `@` with a dotted domain. Delivery failures are
/// the mail collaborator's problem, not ours.
pub fn validate_email(input: &str) -> Result<&str> {
    let email = input.trim();
    let re = regex::Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("static regex");
    if re.is_match(email) {
        Ok(email)
    } else {
        Err(KeywordForgeError::validation(format!(
            "'{email}' is not a valid email address"
        )))
    }
}
