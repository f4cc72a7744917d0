//! libSQL snapshot store for the KeywordForge pipeline.
//!
//! The [`Storage`] struct wraps a libSQL database holding the append-only,
//! timestamp-ordered record log: keyword batches, cluster snapshots,
//! outline batches, and user email preferences.
//!
//! "Latest" is derived purely by timestamp comparison, with ties broken by
//! insertion order (`created_at DESC, rowid DESC`), giving read-your-writes
//! / last-write-wins semantics. Stored JSON columns are round-tripped into
//! the typed structs at this boundary, so malformed rows surface as
//! `Storage` errors instead of leaking downstream.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};

use keywordforge_shared::{
    ClusterSnapshot, KeywordBatch, KeywordForgeError, OutlineBatch, OutlineRecord, Result,
};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`, applying pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| KeywordForgeError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        let storage = Self { db, conn };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        KeywordForgeError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    // -----------------------------------------------------------------------
    // Keyword batches
    // -----------------------------------------------------------------------

    /// Append a keyword batch to the log.
    pub async fn append_keyword_batch(&self, batch: &KeywordBatch) -> Result<()> {
        let raw_json = serde_json::to_string(&batch.raw_keywords)
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
        let cleaned_json = serde_json::to_string(&batch.cleaned_keywords)
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO keyword_batches (id, submitter_id, raw_keywords, cleaned_keywords, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    batch.id.to_string(),
                    batch.submitter_id.as_str(),
                    raw_json.as_str(),
                    cleaned_json.as_str(),
                    batch.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// The full accumulated keyword pool, concatenated across all batches
    /// in insertion order (duplicates across batches preserved).
    pub async fn accumulated_keywords(&self) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT cleaned_keywords FROM keyword_batches ORDER BY created_at ASC, rowid ASC",
                params![],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        let mut pool = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let json: String = row
                .get(0)
                .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
            let keywords: Vec<String> = serde_json::from_str(&json)
                .map_err(|e| KeywordForgeError::Storage(format!("malformed batch row: {e}")))?;
            pool.extend(keywords);
        }
        Ok(pool)
    }

    // -----------------------------------------------------------------------
    // Cluster snapshots
    // -----------------------------------------------------------------------

    /// Append a cluster snapshot to the log.
    pub async fn append_cluster_snapshot(&self, snapshot: &ClusterSnapshot) -> Result<()> {
        let groups_json = serde_json::to_string(&snapshot.groups)
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO cluster_snapshots (id, groups_json, created_at) VALUES (?1, ?2, ?3)",
                params![
                    uuid::Uuid::now_v7().to_string(),
                    groups_json.as_str(),
                    snapshot.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// The most recent cluster snapshot, if any.
    pub async fn latest_cluster_snapshot(&self) -> Result<Option<ClusterSnapshot>> {
        let mut rows = self
            .conn
            .query(
                "SELECT groups_json, created_at FROM cluster_snapshots
                 ORDER BY created_at DESC, rowid DESC LIMIT 1",
                params![],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let groups_json: String = row
                    .get(0)
                    .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
                let groups = serde_json::from_str(&groups_json)
                    .map_err(|e| KeywordForgeError::Storage(format!("malformed snapshot row: {e}")))?;
                let created_at = parse_timestamp(&row, 1)?;
                Ok(Some(ClusterSnapshot { groups, created_at }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(KeywordForgeError::Storage(e.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Outline batches
    // -----------------------------------------------------------------------

    /// Append an outline batch to the log.
    pub async fn append_outline_batch(&self, batch: &OutlineBatch) -> Result<()> {
        let records_json = serde_json::to_string(&batch.records)
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO outline_batches (id, records_json, created_at) VALUES (?1, ?2, ?3)",
                params![
                    uuid::Uuid::now_v7().to_string(),
                    records_json.as_str(),
                    batch.created_at.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// The `n` most recent outline batches, newest first.
    pub async fn latest_outline_batches(&self, n: u32) -> Result<Vec<OutlineBatch>> {
        let mut rows = self
            .conn
            .query(
                "SELECT records_json, created_at FROM outline_batches
                 ORDER BY created_at DESC, rowid DESC LIMIT ?1",
                params![n],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        let mut batches = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let records_json: String = row
                .get(0)
                .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
            let records: Vec<OutlineRecord> = serde_json::from_str(&records_json)
                .map_err(|e| KeywordForgeError::Storage(format!("malformed outline row: {e}")))?;
            let created_at = parse_timestamp(&row, 1)?;
            batches.push(OutlineBatch {
                records,
                created_at,
            });
        }
        Ok(batches)
    }

    /// The most recent outline batch, if any.
    pub async fn latest_outline_batch(&self) -> Result<Option<OutlineBatch>> {
        Ok(self.latest_outline_batches(1).await?.into_iter().next())
    }

    // -----------------------------------------------------------------------
    // Email preferences
    // -----------------------------------------------------------------------

    /// Upsert the email preference for a user.
    pub async fn upsert_email(&self, user_id: &str, email: &str) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO users (user_id, email, updated_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id) DO UPDATE SET
                   email = excluded.email,
                   updated_at = excluded.updated_at",
                params![user_id, email, now.as_str()],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Look up the email preference for a user.
    pub async fn get_email(&self, user_id: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query(
                "SELECT email FROM users WHERE user_id = ?1",
                params![user_id],
            )
            .await
            .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let email: String = row
                    .get(0)
                    .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
                Ok(Some(email))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(KeywordForgeError::Storage(e.to_string())),
        }
    }
}

/// Parse an RFC 3339 timestamp column.
fn parse_timestamp(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>> {
    let s: String = row
        .get(idx)
        .map_err(|e| KeywordForgeError::Storage(e.to_string()))?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| KeywordForgeError::Storage(format!("invalid timestamp: {e}")))
}
