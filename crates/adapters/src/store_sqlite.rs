//! SQLite grade store implementation

use async_trait::async_trait;
use nutri_grade_domain::{CacheEntry, Grade, GradeStore, NullReason, StoreError};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::store::validate_namespace;

/// SQLite-backed grade store; one table per namespace
pub struct SqliteGradeStore {
    pool: SqlitePool,
    table: String,
}

impl SqliteGradeStore {
    /// Open (and create if needed) the database at `db_path`
    pub async fn new(db_path: impl AsRef<Path>, namespace: &str) -> Result<Self, StoreError> {
        validate_namespace(namespace)?;
        let db_path = db_path.as_ref();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Io(format!("Failed to create directory: {}", e)))?;
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            pool,
            table: namespace.to_string(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory(namespace: &str) -> Result<Self, StoreError> {
        validate_namespace(namespace)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let store = Self {
            pool,
            table: namespace.to_string(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        // table name is a validated [a-z0-9_]+ identifier
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                id TEXT PRIMARY KEY,
                grade TEXT,
                reason TEXT,
                computed_at TEXT NOT NULL
            )
            "#,
            self.table
        );

        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl GradeStore for SqliteGradeStore {
    async fn get(&self, product_id: &str) -> Result<Option<CacheEntry>, StoreError> {
        let sql = format!(
            "SELECT id, grade, reason, computed_at FROM {} WHERE id = ?",
            self.table
        );
        let row: Option<(String, Option<String>, Option<String>, String)> = sqlx::query_as(&sql)
            .bind(product_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        let Some((id, grade, reason, computed_at_str)) = row else {
            return Ok(None);
        };

        let grade = grade
            .map(|g| g.parse::<Grade>())
            .transpose()
            .map_err(StoreError::Serialization)?;
        let reason = reason
            .map(|r| r.parse::<NullReason>())
            .transpose()
            .map_err(StoreError::Serialization)?;
        let computed_at = OffsetDateTime::parse(&computed_at_str, &Rfc3339)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        Ok(Some(CacheEntry {
            id,
            grade,
            reason,
            computed_at,
        }))
    }

    async fn put(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        let computed_at_str = entry
            .computed_at
            .format(&Rfc3339)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        let sql = format!(
            r#"
            INSERT INTO {} (id, grade, reason, computed_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                grade = excluded.grade,
                reason = excluded.reason,
                computed_at = excluded.computed_at
            "#,
            self.table
        );

        sqlx::query(&sql)
            .bind(&entry.id)
            .bind(entry.grade.map(|g| g.as_str()))
            .bind(entry.reason.map(|r| r.as_str()))
            .bind(&computed_at_str)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);
        let count: (i64,) = sqlx::query_as(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(count.0.max(0) as u64)
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}
