//! Metadata store trait and SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::FileRow;
use crate::repos::FileRepo;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: FileRepo + Send + Sync {
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection avoids
            // persistent "database is locked" failures under axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        sqlx::query(SCHEMA_SQL).execute(&self.pool).await?;
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl FileRepo for SqliteStore {
    async fn create_file(&self, file: &FileRow) -> MetadataResult<()> {
        if self.get_file(&file.file_id).await?.is_some() {
            return Err(MetadataError::AlreadyExists(format!(
                "file_id {} already exists",
                file.file_id
            )));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO files (file_id, file_name, size_bytes, uploaded_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&file.file_id)
        .bind(&file.file_name)
        .bind(file.size_bytes)
        .bind(file.uploaded_at)
        .bind(file.created_at)
        .bind(file.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            // Backstop for the window between the existence check and the
            // INSERT: the primary key still rejects a racing duplicate.
            Err(sqlx::Error::Database(db_err))
                if db_err.message().contains("UNIQUE constraint") =>
            {
                Err(MetadataError::AlreadyExists(format!(
                    "file_id {} already exists",
                    file.file_id
                )))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get_file(&self, file_id: &str) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE file_id = ?")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_files(&self) -> MetadataResult<Vec<FileRow>> {
        let rows = sqlx::query_as::<_, FileRow>("SELECT * FROM files ORDER BY created_at, file_id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn rename_file(
        &self,
        file_id: &str,
        file_name: &str,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<()> {
        let result =
            sqlx::query("UPDATE files SET file_name = ?, updated_at = ? WHERE file_id = ?")
                .bind(file_name)
                .bind(updated_at)
                .bind(file_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "file_id {file_id} not found"
            )));
        }
        Ok(())
    }

    async fn mark_uploaded(
        &self,
        file_id: &str,
        uploaded_at: OffsetDateTime,
    ) -> MetadataResult<()> {
        // Conditional update: only a pending record can transition, so the
        // completion flag is written exactly once even under races.
        let result = sqlx::query(
            "UPDATE files SET uploaded_at = ?, updated_at = ? WHERE file_id = ? AND uploaded_at IS NULL",
        )
        .bind(uploaded_at)
        .bind(uploaded_at)
        .bind(file_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_file(file_id).await? {
                Some(_) => Err(MetadataError::AlreadyExists(format!(
                    "file_id {file_id} is already uploaded"
                ))),
                None => Err(MetadataError::NotFound(format!(
                    "file_id {file_id} not found"
                ))),
            };
        }
        Ok(())
    }

    async fn delete_file(&self, file_id: &str) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM files WHERE file_id = ?")
            .bind(file_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!(
                "file_id {file_id} not found"
            )));
        }
        Ok(())
    }
}

const SCHEMA_SQL: &str = r#"
-- File records
CREATE TABLE IF NOT EXISTS files (
    file_id TEXT PRIMARY KEY,
    file_name TEXT NOT NULL,
    size_bytes INTEGER NOT NULL,
    uploaded_at TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_files_created ON files(created_at);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_row(id: &str, size: i64) -> FileRow {
        let now = OffsetDateTime::now_utc();
        FileRow {
            file_id: id.to_string(),
            file_name: "a.txt".to_string(),
            size_bytes: size,
            uploaded_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    async fn temp_store() -> (tempfile::TempDir, SqliteStore) {
        let temp = tempdir().unwrap();
        let store = SqliteStore::new(temp.path().join("metadata.db"))
            .await
            .unwrap();
        (temp, store)
    }

    #[tokio::test]
    async fn create_and_get_roundtrip() {
        let (_temp, store) = temp_store().await;

        store.create_file(&sample_row("abc12", 10)).await.unwrap();

        let row = store.get_file("abc12").await.unwrap().unwrap();
        assert_eq!(row.file_name, "a.txt");
        assert_eq!(row.size_bytes, 10);
        assert!(!row.is_uploaded());
    }

    #[tokio::test]
    async fn duplicate_id_is_already_exists() {
        let (_temp, store) = temp_store().await;

        store.create_file(&sample_row("abc12", 10)).await.unwrap();
        match store.create_file(&sample_row("abc12", 20)).await {
            Err(MetadataError::AlreadyExists(_)) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }

        // The original record was not overwritten
        let row = store.get_file("abc12").await.unwrap().unwrap();
        assert_eq!(row.size_bytes, 10);
    }

    #[tokio::test]
    async fn list_orders_by_creation() {
        let (_temp, store) = temp_store().await;

        let mut first = sample_row("aaaaa", 1);
        first.created_at = OffsetDateTime::UNIX_EPOCH;
        first.updated_at = first.created_at;
        store.create_file(&first).await.unwrap();
        store.create_file(&sample_row("bbbbb", 2)).await.unwrap();

        let rows = store.list_files().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].file_id, "aaaaa");
        assert_eq!(rows[1].file_id, "bbbbb");
    }

    #[tokio::test]
    async fn rename_updates_name_only() {
        let (_temp, store) = temp_store().await;

        store.create_file(&sample_row("abc12", 10)).await.unwrap();
        store
            .rename_file("abc12", "b.txt", OffsetDateTime::now_utc())
            .await
            .unwrap();

        let row = store.get_file("abc12").await.unwrap().unwrap();
        assert_eq!(row.file_name, "b.txt");
        assert_eq!(row.size_bytes, 10);
    }

    #[tokio::test]
    async fn rename_missing_file_is_not_found() {
        let (_temp, store) = temp_store().await;

        match store
            .rename_file("zzzzz", "b.txt", OffsetDateTime::now_utc())
            .await
        {
            Err(MetadataError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mark_uploaded_transitions_exactly_once() {
        let (_temp, store) = temp_store().await;

        store.create_file(&sample_row("abc12", 10)).await.unwrap();
        let when = OffsetDateTime::now_utc();
        store.mark_uploaded("abc12", when).await.unwrap();

        let row = store.get_file("abc12").await.unwrap().unwrap();
        assert!(row.is_uploaded());

        match store.mark_uploaded("abc12", OffsetDateTime::now_utc()).await {
            Err(MetadataError::AlreadyExists(_)) => {}
            other => panic!("expected AlreadyExists, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn mark_uploaded_missing_file_is_not_found() {
        let (_temp, store) = temp_store().await;

        match store
            .mark_uploaded("zzzzz", OffsetDateTime::now_utc())
            .await
        {
            Err(MetadataError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let (_temp, store) = temp_store().await;

        store.create_file(&sample_row("abc12", 10)).await.unwrap();
        store.delete_file("abc12").await.unwrap();
        assert!(store.get_file("abc12").await.unwrap().is_none());

        match store.delete_file("abc12").await {
            Err(MetadataError::NotFound(_)) => {}
            other => panic!("expected NotFound, got {other:?}"),
        }
    }
}
