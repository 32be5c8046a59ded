//! SQLite-backed corpus store.
//!
//! Documents live in a single table keyed by title; the dedup invariant is
//! enforced by a UNIQUE column so concurrent inserts of the same title can
//! never both succeed.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};

use super::store::CorpusStore;
use super::{Candidate, Document, InsertOutcome, Origin};
use crate::core::config::AppPaths;
use crate::core::errors::ApiError;

pub struct SqliteCorpusStore {
    pool: SqlitePool,
    #[allow(dead_code)]
    db_path: PathBuf,
}

impl SqliteCorpusStore {
    pub async fn new(paths: &AppPaths) -> Result<Self, ApiError> {
        Self::with_path(paths.db_path.clone()).await
    }

    pub async fn with_path(db_path: PathBuf) -> Result<Self, ApiError> {
        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(ApiError::internal)?;

        let store = Self { pool, db_path };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), ApiError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS documents (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL UNIQUE,
                abstract TEXT NOT NULL,
                source_url TEXT NOT NULL,
                origin TEXT NOT NULL,
                ingested_at TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_ingested ON documents(ingested_at)")
            .execute(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(())
    }

    fn row_to_document(row: &sqlx::sqlite::SqliteRow) -> Document {
        let origin: String = row.get("origin");
        let ingested_at: DateTime<Utc> = row.get("ingested_at");

        Document {
            title: row.get("title"),
            abstract_text: row.get("abstract"),
            source_url: row.get("source_url"),
            origin: Origin::parse(&origin),
            ingested_at,
        }
    }
}

#[async_trait]
impl CorpusStore for SqliteCorpusStore {
    async fn insert(&self, candidate: Candidate) -> Result<InsertOutcome, ApiError> {
        let result = sqlx::query(
            "INSERT INTO documents (title, abstract, source_url, origin, ingested_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(title) DO NOTHING",
        )
        .bind(&candidate.title)
        .bind(&candidate.abstract_text)
        .bind(&candidate.source_url)
        .bind(candidate.origin.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        if result.rows_affected() > 0 {
            Ok(InsertOutcome::Inserted)
        } else {
            Ok(InsertOutcome::Duplicate)
        }
    }

    async fn insert_batch(&self, candidates: Vec<Candidate>) -> Result<usize, ApiError> {
        if candidates.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await.map_err(ApiError::internal)?;
        let mut added = 0usize;

        for candidate in &candidates {
            let result = sqlx::query(
                "INSERT INTO documents (title, abstract, source_url, origin, ingested_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(title) DO NOTHING",
            )
            .bind(&candidate.title)
            .bind(&candidate.abstract_text)
            .bind(&candidate.source_url)
            .bind(candidate.origin.as_str())
            .bind(Utc::now())
            .execute(&mut *tx)
            .await
            .map_err(ApiError::internal)?;

            added += result.rows_affected() as usize;
        }

        tx.commit().await.map_err(ApiError::internal)?;
        Ok(added)
    }

    async fn snapshot(&self) -> Result<Vec<Document>, ApiError> {
        let rows = sqlx::query(
            "SELECT title, abstract, source_url, origin, ingested_at
             FROM documents
             ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(Self::row_to_document).collect())
    }

    async fn recent(&self, n: usize) -> Result<Vec<Document>, ApiError> {
        let rows = sqlx::query(
            "SELECT title, abstract, source_url, origin, ingested_at
             FROM documents
             ORDER BY id DESC
             LIMIT ?1",
        )
        .bind(n.max(1) as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(ApiError::internal)?;

        Ok(rows.iter().map(Self::row_to_document).collect())
    }

    async fn count(&self) -> Result<usize, ApiError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await
            .map_err(ApiError::internal)?;

        Ok(count as usize)
    }
}
