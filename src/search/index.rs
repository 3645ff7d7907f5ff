//! Index store adapter and lifecycle / 索引存储与生命周期
//!
//! Four FTS5 virtual tables (metadata, content, bookmarks, notes) plus the
//! history and settings tables. This module owns all DDL and all writes;
//! reads for searching live in the per-source executors.
//!
//! FTS5 has no conflict clause, so every upsert is delete-then-insert
//! inside one transaction.

use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use super::error::{classify_db_error, SearchError};
use super::extract::ChapterText;
use super::types::{BookMetadata, BookmarkEntry, NoteEntry, SearchStatistics};

const INDEX_DDL: &[&str] = &[
    "CREATE VIRTUAL TABLE IF NOT EXISTS book_metadata_fts USING fts5(
        book_id UNINDEXED, title, author, description, genre, language, indexed_at UNINDEXED)",
    "CREATE VIRTUAL TABLE IF NOT EXISTS book_content_fts USING fts5(
        book_id UNINDEXED, content, chapter, position UNINDEXED, page_number UNINDEXED, indexed_at UNINDEXED)",
    "CREATE VIRTUAL TABLE IF NOT EXISTS bookmark_fts USING fts5(
        book_id UNINDEXED, bookmark_text, note, chapter, position UNINDEXED, created_at UNINDEXED)",
    "CREATE VIRTUAL TABLE IF NOT EXISTS note_fts USING fts5(
        book_id UNINDEXED, note_content, note_title, tags, chapter, position UNINDEXED, created_at UNINDEXED)",
];

const AUX_DDL: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS search_history (query TEXT PRIMARY KEY, created_at INTEGER NOT NULL)",
    "CREATE TABLE IF NOT EXISTS search_settings (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
];

const FTS_TABLES: &[&str] = &[
    "book_metadata_fts",
    "book_content_fts",
    "bookmark_fts",
    "note_fts",
];

/// Open the search database with WAL mode and a busy timeout.
/// / 打开搜索数据库（WAL 模式）
pub async fn open_pool(db_url: &str) -> Result<SqlitePool, SearchError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(db_url)
        .await
        .map_err(|e| SearchError::IndexCreation(e.to_string()))?;

    for pragma in [
        "PRAGMA journal_mode=WAL",
        "PRAGMA busy_timeout=5000",
        "PRAGMA synchronous=NORMAL",
    ] {
        sqlx::query(pragma)
            .execute(&pool)
            .await
            .map_err(classify_db_error)?;
    }

    tracing::info!("Search database opened: {} (WAL mode)", db_url);
    Ok(pool)
}

/// Thin boundary over the embedded store / 嵌入式存储的薄封装
pub struct SearchIndex {
    pool: SqlitePool,
}

impl SearchIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Idempotently create the four full-text indexes and auxiliary
    /// tables. / 幂等创建全部索引表
    pub async fn initialize(&self) -> Result<(), SearchError> {
        for ddl in INDEX_DDL.iter().chain(AUX_DDL) {
            sqlx::query(ddl)
                .execute(&self.pool)
                .await
                .map_err(|e| SearchError::IndexCreation(e.to_string()))?;
        }
        Ok(())
    }

    /// Drop and recreate the four full-text indexes. Destructive: all
    /// indexed content must be re-supplied by the caller afterwards.
    /// / 删除并重建全部全文索引，已索引内容需要重新提供
    pub async fn rebuild(&self) -> Result<(), SearchError> {
        for table in FTS_TABLES {
            sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
                .execute(&self.pool)
                .await
                .map_err(|e| SearchError::UpdateFailed(e.to_string()))?;
        }
        tracing::info!("Search indexes dropped for rebuild");
        self.initialize().await
    }

    /// Run the FTS5 merge/compaction command on each index. Affects
    /// performance only, never correctness. / 索引压缩，只影响性能
    pub async fn optimize(&self) -> Result<(), SearchError> {
        for table in FTS_TABLES {
            sqlx::query(&format!("INSERT INTO {}({}) VALUES('optimize')", table, table))
                .execute(&self.pool)
                .await
                .map_err(|e| SearchError::OptimizationFailed(format!("{}: {}", table, e)))?;
        }
        Ok(())
    }

    /// Upsert the metadata row for a book. / 更新图书元数据索引行
    pub async fn upsert_metadata(
        &self,
        book_id: &str,
        metadata: &BookMetadata,
    ) -> Result<(), SearchError> {
        let mut tx = self.pool.begin().await.map_err(classify_db_error)?;
        sqlx::query("DELETE FROM book_metadata_fts WHERE book_id = ?")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;
        sqlx::query(
            "INSERT INTO book_metadata_fts (book_id, title, author, description, genre, language, indexed_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(book_id)
        .bind(&metadata.title)
        .bind(&metadata.author)
        .bind(&metadata.description)
        .bind(&metadata.genre)
        .bind(&metadata.language)
        .bind(Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(classify_db_error)?;
        tx.commit().await.map_err(classify_db_error)?;
        Ok(())
    }

    /// Replace all content rows for a book (re-indexing overwrites, never
    /// appends). / 重建某本书的正文索引行
    pub async fn replace_content(
        &self,
        book_id: &str,
        chapters: &[ChapterText],
    ) -> Result<(), SearchError> {
        let mut tx = self.pool.begin().await.map_err(classify_db_error)?;
        sqlx::query("DELETE FROM book_content_fts WHERE book_id = ?")
            .bind(book_id)
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;

        let now = Utc::now().timestamp_millis();
        for chapter in chapters {
            sqlx::query(
                "INSERT INTO book_content_fts (book_id, content, chapter, position, page_number, indexed_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(book_id)
            .bind(&chapter.content)
            .bind(&chapter.chapter)
            .bind(chapter.position)
            .bind(chapter.page_number)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;
        }
        tx.commit().await.map_err(classify_db_error)?;
        Ok(())
    }

    /// Upsert one bookmark, keyed by (book, position). / 写入书签索引行
    pub async fn upsert_bookmark(&self, bookmark: &BookmarkEntry) -> Result<(), SearchError> {
        let mut tx = self.pool.begin().await.map_err(classify_db_error)?;
        sqlx::query("DELETE FROM bookmark_fts WHERE book_id = ? AND position = ?")
            .bind(&bookmark.book_id)
            .bind(bookmark.position)
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;
        sqlx::query(
            "INSERT INTO bookmark_fts (book_id, bookmark_text, note, chapter, position, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&bookmark.book_id)
        .bind(&bookmark.bookmark_text)
        .bind(&bookmark.note)
        .bind(&bookmark.chapter)
        .bind(bookmark.position)
        .bind(Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(classify_db_error)?;
        tx.commit().await.map_err(classify_db_error)?;
        Ok(())
    }

    /// Upsert one note, keyed by (book, position). / 写入笔记索引行
    pub async fn upsert_note(&self, note: &NoteEntry) -> Result<(), SearchError> {
        let mut tx = self.pool.begin().await.map_err(classify_db_error)?;
        sqlx::query("DELETE FROM note_fts WHERE book_id = ? AND position = ?")
            .bind(&note.book_id)
            .bind(note.position)
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;
        sqlx::query(
            "INSERT INTO note_fts (book_id, note_content, note_title, tags, chapter, position, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&note.book_id)
        .bind(&note.note_content)
        .bind(&note.note_title)
        .bind(&note.tags)
        .bind(&note.chapter)
        .bind(note.position)
        .bind(Utc::now().timestamp_millis())
        .execute(&mut *tx)
        .await
        .map_err(classify_db_error)?;
        tx.commit().await.map_err(classify_db_error)?;
        Ok(())
    }

    /// Remove a book from every index. Idempotent: removing an id that was
    /// never indexed is not an error. / 从所有索引移除，幂等
    pub async fn remove_book(&self, book_id: &str) -> Result<(), SearchError> {
        for table in FTS_TABLES {
            sqlx::query(&format!("DELETE FROM {} WHERE book_id = ?", table))
                .bind(book_id)
                .execute(&self.pool)
                .await
                .map_err(classify_db_error)?;
        }
        Ok(())
    }

    pub async fn remove_bookmark(&self, book_id: &str, position: i64) -> Result<(), SearchError> {
        sqlx::query("DELETE FROM bookmark_fts WHERE book_id = ? AND position = ?")
            .bind(book_id)
            .bind(position)
            .execute(&self.pool)
            .await
            .map_err(classify_db_error)?;
        Ok(())
    }

    pub async fn remove_note(&self, book_id: &str, position: i64) -> Result<(), SearchError> {
        sqlx::query("DELETE FROM note_fts WHERE book_id = ? AND position = ?")
            .bind(book_id)
            .bind(position)
            .execute(&self.pool)
            .await
            .map_err(classify_db_error)?;
        Ok(())
    }

    /// Diagnostic counts across the indexes / 各索引的统计数
    pub async fn statistics(&self, history_entries: usize) -> Result<SearchStatistics, SearchError> {
        let (indexed_books,): (i64,) =
            sqlx::query_as("SELECT COUNT(DISTINCT book_id) FROM book_metadata_fts")
                .fetch_one(&self.pool)
                .await
                .map_err(classify_db_error)?;
        let (content_entries,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM book_content_fts")
            .fetch_one(&self.pool)
            .await
            .map_err(classify_db_error)?;
        let (bookmark_entries,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM bookmark_fts")
            .fetch_one(&self.pool)
            .await
            .map_err(classify_db_error)?;
        let (note_entries,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM note_fts")
            .fetch_one(&self.pool)
            .await
            .map_err(classify_db_error)?;

        Ok(SearchStatistics {
            indexed_books: indexed_books as u64,
            content_entries: content_entries as u64,
            bookmark_entries: bookmark_entries as u64,
            note_entries: note_entries as u64,
            history_entries: history_entries as u64,
        })
    }

    /// Read the persisted enabled flag; missing row means enabled.
    pub async fn load_enabled(&self) -> Result<bool, SearchError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT value FROM search_settings WHERE key = 'enabled'")
                .fetch_optional(&self.pool)
                .await
                .map_err(classify_db_error)?;
        Ok(row.map(|(v,)| v != "0").unwrap_or(true))
    }

    pub async fn store_enabled(&self, enabled: bool) -> Result<(), SearchError> {
        sqlx::query("INSERT OR REPLACE INTO search_settings (key, value) VALUES ('enabled', ?)")
            .bind(if enabled { "1" } else { "0" })
            .execute(&self.pool)
            .await
            .map_err(classify_db_error)?;
        Ok(())
    }
}
