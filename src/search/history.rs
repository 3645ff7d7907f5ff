//! Search history store / 搜索历史
//!
//! Bounded, most-recent-first, unique on query text. The in-memory list is
//! the source of truth after load; every mutation persists the full
//! snapshot in one transaction (replace-all write, not incremental).

use chrono::Utc;
use parking_lot::RwLock;
use sqlx::SqlitePool;

use super::error::{classify_db_error, SearchError};
use super::types::RecentSearch;

/// Maximum number of remembered queries / 历史上限
pub const HISTORY_CAPACITY: usize = 50;

pub struct SearchHistory {
    pool: SqlitePool,
    entries: RwLock<Vec<RecentSearch>>,
    capacity: usize,
}

impl SearchHistory {
    pub fn new(pool: SqlitePool, capacity: usize) -> Self {
        Self {
            pool,
            entries: RwLock::new(Vec::new()),
            capacity,
        }
    }

    /// Load persisted history into memory; called once at initialization.
    /// / 初始化时一次性加载
    pub async fn load(&self) -> Result<(), SearchError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT query, created_at FROM search_history ORDER BY created_at DESC LIMIT ?",
        )
        .bind(self.capacity as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(classify_db_error)?;

        let mut entries = self.entries.write();
        *entries = rows
            .into_iter()
            .map(|(query, created_at)| RecentSearch { query, created_at })
            .collect();
        Ok(())
    }

    /// Remember a query. Blank text is a no-op; a repeated query moves to
    /// the front. / 空白查询不记录，重复查询移到最前
    pub async fn save(&self, query: &str) -> Result<(), SearchError> {
        let trimmed = query.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let snapshot = {
            let mut entries = self.entries.write();
            entries.retain(|e| e.query != trimmed);
            let now = Utc::now().timestamp_millis();
            // 时间戳保持严格递增，加载时按 created_at 排序才能复原顺序
            let created_at = match entries.first() {
                Some(front) if front.created_at >= now => front.created_at + 1,
                _ => now,
            };
            entries.insert(
                0,
                RecentSearch {
                    query: trimmed.to_string(),
                    created_at,
                },
            );
            entries.truncate(self.capacity);
            entries.clone()
        };
        self.persist(&snapshot).await
    }

    async fn persist(&self, entries: &[RecentSearch]) -> Result<(), SearchError> {
        let mut tx = self.pool.begin().await.map_err(classify_db_error)?;
        sqlx::query("DELETE FROM search_history")
            .execute(&mut *tx)
            .await
            .map_err(classify_db_error)?;
        for entry in entries {
            sqlx::query("INSERT INTO search_history (query, created_at) VALUES (?, ?)")
                .bind(&entry.query)
                .bind(entry.created_at)
                .execute(&mut *tx)
                .await
                .map_err(classify_db_error)?;
        }
        tx.commit().await.map_err(classify_db_error)?;
        Ok(())
    }

    /// Most-recent-first snapshot / 最近优先的快照
    pub fn recent(&self) -> Vec<RecentSearch> {
        self.entries.read().clone()
    }

    pub async fn clear(&self) -> Result<(), SearchError> {
        self.entries.write().clear();
        sqlx::query("DELETE FROM search_history")
            .execute(&self.pool)
            .await
            .map_err(classify_db_error)?;
        Ok(())
    }

    /// Case-insensitive substring matches, most recent first.
    pub fn matching(&self, partial: &str, limit: usize) -> Vec<String> {
        let needle = partial.to_lowercase();
        self.entries
            .read()
            .iter()
            .filter(|e| e.query.to_lowercase().contains(&needle))
            .take(limit)
            .map(|e| e.query.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn history() -> SearchHistory {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS search_history (query TEXT PRIMARY KEY, created_at INTEGER NOT NULL)",
        )
        .execute(&pool)
        .await
        .unwrap();
        SearchHistory::new(pool, HISTORY_CAPACITY)
    }

    #[tokio::test]
    async fn test_blank_query_is_noop() {
        let h = history().await;
        h.save("   ").await.unwrap();
        assert!(h.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_moves_to_front() {
        let h = history().await;
        h.save("rust").await.unwrap();
        h.save("flutter").await.unwrap();
        h.save("rust").await.unwrap();

        let recent = h.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].query, "rust");
        assert_eq!(recent[1].query, "flutter");
    }

    #[tokio::test]
    async fn test_capacity_bound() {
        let h = history().await;
        for i in 0..60 {
            h.save(&format!("query-{}", i)).await.unwrap();
        }
        let recent = h.recent();
        assert_eq!(recent.len(), HISTORY_CAPACITY);
        assert_eq!(recent[0].query, "query-59");
        assert_eq!(recent.last().unwrap().query, "query-10");
    }

    #[tokio::test]
    async fn test_persisted_order_survives_reload() {
        let h = history().await;
        // 同一毫秒内的多次保存也要保持顺序
        for name in ["alpha", "beta", "gamma"] {
            h.save(name).await.unwrap();
        }
        let before: Vec<String> = h.recent().into_iter().map(|e| e.query).collect();

        let reloaded = SearchHistory::new(h.pool.clone(), HISTORY_CAPACITY);
        reloaded.load().await.unwrap();
        let after: Vec<String> = reloaded.recent().into_iter().map(|e| e.query).collect();
        assert_eq!(before, after);
        assert_eq!(after, ["gamma", "beta", "alpha"]);
    }

    #[tokio::test]
    async fn test_clear_empties_memory_and_storage() {
        let h = history().await;
        h.save("rust").await.unwrap();
        h.clear().await.unwrap();
        assert!(h.is_empty());

        let reloaded = SearchHistory::new(h.pool.clone(), HISTORY_CAPACITY);
        reloaded.load().await.unwrap();
        assert!(reloaded.is_empty());
    }

    #[tokio::test]
    async fn test_matching_is_case_insensitive() {
        let h = history().await;
        h.save("Flutter Development").await.unwrap();
        h.save("rust async").await.unwrap();
        h.save("flutter widgets").await.unwrap();

        let matches = h.matching("FLUTTER", 10);
        assert_eq!(matches, ["flutter widgets", "Flutter Development"]);
        assert_eq!(h.matching("flutter", 1).len(), 1);
    }
}
