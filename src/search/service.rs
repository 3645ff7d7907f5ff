//! Search service - the subsystem's composition point / 搜索服务
//!
//! Explicitly constructed and dependency-injected: one instance owns the
//! store handle, the history list, the suggestion cache and the extractor
//! seam. Control flow for a search: validate, availability gate, concurrent
//! four-way fan-out, merge/sort, paginate, all under a single deadline.
//! Partial results from faster sources are discarded on timeout.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use sqlx::SqlitePool;

use super::error::SearchError;
use super::extract::{PlainTextExtractor, TextExtractor};
use super::history::{SearchHistory, HISTORY_CAPACITY};
use super::index::SearchIndex;
use super::rank;
use super::snippet::SNIPPET_WINDOW;
use super::sources::{self, CANDIDATE_LIMIT};
use super::suggest::{
    NoContentSuggestions, SuggestionCache, SuggestionSource, CACHE_CAPACITY, MAX_SUGGESTIONS,
};
use super::types::{
    BookMetadata, BookmarkEntry, NoteEntry, RecentSearch, SearchQuery, SearchResponse,
    SearchResultType, SearchStatistics,
};
use super::validate;

/// Default deadline for one search operation / 默认搜索超时
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunable knobs, normally filled from the config file / 可调参数
#[derive(Debug, Clone)]
pub struct SearchTuning {
    pub timeout: Duration,
    pub history_capacity: usize,
    pub suggestion_limit: usize,
    pub snippet_window: usize,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            timeout: SEARCH_TIMEOUT,
            history_capacity: HISTORY_CAPACITY,
            suggestion_limit: MAX_SUGGESTIONS,
            snippet_window: SNIPPET_WINDOW,
        }
    }
}

impl SearchTuning {
    pub fn from_config(config: &crate::config::SearchConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_secs),
            history_capacity: config.history_capacity,
            suggestion_limit: config.suggestion_limit,
            snippet_window: config.snippet_window,
        }
    }
}

pub struct SearchService {
    index: SearchIndex,
    history: SearchHistory,
    cache: SuggestionCache,
    content_suggestions: Arc<dyn SuggestionSource>,
    extractor: Arc<dyn TextExtractor>,
    enabled: AtomicBool,
    rebuilding: AtomicBool,
    timeout: Duration,
    snippet_window: usize,
    suggestion_limit: usize,
}

impl SearchService {
    pub fn new(pool: SqlitePool) -> Self {
        Self::with_tuning(pool, SearchTuning::default())
    }

    pub fn with_tuning(pool: SqlitePool, tuning: SearchTuning) -> Self {
        Self {
            index: SearchIndex::new(pool.clone()),
            history: SearchHistory::new(pool, tuning.history_capacity),
            cache: SuggestionCache::new(CACHE_CAPACITY),
            content_suggestions: Arc::new(NoContentSuggestions),
            extractor: Arc::new(PlainTextExtractor::default()),
            enabled: AtomicBool::new(true),
            rebuilding: AtomicBool::new(false),
            timeout: tuning.timeout,
            snippet_window: tuning.snippet_window,
            suggestion_limit: tuning.suggestion_limit,
        }
    }

    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_suggestion_source(mut self, source: Arc<dyn SuggestionSource>) -> Self {
        self.content_suggestions = source;
        self
    }

    /// Create indexes and load persisted state. Must run once before the
    /// service accepts queries. / 初始化索引并加载持久化状态
    pub async fn initialize(&self) -> Result<(), SearchError> {
        self.index.initialize().await?;
        self.history.load().await?;
        let enabled = self.index.load_enabled().await?;
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!(
            "Search service initialized (enabled={}, {} history entries)",
            enabled,
            self.history.len()
        );
        Ok(())
    }

    // ---- search ----------------------------------------------------------

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let text = validate::validate_query(&query.text)?;
        validate::validate_pagination(&query.pagination)?;
        self.ensure_available()?;

        let started = Instant::now();
        match tokio::time::timeout(self.timeout, self.execute(&text, query)).await {
            Ok(outcome) => {
                let (results, total_count) = outcome?;
                Ok(SearchResponse {
                    results,
                    total_count,
                    pagination: query.pagination,
                    execution_time_ms: started.elapsed().as_millis() as u64,
                })
            }
            Err(_) => Err(SearchError::Timeout {
                seconds: self.timeout.as_secs(),
                query: text,
            }),
        }
    }

    /// Fan out across the requested sources, merge, sort and paginate.
    async fn execute(
        &self,
        text: &str,
        query: &SearchQuery,
    ) -> Result<(Vec<super::types::SearchResult>, usize), SearchError> {
        let phrase = validate::fts_phrase(text);
        let pool = self.index.pool();
        let window = self.snippet_window;
        let filters = &query.filters;

        // 四个执行器并发跑，整体耗时取决于最慢的那个
        let metadata = async {
            if filters.wants(SearchResultType::Metadata) {
                sources::search_metadata(pool, &phrase, CANDIDATE_LIMIT).await
            } else {
                Ok(Vec::new())
            }
        };
        let content = async {
            if filters.wants(SearchResultType::Content) {
                sources::search_content(pool, &phrase, text, window, CANDIDATE_LIMIT).await
            } else {
                Ok(Vec::new())
            }
        };
        let bookmarks = async {
            if filters.wants(SearchResultType::Bookmark) {
                sources::search_bookmarks(pool, &phrase, text, window, CANDIDATE_LIMIT).await
            } else {
                Ok(Vec::new())
            }
        };
        let notes = async {
            if filters.wants(SearchResultType::Note) {
                sources::search_notes(pool, &phrase, text, window, CANDIDATE_LIMIT).await
            } else {
                Ok(Vec::new())
            }
        };

        let (metadata, content, bookmarks, notes) =
            tokio::try_join!(metadata, content, bookmarks, notes)?;

        let mut merged =
            Vec::with_capacity(metadata.len() + content.len() + bookmarks.len() + notes.len());
        merged.extend(metadata);
        merged.extend(content);
        merged.extend(bookmarks);
        merged.extend(notes);

        let merged = rank::merge_and_sort(merged, query.sort);
        let total = merged.len();
        Ok((rank::paginate(&merged, query.pagination), total))
    }

    pub async fn search_metadata(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        self.search_single(query, SearchResultType::Metadata).await
    }

    pub async fn search_content(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        self.search_single(query, SearchResultType::Content).await
    }

    pub async fn search_bookmarks(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchResponse, SearchError> {
        self.search_single(query, SearchResultType::Bookmark).await
    }

    pub async fn search_notes(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        self.search_single(query, SearchResultType::Note).await
    }

    async fn search_single(
        &self,
        query: &SearchQuery,
        ty: SearchResultType,
    ) -> Result<SearchResponse, SearchError> {
        let mut query = query.clone();
        query.filters.result_types = Some([ty].into_iter().collect());
        self.search(&query).await
    }

    // ---- suggestions and history ----------------------------------------

    /// Autocomplete candidates for a partial query. Failures degrade to an
    /// empty list, never an error. / 失败时退化为空列表
    pub async fn suggestions(&self, partial: &str) -> Vec<String> {
        let partial = partial.trim();
        if partial.is_empty() {
            return Vec::new();
        }
        if let Some(hit) = self.cache.get(partial) {
            return hit;
        }

        let budget = self.suggestion_limit;
        // 历史建议占一半预算，剩下的留给内容建议
        let mut out = self.history.matching(partial, budget / 2);
        let remaining = budget.saturating_sub(out.len());
        if remaining > 0 {
            match self.content_suggestions.suggest(partial, remaining).await {
                Ok(extra) => {
                    for suggestion in extra {
                        if !out.contains(&suggestion) {
                            out.push(suggestion);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Content suggestions failed for '{}': {}", partial, e);
                }
            }
        }
        out.truncate(budget);
        self.cache.put(partial.to_string(), out.clone());
        out
    }

    pub async fn save_to_history(&self, query: &str) -> Result<(), SearchError> {
        self.history.save(query).await
    }

    pub fn recent_searches(&self) -> Vec<RecentSearch> {
        self.history.recent()
    }

    pub async fn clear_history(&self) -> Result<(), SearchError> {
        self.cache.clear();
        self.history.clear().await
    }

    // ---- indexing --------------------------------------------------------

    /// Extract a book's text and replace its content index rows. Returns
    /// the number of indexed segments. / 索引一本书的正文，返回分段数
    pub async fn index_book(
        &self,
        book_id: &str,
        source_path: &Path,
        format: &str,
    ) -> Result<usize, SearchError> {
        self.ensure_writable()?;
        let chapters = self.extractor.extract(source_path, format).await?;
        self.index.replace_content(book_id, &chapters).await?;
        tracing::info!("Indexed book {} ({} segments)", book_id, chapters.len());
        Ok(chapters.len())
    }

    pub async fn remove_book(&self, book_id: &str) -> Result<(), SearchError> {
        self.ensure_writable()?;
        self.index.remove_book(book_id).await?;
        tracing::info!("Removed book {} from search indexes", book_id);
        Ok(())
    }

    /// No-op when `metadata` is absent. / metadata 为空时不做任何事
    pub async fn update_book_metadata(
        &self,
        book_id: &str,
        metadata: Option<&BookMetadata>,
    ) -> Result<(), SearchError> {
        self.ensure_writable()?;
        match metadata {
            Some(metadata) => self.index.upsert_metadata(book_id, metadata).await,
            None => Ok(()),
        }
    }

    pub async fn index_bookmark(&self, bookmark: &BookmarkEntry) -> Result<(), SearchError> {
        self.ensure_writable()?;
        self.index.upsert_bookmark(bookmark).await
    }

    pub async fn index_note(&self, note: &NoteEntry) -> Result<(), SearchError> {
        self.ensure_writable()?;
        self.index.upsert_note(note).await
    }

    pub async fn remove_bookmark(&self, book_id: &str, position: i64) -> Result<(), SearchError> {
        self.ensure_writable()?;
        self.index.remove_bookmark(book_id, position).await
    }

    pub async fn remove_note(&self, book_id: &str, position: i64) -> Result<(), SearchError> {
        self.ensure_writable()?;
        self.index.remove_note(book_id, position).await
    }

    // ---- lifecycle -------------------------------------------------------

    /// Drop and recreate all indexes. Mutually exclusive with searches and
    /// indexing; those fail as temporarily unavailable while this runs.
    /// / 重建期间搜索与索引写入都会拒绝
    pub async fn rebuild(&self) -> Result<(), SearchError> {
        if self.rebuilding.swap(true, Ordering::SeqCst) {
            return Err(SearchError::Unavailable {
                temporary: true,
                reason: "index rebuild already in progress".to_string(),
            });
        }
        let result = self.index.rebuild().await;
        self.cache.clear();
        self.rebuilding.store(false, Ordering::SeqCst);
        result
    }

    /// Optimization failures affect performance only; they are logged and
    /// swallowed. / 优化失败只记日志
    pub async fn optimize(&self) {
        if let Err(e) = self.index.optimize().await {
            tracing::warn!("Index optimization failed: {}", e);
        }
    }

    pub async fn statistics(&self) -> Result<SearchStatistics, SearchError> {
        self.index.statistics(self.history.len()).await
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub async fn set_enabled(&self, enabled: bool) -> Result<(), SearchError> {
        self.index.store_enabled(enabled).await?;
        self.enabled.store(enabled, Ordering::SeqCst);
        tracing::info!("Search enabled flag set to {}", enabled);
        Ok(())
    }

    // ---- gates -----------------------------------------------------------

    fn ensure_available(&self) -> Result<(), SearchError> {
        if self.rebuilding.load(Ordering::SeqCst) {
            return Err(SearchError::Unavailable {
                temporary: true,
                reason: "index rebuild in progress".to_string(),
            });
        }
        if !self.enabled.load(Ordering::SeqCst) {
            return Err(SearchError::Unavailable {
                temporary: false,
                reason: "search is disabled".to_string(),
            });
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), SearchError> {
        if self.rebuilding.load(Ordering::SeqCst) {
            return Err(SearchError::Unavailable {
                temporary: true,
                reason: "index rebuild in progress".to_string(),
            });
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn set_rebuilding_for_test(&self, value: bool) {
        self.rebuilding.store(value, Ordering::SeqCst);
    }
}
