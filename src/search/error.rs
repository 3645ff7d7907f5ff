//! Search error taxonomy / 搜索错误类型
//!
//! Every failure crossing the search subsystem boundary is typed here;
//! nothing escapes as an opaque error. / 所有跨出搜索子系统边界的失败都在这里定型。

use thiserror::Error;

/// Reason a query was rejected before execution / 查询被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryRejection {
    /// Trimmed query text is empty / 查询为空
    Empty,
    /// Trimmed query text is below the minimum length / 查询过短
    TooShort,
}

impl std::fmt::Display for QueryRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "query is empty"),
            Self::TooShort => write!(f, "query must be at least 2 characters"),
        }
    }
}

/// Typed failures of the search subsystem / 搜索子系统的类型化错误
#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller error, never retried automatically / 调用方错误，不自动重试
    #[error("invalid search query: {0}")]
    InvalidQuery(QueryRejection),

    #[error("invalid pagination: {0}")]
    InvalidPagination(String),

    #[error("invalid search filter: {0}")]
    InvalidFilter(String),

    /// DDL failure while creating indexes; fatal to search until resolved
    #[error("failed to create search indexes: {0}")]
    IndexCreation(String),

    /// Indexes were never created; recoverable via rebuild / 索引未初始化
    #[error("search indexes are not initialized")]
    IndexNotInitialized,

    /// Index data is damaged; recoverable via rebuild / 索引已损坏
    #[error("search index is corrupted: {0}")]
    IndexCorrupted(String),

    #[error("failed to update search index: {0}")]
    UpdateFailed(String),

    /// Non-fatal: affects performance only, never correctness
    #[error("index optimization failed: {0}")]
    OptimizationFailed(String),

    /// The whole fan-out/merge/paginate sequence exceeded its deadline;
    /// partial results are discarded / 搜索超时，部分结果被丢弃
    #[error("search timed out after {seconds}s (query: {query})")]
    Timeout { seconds: u64, query: String },

    #[error("search database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Feature disabled or maintenance in progress / 功能关闭或维护中
    #[error("search unavailable: {reason}")]
    Unavailable { temporary: bool, reason: String },

    #[error("text extraction failed: {0}")]
    Extraction(String),
}

impl SearchError {
    /// Whether the caller can fix the request and retry / 是否为调用方错误
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuery(_) | Self::InvalidPagination(_) | Self::InvalidFilter(_)
        )
    }
}

/// Map a store error to the taxonomy. A missing table means the indexes
/// were never created; a malformed database image means corruption.
pub(crate) fn classify_db_error(err: sqlx::Error) -> SearchError {
    let msg = err.to_string();
    if msg.contains("no such table") {
        SearchError::IndexNotInitialized
    } else if msg.contains("malformed") || msg.contains("corrupt") {
        SearchError::IndexCorrupted(msg)
    } else {
        SearchError::Database(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_table_maps_to_not_initialized() {
        let err = sqlx::Error::Protocol("no such table: book_metadata_fts".into());
        assert!(matches!(
            classify_db_error(err),
            SearchError::IndexNotInitialized
        ));
    }

    #[test]
    fn test_malformed_maps_to_corrupted() {
        let err = sqlx::Error::Protocol("database disk image is malformed".into());
        assert!(matches!(
            classify_db_error(err),
            SearchError::IndexCorrupted(_)
        ));
    }

    #[test]
    fn test_other_errors_stay_database() {
        let err = sqlx::Error::Protocol("database is locked".into());
        assert!(matches!(classify_db_error(err), SearchError::Database(_)));
    }

    #[test]
    fn test_caller_errors() {
        assert!(SearchError::InvalidQuery(QueryRejection::Empty).is_caller_error());
        assert!(SearchError::InvalidPagination("limit".into()).is_caller_error());
        assert!(!SearchError::IndexNotInitialized.is_caller_error());
    }

    #[test]
    fn test_timeout_message_carries_query() {
        let err = SearchError::Timeout {
            seconds: 30,
            query: "flutter".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("30"));
        assert!(msg.contains("flutter"));
    }
}
