//! Query validation and index-syntax escaping / 查询校验与索引语法转义
//!
//! Validation rejects; escaping never rejects. Special characters in user
//! input are neutralized by phrase-quoting, not filtered out.

use super::error::{QueryRejection, SearchError};
use super::types::SearchPagination;

/// Minimum trimmed query length / 最小查询长度
pub const MIN_QUERY_LEN: usize = 2;

/// Validate raw query text; returns the trimmed text on success.
pub fn validate_query(text: &str) -> Result<String, SearchError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SearchError::InvalidQuery(QueryRejection::Empty));
    }
    if trimmed.chars().count() < MIN_QUERY_LEN {
        return Err(SearchError::InvalidQuery(QueryRejection::TooShort));
    }
    Ok(trimmed.to_string())
}

pub fn validate_pagination(pagination: &SearchPagination) -> Result<(), SearchError> {
    if pagination.limit == 0 {
        return Err(SearchError::InvalidPagination(
            "limit must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Wrap user text as an exact FTS5 phrase. Doubling embedded quotes keeps
/// operators (AND/OR/NOT/NEAR/*) in user input from reaching the query
/// parser. / 将用户输入包装为精确短语，防止查询语法注入
pub fn fts_phrase(text: &str) -> String {
    format!("\"{}\"", text.replace('"', "\"\""))
}
