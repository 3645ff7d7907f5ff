//! Search data model / 搜索数据模型

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Content source a result came from / 结果的内容来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchResultType {
    Metadata,
    Content,
    Bookmark,
    Note,
    /// Reserved result kinds, no producer yet / 预留类型，尚无生产者
    Chapter,
    TableOfContents,
}

impl SearchResultType {
    /// Short tag used inside composite result ids / 结果ID中的短标记
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Metadata => "meta",
            Self::Content => "content",
            Self::Bookmark => "bookmark",
            Self::Note => "note",
            Self::Chapter => "chapter",
            Self::TableOfContents => "toc",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "metadata" => Some(Self::Metadata),
            "content" => Some(Self::Content),
            "bookmark" => Some(Self::Bookmark),
            "note" => Some(Self::Note),
            "chapter" => Some(Self::Chapter),
            "table_of_contents" | "toc" => Some(Self::TableOfContents),
            _ => None,
        }
    }
}

/// Sort key / 排序字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Relevance,
    Title,
    DateAdded,
    DateModified,
    Position,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "relevance" => Some(Self::Relevance),
            "title" => Some(Self::Title),
            "date_added" => Some(Self::DateAdded),
            "date_modified" => Some(Self::DateModified),
            "position" => Some(Self::Position),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchSort {
    pub field: SortField,
    pub order: SortOrder,
}

impl Default for SearchSort {
    fn default() -> Self {
        Self {
            field: SortField::Relevance,
            order: SortOrder::Descending,
        }
    }
}

/// Restricts which sources are searched; `None` means all / 为空表示搜索全部来源
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchFilters {
    #[serde(default)]
    pub result_types: Option<HashSet<SearchResultType>>,
}

impl SearchFilters {
    pub fn wants(&self, ty: SearchResultType) -> bool {
        match &self.result_types {
            Some(set) => set.contains(&ty),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SearchPagination {
    pub offset: usize,
    pub limit: usize,
}

impl Default for SearchPagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

/// Search request / 搜索请求
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub filters: SearchFilters,
    #[serde(default)]
    pub sort: SearchSort,
    #[serde(default)]
    pub pagination: SearchPagination,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_types(mut self, types: impl IntoIterator<Item = SearchResultType>) -> Self {
        self.filters.result_types = Some(types.into_iter().collect());
        self
    }

    pub fn with_sort(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = SearchSort { field, order };
        self
    }

    pub fn with_pagination(mut self, offset: usize, limit: usize) -> Self {
        self.pagination = SearchPagination { offset, limit };
        self
    }
}

/// A single match from one of the content sources / 单条搜索结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// `{book_id}_{source_tag}[_{position}]`, unique within one response
    pub id: String,
    #[serde(rename = "type")]
    pub result_type: SearchResultType,
    pub title: String,
    pub description: String,
    /// Display score in [0,1]; ordering uses the raw engine score / 显示用分数
    pub relevance_score: f64,
    pub book_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SearchResult {
    pub fn compose_id(book_id: &str, ty: SearchResultType, position: Option<i64>) -> String {
        match position {
            Some(pos) => format!("{}_{}_{}", book_id, ty.tag(), pos),
            None => format!("{}_{}", book_id, ty.tag()),
        }
    }
}

/// Search response; `total_count` is the pre-pagination match count so the
/// caller can compute "has more" / 响应中 total_count 为分页前的总数
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    pub total_count: usize,
    pub pagination: SearchPagination,
    pub execution_time_ms: u64,
}

/// One remembered query / 一条搜索历史
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentSearch {
    pub query: String,
    /// Unix millis / 毫秒时间戳
    pub created_at: i64,
}

/// Searchable book metadata supplied by the library / 图书元数据
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookMetadata {
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub genre: String,
    #[serde(default)]
    pub language: String,
}

/// Bookmark to index / 待索引的书签
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookmarkEntry {
    pub book_id: String,
    pub bookmark_text: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub chapter: String,
    pub position: i64,
}

/// Note to index / 待索引的笔记
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoteEntry {
    pub book_id: String,
    pub note_content: String,
    #[serde(default)]
    pub note_title: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub chapter: String,
    pub position: i64,
}

/// Diagnostic counts, no stability guarantee on shape / 诊断统计
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchStatistics {
    pub indexed_books: u64,
    pub content_entries: u64,
    pub bookmark_entries: u64,
    pub note_entries: u64,
    pub history_entries: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_id() {
        assert_eq!(
            SearchResult::compose_id("b1", SearchResultType::Metadata, None),
            "b1_meta"
        );
        assert_eq!(
            SearchResult::compose_id("b1", SearchResultType::Content, Some(3)),
            "b1_content_3"
        );
    }

    #[test]
    fn test_filters_default_wants_all() {
        let filters = SearchFilters::default();
        assert!(filters.wants(SearchResultType::Metadata));
        assert!(filters.wants(SearchResultType::Note));
    }

    #[test]
    fn test_filters_restrict() {
        let query = SearchQuery::new("x").with_types([SearchResultType::Bookmark]);
        assert!(query.filters.wants(SearchResultType::Bookmark));
        assert!(!query.filters.wants(SearchResultType::Content));
    }

    #[test]
    fn test_default_sort_is_relevance_descending() {
        let sort = SearchSort::default();
        assert_eq!(sort.field, SortField::Relevance);
        assert_eq!(sort.order, SortOrder::Descending);
    }

    #[test]
    fn test_result_type_parse() {
        assert_eq!(
            SearchResultType::parse("metadata"),
            Some(SearchResultType::Metadata)
        );
        assert_eq!(SearchResultType::parse("toc"), Some(SearchResultType::TableOfContents));
        assert_eq!(SearchResultType::parse("unknown"), None);
    }
}
