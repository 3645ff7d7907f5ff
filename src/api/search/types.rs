//! Wire types for the search endpoints / 搜索接口的请求与响应类型

use serde::Deserialize;

use bookvault_backend::search::{
    BookMetadata, SearchError, SearchQuery, SearchResultType, SortField, SortOrder,
};

/// 搜索请求
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
    /// Source names; absent means all / 来源名，缺省表示全部
    #[serde(default)]
    pub result_types: Option<Vec<String>>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    20
}

impl SearchRequest {
    /// Parse the wire request into a typed query. Unknown names are caller
    /// errors. / 未知的来源或排序名是调用方错误
    pub fn into_query(self) -> Result<SearchQuery, SearchError> {
        let mut query = SearchQuery::new(self.query).with_pagination(self.offset, self.limit);

        if let Some(names) = self.result_types {
            let mut types = Vec::with_capacity(names.len());
            for name in &names {
                let ty = SearchResultType::parse(name).ok_or_else(|| {
                    SearchError::InvalidFilter(format!("unknown result type: {}", name))
                })?;
                types.push(ty);
            }
            query = query.with_types(types);
        }

        if let Some(field_name) = self.sort_by {
            let field = SortField::parse(&field_name).ok_or_else(|| {
                SearchError::InvalidFilter(format!("unknown sort field: {}", field_name))
            })?;
            let order = match self.sort_order {
                Some(order_name) => SortOrder::parse(&order_name).ok_or_else(|| {
                    SearchError::InvalidFilter(format!("unknown sort order: {}", order_name))
                })?,
                None => SortOrder::Descending,
            };
            query = query.with_sort(field, order);
        }

        Ok(query)
    }
}

/// 建议请求参数
#[derive(Debug, Deserialize)]
pub struct SuggestionsParams {
    #[serde(default)]
    pub q: String,
}

/// 保存历史请求
#[derive(Debug, Deserialize)]
pub struct HistorySaveRequest {
    pub query: String,
}

/// 索引一本书
#[derive(Debug, Deserialize)]
pub struct IndexBookRequest {
    pub book_id: String,
    pub source_path: String,
    pub format: String,
    /// Supplied on first indexing so the book is findable by title/author
    /// / 首次索引时附带元数据
    #[serde(default)]
    pub metadata: Option<BookMetadata>,
}

/// 搜索开关
#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    pub enabled: bool,
}
