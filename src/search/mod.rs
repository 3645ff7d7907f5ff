//! Search module - multi-source full-text search / 搜索模块
//!
//! Architecture / 架构：
//! - Four dedicated FTS5 indexes: book metadata, book content, bookmarks,
//!   notes. Executors fan out concurrently and the merger treats all
//!   sources as peers.
//! - The library subsystem feeds the indexes (index on download, remove on
//!   delete); this module never touches the library's own tables, it only
//!   carries book ids back in results.
//! - One `SearchService` instance per process, constructed explicitly and
//!   handed down from the composition root. / 服务实例由组合根显式构造并下发

pub mod error;
pub mod extract;
pub mod history;
pub mod index;
pub mod rank;
pub mod service;
pub mod snippet;
pub mod suggest;
pub mod types;
pub mod validate;

mod sources;

pub use error::{QueryRejection, SearchError};
pub use extract::{ChapterText, PlainTextExtractor, TextExtractor};
pub use history::SearchHistory;
pub use index::SearchIndex;
pub use service::{SearchService, SearchTuning};
pub use suggest::{NoContentSuggestions, SuggestionSource};
pub use types::{
    BookMetadata, BookmarkEntry, NoteEntry, RecentSearch, SearchFilters, SearchPagination,
    SearchQuery, SearchResponse, SearchResult, SearchResultType, SearchSort, SearchStatistics,
    SortField, SortOrder,
};
