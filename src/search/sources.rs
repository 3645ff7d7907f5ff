//! Per-source search executors / 各内容来源的查询执行器
//!
//! One indexed lookup per source, ordered by the engine's bm25 relevance,
//! mapped into the common result shape through one typed row struct per
//! index so schema drift fails at compile time instead of at first access.

use sqlx::SqlitePool;

use super::error::{classify_db_error, SearchError};
use super::rank::{normalize_score, Ranked};
use super::snippet::extract_snippet;
use super::types::{SearchResult, SearchResultType};

/// Per-source candidate cap before merge / 合并前单来源候选上限
pub(crate) const CANDIDATE_LIMIT: i64 = 200;

#[derive(Debug, sqlx::FromRow)]
struct MetadataRow {
    book_id: String,
    title: String,
    author: String,
    description: String,
    genre: String,
    indexed_at: i64,
    score: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct ContentRow {
    book_id: String,
    content: String,
    chapter: String,
    position: i64,
    indexed_at: i64,
    score: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct BookmarkRow {
    book_id: String,
    bookmark_text: String,
    note: String,
    chapter: String,
    position: i64,
    created_at: i64,
    score: f64,
}

#[derive(Debug, sqlx::FromRow)]
struct NoteRow {
    book_id: String,
    note_content: String,
    note_title: String,
    tags: String,
    chapter: String,
    position: i64,
    created_at: i64,
    score: f64,
}

pub(crate) async fn search_metadata(
    pool: &SqlitePool,
    phrase: &str,
    limit: i64,
) -> Result<Vec<Ranked>, SearchError> {
    let rows: Vec<MetadataRow> = sqlx::query_as(
        "SELECT book_id, title, author, description, genre, indexed_at,
                bm25(book_metadata_fts) AS score
         FROM book_metadata_fts
         WHERE book_metadata_fts MATCH ?
         ORDER BY score
         LIMIT ?",
    )
    .bind(phrase)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(classify_db_error)?;

    Ok(rows.into_iter().map(map_metadata_row).collect())
}

pub(crate) async fn search_content(
    pool: &SqlitePool,
    phrase: &str,
    query: &str,
    window: usize,
    limit: i64,
) -> Result<Vec<Ranked>, SearchError> {
    let rows: Vec<ContentRow> = sqlx::query_as(
        "SELECT book_id, content, chapter, position, indexed_at,
                bm25(book_content_fts) AS score
         FROM book_content_fts
         WHERE book_content_fts MATCH ?
         ORDER BY score
         LIMIT ?",
    )
    .bind(phrase)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(classify_db_error)?;

    Ok(rows
        .into_iter()
        .map(|row| map_content_row(row, query, window))
        .collect())
}

pub(crate) async fn search_bookmarks(
    pool: &SqlitePool,
    phrase: &str,
    query: &str,
    window: usize,
    limit: i64,
) -> Result<Vec<Ranked>, SearchError> {
    let rows: Vec<BookmarkRow> = sqlx::query_as(
        "SELECT book_id, bookmark_text, note, chapter, position, created_at,
                bm25(bookmark_fts) AS score
         FROM bookmark_fts
         WHERE bookmark_fts MATCH ?
         ORDER BY score
         LIMIT ?",
    )
    .bind(phrase)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(classify_db_error)?;

    Ok(rows
        .into_iter()
        .map(|row| map_bookmark_row(row, query, window))
        .collect())
}

pub(crate) async fn search_notes(
    pool: &SqlitePool,
    phrase: &str,
    query: &str,
    window: usize,
    limit: i64,
) -> Result<Vec<Ranked>, SearchError> {
    let rows: Vec<NoteRow> = sqlx::query_as(
        "SELECT book_id, note_content, note_title, tags, chapter, position, created_at,
                bm25(note_fts) AS score
         FROM note_fts
         WHERE note_fts MATCH ?
         ORDER BY score
         LIMIT ?",
    )
    .bind(phrase)
    .bind(limit)
    .fetch_all(pool)
    .await
    .map_err(classify_db_error)?;

    Ok(rows
        .into_iter()
        .map(|row| map_note_row(row, query, window))
        .collect())
}

fn map_metadata_row(row: MetadataRow) -> Ranked {
    let description = if row.description.is_empty() {
        row.author.clone()
    } else if row.author.is_empty() {
        row.description.clone()
    } else {
        format!("{} · {}", row.author, row.description)
    };
    Ranked {
        result: SearchResult {
            id: SearchResult::compose_id(&row.book_id, SearchResultType::Metadata, None),
            result_type: SearchResultType::Metadata,
            title: row.title,
            description,
            relevance_score: normalize_score(row.score),
            book_id: row.book_id,
            context: (!row.genre.is_empty()).then(|| row.genre.clone()),
            position: None,
            snippet: None,
        },
        raw_score: row.score,
        indexed_at: row.indexed_at,
    }
}

fn map_content_row(row: ContentRow, query: &str, window: usize) -> Ranked {
    let snippet = extract_snippet(&row.content, query, window);
    let title = if row.chapter.is_empty() {
        format!("Position {}", row.position)
    } else {
        row.chapter.clone()
    };
    Ranked {
        result: SearchResult {
            id: SearchResult::compose_id(
                &row.book_id,
                SearchResultType::Content,
                Some(row.position),
            ),
            result_type: SearchResultType::Content,
            title,
            description: snippet.clone(),
            relevance_score: normalize_score(row.score),
            book_id: row.book_id,
            context: (!row.chapter.is_empty()).then(|| row.chapter.clone()),
            position: Some(row.position),
            snippet: Some(snippet),
        },
        raw_score: row.score,
        indexed_at: row.indexed_at,
    }
}

fn map_bookmark_row(row: BookmarkRow, query: &str, window: usize) -> Ranked {
    // 摘要取自笔记文本，没有笔记时退回书签文字
    let snippet_source = if row.note.is_empty() {
        &row.bookmark_text
    } else {
        &row.note
    };
    let snippet = extract_snippet(snippet_source, query, window);
    Ranked {
        result: SearchResult {
            id: SearchResult::compose_id(
                &row.book_id,
                SearchResultType::Bookmark,
                Some(row.position),
            ),
            result_type: SearchResultType::Bookmark,
            title: row.bookmark_text,
            description: row.note,
            relevance_score: normalize_score(row.score),
            book_id: row.book_id,
            context: (!row.chapter.is_empty()).then(|| row.chapter.clone()),
            position: Some(row.position),
            snippet: Some(snippet),
        },
        raw_score: row.score,
        indexed_at: row.created_at,
    }
}

fn map_note_row(row: NoteRow, query: &str, window: usize) -> Ranked {
    let snippet = extract_snippet(&row.note_content, query, window);
    let title = if row.note_title.is_empty() {
        // 无标题的笔记用内容开头充当标题
        row.note_content.chars().take(60).collect()
    } else {
        row.note_title.clone()
    };
    let context = if !row.tags.is_empty() {
        Some(row.tags.clone())
    } else if !row.chapter.is_empty() {
        Some(row.chapter.clone())
    } else {
        None
    };
    Ranked {
        result: SearchResult {
            id: SearchResult::compose_id(&row.book_id, SearchResultType::Note, Some(row.position)),
            result_type: SearchResultType::Note,
            title,
            description: snippet.clone(),
            relevance_score: normalize_score(row.score),
            book_id: row.book_id,
            context,
            position: Some(row.position),
            snippet: Some(snippet),
        },
        raw_score: row.score,
        indexed_at: row.created_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::extract::ChapterText;
    use crate::search::index::SearchIndex;
    use crate::search::types::{BookMetadata, BookmarkEntry, NoteEntry};
    use crate::search::validate::fts_phrase;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn seeded_index() -> SearchIndex {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let index = SearchIndex::new(pool);
        index.initialize().await.unwrap();

        index
            .upsert_metadata(
                "b1",
                &BookMetadata {
                    title: "Flutter Development Guide".to_string(),
                    author: "Jane Doe".to_string(),
                    description: "Cross platform apps".to_string(),
                    genre: "Programming".to_string(),
                    language: "en".to_string(),
                },
            )
            .await
            .unwrap();
        index
            .replace_content(
                "b1",
                &[ChapterText {
                    chapter: "Getting Started".to_string(),
                    position: 0,
                    page_number: Some(1),
                    content: "Flutter widgets compose into trees".to_string(),
                }],
            )
            .await
            .unwrap();
        index
            .upsert_bookmark(&BookmarkEntry {
                book_id: "b1".to_string(),
                bookmark_text: "Flutter layout chapter".to_string(),
                note: "revisit constraints".to_string(),
                chapter: "Layout".to_string(),
                position: 12,
            })
            .await
            .unwrap();
        index
            .upsert_note(&NoteEntry {
                book_id: "b1".to_string(),
                note_content: "Flutter state management notes".to_string(),
                note_title: "State".to_string(),
                tags: "flutter,state".to_string(),
                chapter: String::new(),
                position: 30,
            })
            .await
            .unwrap();
        index
    }

    #[tokio::test]
    async fn test_metadata_executor_maps_rows() {
        let index = seeded_index().await;
        let hits = search_metadata(index.pool(), &fts_phrase("Flutter"), CANDIDATE_LIMIT)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        let hit = &hits[0].result;
        assert_eq!(hit.id, "b1_meta");
        assert_eq!(hit.result_type, SearchResultType::Metadata);
        assert_eq!(hit.title, "Flutter Development Guide");
        assert!(hit.description.contains("Jane Doe"));
        assert_eq!(hit.context.as_deref(), Some("Programming"));
        assert!(hit.position.is_none());
        assert!(hits[0].raw_score <= 0.0);
        assert!(hit.relevance_score >= 0.0 && hit.relevance_score < 1.0);
    }

    #[tokio::test]
    async fn test_content_executor_includes_snippet_and_position() {
        let index = seeded_index().await;
        let hits = search_content(index.pool(), &fts_phrase("widgets"), "widgets", 150, CANDIDATE_LIMIT)
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        let hit = &hits[0].result;
        assert_eq!(hit.id, "b1_content_0");
        assert_eq!(hit.title, "Getting Started");
        assert_eq!(hit.position, Some(0));
        assert!(hit.snippet.as_deref().unwrap().contains("widgets"));
    }

    #[tokio::test]
    async fn test_bookmark_and_note_executors() {
        let index = seeded_index().await;
        let phrase = fts_phrase("Flutter");

        let bookmarks = search_bookmarks(index.pool(), &phrase, "Flutter", 150, CANDIDATE_LIMIT)
            .await
            .unwrap();
        assert_eq!(bookmarks.len(), 1);
        assert_eq!(bookmarks[0].result.id, "b1_bookmark_12");
        assert_eq!(bookmarks[0].result.title, "Flutter layout chapter");

        let notes = search_notes(index.pool(), &phrase, "Flutter", 150, CANDIDATE_LIMIT)
            .await
            .unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].result.id, "b1_note_30");
        assert_eq!(notes[0].result.title, "State");
        assert_eq!(notes[0].result.context.as_deref(), Some("flutter,state"));
    }

    #[tokio::test]
    async fn test_phrase_escaping_prevents_injection() {
        let index = seeded_index().await;
        // 带运算符的输入被当作普通短语，不报语法错误
        for raw in ["widgets OR trees", "flutter*", "a\" OR \"b"] {
            let hits =
                search_content(index.pool(), &fts_phrase(raw), raw, 150, CANDIDATE_LIMIT).await;
            assert!(hits.is_ok(), "query {:?} should not be a syntax error", raw);
        }
    }

    #[tokio::test]
    async fn test_no_match_is_empty_not_error() {
        let index = seeded_index().await;
        let hits = search_metadata(index.pool(), &fts_phrase("doesnotexist123"), CANDIDATE_LIMIT)
            .await
            .unwrap();
        assert!(hits.is_empty());
    }
}
