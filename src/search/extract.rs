//! Text extraction boundary / 文本提取边界
//!
//! Extraction of book text is an external concern; the indexer only
//! consumes plain text per chapter. [`PlainTextExtractor`] covers plain
//! formats, richer formats plug in through the trait.

use std::path::Path;

use async_trait::async_trait;

use super::error::SearchError;

/// One extracted segment of book text / 一段提取出的正文
#[derive(Debug, Clone)]
pub struct ChapterText {
    pub chapter: String,
    pub position: i64,
    pub page_number: Option<i64>,
    pub content: String,
}

/// Produces plain text per chapter/position for indexing. / 提取器接口
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(
        &self,
        source_path: &Path,
        format: &str,
    ) -> Result<Vec<ChapterText>, SearchError>;
}

/// Reads plain-text formats and segments on paragraph boundaries.
/// / 纯文本提取器，按段落边界分段
pub struct PlainTextExtractor {
    pub segment_chars: usize,
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self {
            segment_chars: 4000,
        }
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(
        &self,
        source_path: &Path,
        format: &str,
    ) -> Result<Vec<ChapterText>, SearchError> {
        match format.to_ascii_lowercase().as_str() {
            "txt" | "text" | "md" | "markdown" => {}
            other => {
                return Err(SearchError::Extraction(format!(
                    "unsupported format: {}",
                    other
                )))
            }
        }
        let raw = tokio::fs::read_to_string(source_path).await.map_err(|e| {
            SearchError::Extraction(format!("failed to read {}: {}", source_path.display(), e))
        })?;
        Ok(segment_text(&raw, self.segment_chars))
    }
}

/// Split text into segments of at most `max_chars`, preferring paragraph
/// boundaries; a single oversized paragraph is hard-split. / 优先按段落切分
fn segment_text(text: &str, max_chars: usize) -> Vec<ChapterText> {
    let mut segments = Vec::new();
    let mut current = String::new();

    for paragraph in text.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        let para_len = paragraph.chars().count();

        if para_len > max_chars {
            if !current.is_empty() {
                push_segment(&mut segments, &mut current);
            }
            let chars: Vec<char> = paragraph.chars().collect();
            for chunk in chars.chunks(max_chars) {
                let mut piece: String = chunk.iter().collect();
                push_segment(&mut segments, &mut piece);
            }
            continue;
        }

        if !current.is_empty() && current.chars().count() + para_len > max_chars {
            push_segment(&mut segments, &mut current);
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(paragraph);
    }
    if !current.is_empty() {
        push_segment(&mut segments, &mut current);
    }
    segments
}

fn push_segment(segments: &mut Vec<ChapterText>, buf: &mut String) {
    let position = segments.len() as i64;
    segments.push(ChapterText {
        chapter: format!("Part {}", position + 1),
        position,
        page_number: None,
        content: std::mem::take(buf),
    });
}
