//! Snippet extraction - bounded text window around the first match
//! / 摘要提取：围绕首个匹配位置截取固定宽度的文本窗口

/// Default window width in characters / 默认窗口宽度（字符数）
pub const SNIPPET_WINDOW: usize = 150;

const ELLIPSIS: &str = "…";

/// Extract a window of `window` characters centered on the first
/// case-insensitive occurrence of `query` in `text`.
///
/// - Text no longer than the window is returned unmodified.
/// - With no occurrence the leading window is returned with a trailing
///   ellipsis.
/// - Ellipsis markers appear only where the window does not touch a text
///   boundary. / 仅在窗口未触及文本边界处加省略号
pub fn extract_snippet(text: &str, query: &str, window: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= window {
        return text.to_string();
    }

    let lower_text = text.to_lowercase();
    let lower_query = query.trim().to_lowercase();
    let match_pos = if lower_query.is_empty() {
        None
    } else {
        lower_text
            .find(&lower_query)
            .map(|byte_pos| lower_text[..byte_pos].chars().count())
    };

    let (start, end) = match match_pos {
        Some(pos) => {
            let end = (pos.saturating_sub(window / 2) + window).min(chars.len());
            (end.saturating_sub(window), end)
        }
        None => (0, window),
    };

    let mut out = String::with_capacity(window * 4);
    if start > 0 {
        out.push_str(ELLIPSIS);
    }
    out.extend(&chars[start..end]);
    if end < chars.len() {
        out.push_str(ELLIPSIS);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn long_text() -> String {
        let mut text = "a".repeat(200);
        text.push_str(" needle ");
        text.push_str(&"b".repeat(200));
        text
    }

    #[test]
    fn test_short_text_unmodified() {
        let text = "short text with needle inside";
        assert_eq!(extract_snippet(text, "needle", SNIPPET_WINDOW), text);
    }

    #[test]
    fn test_exact_window_len_unmodified() {
        let text = "x".repeat(SNIPPET_WINDOW);
        let snippet = extract_snippet(&text, "zzz", SNIPPET_WINDOW);
        assert_eq!(snippet, text);
        assert!(!snippet.contains(ELLIPSIS));
    }

    #[test]
    fn test_window_centers_on_match() {
        let snippet = extract_snippet(&long_text(), "needle", SNIPPET_WINDOW);
        assert!(snippet.contains("needle"));
        assert!(snippet.starts_with(ELLIPSIS));
        assert!(snippet.ends_with(ELLIPSIS));
        // 去掉两端省略号后正好是窗口宽度
        let body: String = snippet
            .trim_start_matches(ELLIPSIS)
            .trim_end_matches(ELLIPSIS)
            .to_string();
        assert_eq!(body.chars().count(), SNIPPET_WINDOW);
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let snippet = extract_snippet(&long_text(), "NEEDLE", SNIPPET_WINDOW);
        assert!(snippet.contains("needle"));
    }

    #[test]
    fn test_no_match_leading_window() {
        let text = "c".repeat(400);
        let snippet = extract_snippet(&text, "missing", SNIPPET_WINDOW);
        assert!(!snippet.starts_with(ELLIPSIS));
        assert!(snippet.ends_with(ELLIPSIS));
        assert_eq!(
            snippet.trim_end_matches(ELLIPSIS).chars().count(),
            SNIPPET_WINDOW
        );
    }

    #[test]
    fn test_match_near_start_has_no_leading_ellipsis() {
        let mut text = "needle ".to_string();
        text.push_str(&"d".repeat(400));
        let snippet = extract_snippet(&text, "needle", SNIPPET_WINDOW);
        assert!(snippet.starts_with("needle"));
        assert!(snippet.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_match_near_end_has_no_trailing_ellipsis() {
        let mut text = "e".repeat(400);
        text.push_str(" needle");
        let snippet = extract_snippet(&text, "needle", SNIPPET_WINDOW);
        assert!(snippet.starts_with(ELLIPSIS));
        assert!(snippet.ends_with("needle"));
    }

    #[test]
    fn test_multibyte_text_is_safe() {
        let mut text = "书".repeat(200);
        text.push_str("飞鸟集");
        text.push_str(&"卷".repeat(200));
        let snippet = extract_snippet(&text, "飞鸟集", SNIPPET_WINDOW);
        assert!(snippet.contains("飞鸟集"));
    }
}
