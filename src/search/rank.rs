//! Result ranking, merging and pagination / 结果排序、合并与分页
//!
//! All sources are peers: merged by plain concatenation, no per-source
//! weighting and no cross-source deduplication (a book may legitimately
//! appear once per matching source).

use std::cmp::Ordering;

use super::types::{SearchPagination, SearchResult, SearchSort, SortField, SortOrder};

/// Internal ranked record: keeps the raw engine score for ordering and the
/// index timestamp for date sorts. / 内部记录保留原始分数与索引时间戳
#[derive(Debug, Clone)]
pub(crate) struct Ranked {
    pub result: SearchResult,
    /// Raw bm25 value: negative, numerically smaller = better match
    pub raw_score: f64,
    /// Unix millis the row was indexed / 行入索引的毫秒时间戳
    pub indexed_at: i64,
}

/// Map a raw bm25 value onto [0,1) for display. Monotonic: a better match
/// always gets a larger value. The transform is a fixed calibration and
/// must stay stable across releases; ordering never uses it.
/// / 显示用分数归一化，排序始终基于原始分数
pub fn normalize_score(raw: f64) -> f64 {
    let s = (-raw).max(0.0);
    s / (1.0 + s)
}

/// Sort the merged result set in place and return it. Stable: ties keep
/// executor-then-row order. / 稳定排序，平分保持来源顺序
pub(crate) fn merge_and_sort(mut results: Vec<Ranked>, sort: SearchSort) -> Vec<Ranked> {
    results.sort_by(|a, b| {
        let ord = match sort.field {
            // 原始 bm25 越小越相关，这里统一翻转成“越大越相关”
            SortField::Relevance => (-a.raw_score)
                .partial_cmp(&(-b.raw_score))
                .unwrap_or(Ordering::Equal),
            SortField::Title => a
                .result
                .title
                .to_lowercase()
                .cmp(&b.result.title.to_lowercase()),
            SortField::Position => a
                .result
                .position
                .unwrap_or(0)
                .cmp(&b.result.position.unwrap_or(0)),
            SortField::DateAdded | SortField::DateModified => a.indexed_at.cmp(&b.indexed_at),
        };
        match sort.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
    results
}

/// `[offset, offset + limit)` clamped to the result set; empty when the
/// offset is past the end. / 截取分页窗口
pub(crate) fn paginate(results: &[Ranked], pagination: SearchPagination) -> Vec<SearchResult> {
    results
        .iter()
        .skip(pagination.offset)
        .take(pagination.limit)
        .map(|r| r.result.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::types::SearchResultType;

    fn ranked(title: &str, raw: f64, position: Option<i64>, indexed_at: i64) -> Ranked {
        Ranked {
            result: SearchResult {
                id: format!("b1_meta_{}", title),
                result_type: SearchResultType::Metadata,
                title: title.to_string(),
                description: String::new(),
                relevance_score: normalize_score(raw),
                book_id: "b1".to_string(),
                context: None,
                position,
                snippet: None,
            },
            raw_score: raw,
            indexed_at,
        }
    }

    #[test]
    fn test_normalize_bounded_and_monotonic() {
        assert_eq!(normalize_score(0.0), 0.0);
        // 正的原始分数视为零相关
        assert_eq!(normalize_score(3.0), 0.0);
        let better = normalize_score(-8.0);
        let worse = normalize_score(-1.0);
        assert!(better > worse);
        assert!(better < 1.0);
        assert!(worse > 0.0);
    }

    #[test]
    fn test_relevance_descending_puts_best_first() {
        let sorted = merge_and_sort(
            vec![
                ranked("weak", -0.5, None, 0),
                ranked("strong", -9.0, None, 0),
                ranked("mid", -3.0, None, 0),
            ],
            SearchSort::default(),
        );
        let titles: Vec<&str> = sorted.iter().map(|r| r.result.title.as_str()).collect();
        assert_eq!(titles, ["strong", "mid", "weak"]);
    }

    #[test]
    fn test_title_sort_both_orders() {
        let input = vec![
            ranked("cherry", -1.0, None, 0),
            ranked("Apple", -1.0, None, 0),
            ranked("banana", -1.0, None, 0),
        ];
        let asc = merge_and_sort(
            input.clone(),
            SearchSort {
                field: SortField::Title,
                order: SortOrder::Ascending,
            },
        );
        let titles: Vec<&str> = asc.iter().map(|r| r.result.title.as_str()).collect();
        assert_eq!(titles, ["Apple", "banana", "cherry"]);

        let desc = merge_and_sort(
            input,
            SearchSort {
                field: SortField::Title,
                order: SortOrder::Descending,
            },
        );
        let titles: Vec<&str> = desc.iter().map(|r| r.result.title.as_str()).collect();
        assert_eq!(titles, ["cherry", "banana", "Apple"]);
    }

    #[test]
    fn test_missing_position_sorts_as_zero() {
        let sorted = merge_and_sort(
            vec![
                ranked("pos5", -1.0, Some(5), 0),
                ranked("none", -1.0, None, 0),
                ranked("neg", -1.0, Some(-2), 0),
            ],
            SearchSort {
                field: SortField::Position,
                order: SortOrder::Ascending,
            },
        );
        let titles: Vec<&str> = sorted.iter().map(|r| r.result.title.as_str()).collect();
        assert_eq!(titles, ["neg", "none", "pos5"]);
    }

    #[test]
    fn test_date_sort_uses_index_timestamp() {
        let sorted = merge_and_sort(
            vec![
                ranked("old", -1.0, None, 100),
                ranked("new", -1.0, None, 300),
                ranked("mid", -1.0, None, 200),
            ],
            SearchSort {
                field: SortField::DateAdded,
                order: SortOrder::Descending,
            },
        );
        let titles: Vec<&str> = sorted.iter().map(|r| r.result.title.as_str()).collect();
        assert_eq!(titles, ["new", "mid", "old"]);
    }

    #[test]
    fn test_stable_ties_keep_input_order() {
        let sorted = merge_and_sort(
            vec![
                ranked("first", -2.0, None, 0),
                ranked("second", -2.0, None, 0),
                ranked("third", -2.0, None, 0),
            ],
            SearchSort::default(),
        );
        let titles: Vec<&str> = sorted.iter().map(|r| r.result.title.as_str()).collect();
        assert_eq!(titles, ["first", "second", "third"]);
    }

    #[test]
    fn test_paginate_clamps() {
        let results: Vec<Ranked> = (0..5)
            .map(|i| ranked(&format!("t{}", i), -1.0, None, 0))
            .collect();
        let p = |offset, limit| SearchPagination { offset, limit };

        assert_eq!(paginate(&results, p(0, 3)).len(), 3);
        assert_eq!(paginate(&results, p(4, 10)).len(), 1);
        assert!(paginate(&results, p(5, 10)).is_empty());
        assert!(paginate(&results, p(100, 10)).is_empty());
    }

    #[test]
    fn test_paginate_concatenation_is_idempotent() {
        let results: Vec<Ranked> = (0..9)
            .map(|i| ranked(&format!("t{}", i), -(i as f64), None, 0))
            .collect();
        let sorted = merge_and_sort(results, SearchSort::default());

        let k = 4;
        let m = 3;
        let mut pieces = paginate(
            &sorted,
            SearchPagination {
                offset: 0,
                limit: k,
            },
        );
        pieces.extend(paginate(
            &sorted,
            SearchPagination {
                offset: k,
                limit: m,
            },
        ));
        let whole = paginate(
            &sorted,
            SearchPagination {
                offset: 0,
                limit: k + m,
            },
        );
        let piece_ids: Vec<&str> = pieces.iter().map(|r| r.id.as_str()).collect();
        let whole_ids: Vec<&str> = whole.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(piece_ids, whole_ids);
    }
}
