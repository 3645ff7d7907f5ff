//! Autocomplete suggestions / 搜索建议
//!
//! History-derived suggestions fill half the budget; the remainder is
//! reserved for content-derived suggestions behind [`SuggestionSource`].
//! Results are cached per exact partial string in a bounded cache.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::RwLock;

use super::error::SearchError;

/// Maximum suggestions per request / 单次建议上限
pub const MAX_SUGGESTIONS: usize = 10;

/// Suggestion cache capacity, oldest entry evicted first / 缓存容量
pub const CACHE_CAPACITY: usize = 100;

/// Extension point for content-derived suggestions. / 内容建议的扩展点
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, partial: &str, limit: usize) -> Result<Vec<String>, SearchError>;
}

/// Default source: produces nothing. / 默认实现不产生建议
pub struct NoContentSuggestions;

#[async_trait]
impl SuggestionSource for NoContentSuggestions {
    async fn suggest(&self, _partial: &str, _limit: usize) -> Result<Vec<String>, SearchError> {
        Ok(Vec::new())
    }
}

struct CacheInner {
    map: HashMap<String, Vec<String>>,
    order: VecDeque<String>,
}

/// Bounded (partial query -> suggestion list) cache / 有界建议缓存
pub struct SuggestionCache {
    inner: RwLock<CacheInner>,
    capacity: usize,
}

impl SuggestionCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                map: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<String>> {
        self.inner.read().map.get(key).cloned()
    }

    pub fn put(&self, key: String, values: Vec<String>) {
        let mut inner = self.inner.write();
        if !inner.map.contains_key(&key) {
            inner.order.push_back(key.clone());
            if inner.order.len() > self.capacity {
                if let Some(oldest) = inner.order.pop_front() {
                    inner.map.remove(&oldest);
                }
            }
        }
        inner.map.insert(key, values);
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.map.clear();
        inner.order.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.read().map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().map.is_empty()
    }
}
