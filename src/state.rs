use sqlx::SqlitePool;
use std::sync::Arc;

use bookvault_backend::search::SearchService;

/// Shared application state / 共享应用状态
pub struct AppState {
    pub db: SqlitePool,
    pub search: Arc<SearchService>,
}
