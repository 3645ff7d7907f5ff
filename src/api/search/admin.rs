//! Index maintenance endpoints / 索引维护接口

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::ApiResponse;
use crate::state::AppState;
use bookvault_backend::search::{BookMetadata, BookmarkEntry, NoteEntry, SearchStatistics};

use super::types::{IndexBookRequest, SettingsRequest};

/// POST /api/search/index/book - 索引一本书
pub async fn index_book(
    State(state): State<Arc<AppState>>,
    Json(request): Json<IndexBookRequest>,
) -> Json<ApiResponse<Value>> {
    if let Some(metadata) = &request.metadata {
        if let Err(e) = state
            .search
            .update_book_metadata(&request.book_id, Some(metadata))
            .await
        {
            return Json(ApiResponse::error(&e.to_string()));
        }
    }
    match state
        .search
        .index_book(
            &request.book_id,
            std::path::Path::new(&request.source_path),
            &request.format,
        )
        .await
    {
        Ok(segments) => Json(ApiResponse::success(json!({
            "book_id": request.book_id,
            "segments": segments,
        }))),
        Err(e) => {
            tracing::error!("Failed to index book {}: {}", request.book_id, e);
            Json(ApiResponse::error(&e.to_string()))
        }
    }
}

/// DELETE /api/search/index/book/:id - 从索引移除一本书
pub async fn remove_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
) -> Json<ApiResponse<()>> {
    match state.search.remove_book(&book_id).await {
        Ok(()) => Json(ApiResponse::success(())),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// PUT /api/search/index/book/:id/metadata - 更新元数据索引
pub async fn update_book_metadata(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<String>,
    Json(metadata): Json<BookMetadata>,
) -> Json<ApiResponse<()>> {
    match state
        .search
        .update_book_metadata(&book_id, Some(&metadata))
        .await
    {
        Ok(()) => Json(ApiResponse::success(())),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// POST /api/search/index/bookmark - 索引一条书签
pub async fn index_bookmark(
    State(state): State<Arc<AppState>>,
    Json(bookmark): Json<BookmarkEntry>,
) -> Json<ApiResponse<()>> {
    match state.search.index_bookmark(&bookmark).await {
        Ok(()) => Json(ApiResponse::success(())),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// POST /api/search/index/note - 索引一条笔记
pub async fn index_note(
    State(state): State<Arc<AppState>>,
    Json(note): Json<NoteEntry>,
) -> Json<ApiResponse<()>> {
    match state.search.index_note(&note).await {
        Ok(()) => Json(ApiResponse::success(())),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// POST /api/search/index/rebuild - 重建索引
///
/// 重建后所有内容都需要重新索引
pub async fn rebuild(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    match state.search.rebuild().await {
        Ok(()) => {
            tracing::info!("Search indexes rebuilt");
            Json(ApiResponse::success(()))
        }
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// POST /api/search/index/optimize - 压缩索引
pub async fn optimize(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    state.search.optimize().await;
    Json(ApiResponse::success(()))
}

/// GET /api/search/index/status - 索引统计
pub async fn status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<SearchStatistics>> {
    match state.search.statistics().await {
        Ok(stats) => Json(ApiResponse::success(stats)),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// GET /api/search/settings - 搜索开关状态
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<ApiResponse<Value>> {
    Json(ApiResponse::success(
        json!({ "enabled": state.search.is_enabled() }),
    ))
}

/// PUT /api/search/settings - 更新搜索开关
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SettingsRequest>,
) -> Json<ApiResponse<Value>> {
    match state.search.set_enabled(request.enabled).await {
        Ok(()) => Json(ApiResponse::success(
            json!({ "enabled": request.enabled }),
        )),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}
