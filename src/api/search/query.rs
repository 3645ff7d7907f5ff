//! Search, suggestion and history endpoints / 搜索、建议与历史接口

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::ApiResponse;
use crate::state::AppState;
use bookvault_backend::search::{RecentSearch, SearchResponse, SearchResultType};

use super::types::{HistorySaveRequest, SearchRequest, SuggestionsParams};

/// POST /api/search - 跨全部来源搜索
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    let query = match request.into_query() {
        Ok(query) => query,
        Err(e) => return Json(ApiResponse::error(&e.to_string())),
    };
    match state.search.search(&query).await {
        Ok(response) => Json(ApiResponse::success(response)),
        Err(e) => {
            tracing::warn!("Search failed for '{}': {}", query.text, e);
            Json(ApiResponse::error(&e.to_string()))
        }
    }
}

async fn search_one(
    state: &AppState,
    request: SearchRequest,
    ty: SearchResultType,
) -> Json<ApiResponse<SearchResponse>> {
    let query = match request.into_query() {
        Ok(query) => query,
        Err(e) => return Json(ApiResponse::error(&e.to_string())),
    };
    let result = match ty {
        SearchResultType::Metadata => state.search.search_metadata(&query).await,
        SearchResultType::Content => state.search.search_content(&query).await,
        SearchResultType::Bookmark => state.search.search_bookmarks(&query).await,
        _ => state.search.search_notes(&query).await,
    };
    match result {
        Ok(response) => Json(ApiResponse::success(response)),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// POST /api/search/metadata - 只搜元数据
pub async fn search_metadata(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    search_one(&state, request, SearchResultType::Metadata).await
}

/// POST /api/search/content - 只搜正文
pub async fn search_content(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    search_one(&state, request, SearchResultType::Content).await
}

/// POST /api/search/bookmarks - 只搜书签
pub async fn search_bookmarks(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    search_one(&state, request, SearchResultType::Bookmark).await
}

/// POST /api/search/notes - 只搜笔记
pub async fn search_notes(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Json<ApiResponse<SearchResponse>> {
    search_one(&state, request, SearchResultType::Note).await
}

/// GET /api/search/suggestions?q= - 自动补全
pub async fn suggestions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SuggestionsParams>,
) -> Json<ApiResponse<Vec<String>>> {
    Json(ApiResponse::success(
        state.search.suggestions(&params.q).await,
    ))
}

/// GET /api/search/history - 最近搜索
pub async fn recent_searches(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<RecentSearch>>> {
    Json(ApiResponse::success(state.search.recent_searches()))
}

/// POST /api/search/history - 记录一条搜索
pub async fn save_to_history(
    State(state): State<Arc<AppState>>,
    Json(request): Json<HistorySaveRequest>,
) -> Json<ApiResponse<()>> {
    match state.search.save_to_history(&request.query).await {
        Ok(()) => Json(ApiResponse::success(())),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}

/// DELETE /api/search/history - 清空历史
pub async fn clear_history(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    match state.search.clear_history().await {
        Ok(()) => Json(ApiResponse::success(())),
        Err(e) => Json(ApiResponse::error(&e.to_string())),
    }
}
