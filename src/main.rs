use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use bookvault_backend::config;
use bookvault_backend::search::{index, SearchService, SearchTuning};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookvault_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config().map_err(anyhow::Error::msg)?;
    tracing::info!(
        "Server will listen on {}:{}",
        app_config.server.host,
        app_config.server.port
    );

    // Create data directory if not exists / 创建数据目录
    let data_dir = app_config.get_data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!("Created data directory: {:?}", data_dir);
    }

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| app_config.get_database_url());
    let pool = index::open_pool(&database_url).await?;

    let search = Arc::new(SearchService::with_tuning(
        pool.clone(),
        SearchTuning::from_config(&app_config.search),
    ));
    search.initialize().await?;

    let app_state = Arc::new(AppState { db: pool, search });

    let app = Router::new()
        .route("/api/health", get(api::server::health_check))
        .route("/api/search", post(api::search::query::search))
        .route("/api/search/metadata", post(api::search::query::search_metadata))
        .route("/api/search/content", post(api::search::query::search_content))
        .route("/api/search/bookmarks", post(api::search::query::search_bookmarks))
        .route("/api/search/notes", post(api::search::query::search_notes))
        .route("/api/search/suggestions", get(api::search::query::suggestions))
        .route("/api/search/history", get(api::search::query::recent_searches))
        .route("/api/search/history", post(api::search::query::save_to_history))
        .route("/api/search/history", delete(api::search::query::clear_history))
        .route("/api/search/index/book", post(api::search::admin::index_book))
        .route("/api/search/index/book/:id", delete(api::search::admin::remove_book))
        .route(
            "/api/search/index/book/:id/metadata",
            put(api::search::admin::update_book_metadata),
        )
        .route("/api/search/index/bookmark", post(api::search::admin::index_bookmark))
        .route("/api/search/index/note", post(api::search::admin::index_note))
        .route("/api/search/index/rebuild", post(api::search::admin::rebuild))
        .route("/api/search/index/optimize", post(api::search::admin::optimize))
        .route("/api/search/index/status", get(api::search::admin::status))
        .route("/api/search/settings", get(api::search::admin::get_settings))
        .route("/api/search/settings", put(api::search::admin::update_settings))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("BookVault search backend listening on {}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
