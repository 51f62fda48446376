//! # ルーター構築
//!
//! ルート定義とミドルウェアチェーン（外側から順に）:
//! 1. リクエストログ（TraceLayer）
//! 2. CORS（全オリジン許可）
//! 3. セキュリティヘッダー
//! 4. リクエストボディサイズ上限

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use crate::config::GatewayState;
use crate::endpoints::{
    handle_delete, handle_describe, handle_list, handle_read, handle_upload_multiple,
    handle_upload_single,
};
use crate::middleware::security_headers;

/// Gatewayのルーターを構築する。
pub fn build_router(state: Arc<GatewayState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::PUT,
            Method::PATCH,
            Method::POST,
            Method::DELETE,
        ])
        .allow_headers(Any);

    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route("/", get(handle_describe))
        .route("/files", get(handle_list))
        .route("/files/upload/multiple", post(handle_upload_multiple))
        .route("/files/upload/single", post(handle_upload_single))
        .route("/files/delete/{folder_path}/{key}", delete(handle_delete))
        .route("/files/read/{folder_path}/{key}", get(handle_read))
        .layer(DefaultBodyLimit::max(state.config.max_upload_bytes))
        .layer(axum::middleware::from_fn(security_headers))
        .layer(cors)
        .layer(trace)
        .with_state(state)
}
