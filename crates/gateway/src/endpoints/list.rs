//! # GET /files

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use upload_gateway_types::{ObjectListing, ResultEnvelope};

use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /files: 設定されたプレフィックス配下のオブジェクト一覧。
///
/// プレフィックスはリクエストごとに変更できない。ストアの1ページ分のみ返す。
pub async fn handle_list(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<ResultEnvelope<ObjectListing>>, GatewayError> {
    let result = state
        .store
        .list_objects(&state.config.list_prefix)
        .await
        .map_err(GatewayError::Storage)?;

    Ok(Json(ResultEnvelope { result }))
}
