//! # GET /files/read/{folderPath}/{key}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use upload_gateway_types::{ResultEnvelope, StoredObject};

use super::{ensure_bucket, path_key};
use crate::config::GatewayState;
use crate::error::GatewayError;

/// GET /files/read/{folderPath}/{key}: オブジェクトの本体とメタデータを取得する。
pub async fn handle_read(
    State(state): State<Arc<GatewayState>>,
    Path((folder_path, key)): Path<(String, String)>,
) -> Result<Json<ResultEnvelope<StoredObject>>, GatewayError> {
    ensure_bucket(&state).await;

    let key = path_key(&folder_path, &key);
    let result = state
        .store
        .get_object(&key)
        .await
        .map_err(GatewayError::Storage)?;

    tracing::info!(key = %key, size_bytes = result.content_length, "オブジェクトを取得しました");

    Ok(Json(ResultEnvelope { result }))
}
