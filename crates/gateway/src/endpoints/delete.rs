//! # DELETE /files/delete/{folderPath}/{key}

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use upload_gateway_types::{DeleteResult, ResultEnvelope};

use super::{ensure_bucket, path_key};
use crate::config::GatewayState;
use crate::error::GatewayError;

/// DELETE /files/delete/{folderPath}/{key}: オブジェクトの削除。
///
/// パスパラメータはルーターのURLデコード以外は加工しない。
/// 存在しないキーの削除結果はストアの応答に従う。
pub async fn handle_delete(
    State(state): State<Arc<GatewayState>>,
    Path((folder_path, key)): Path<(String, String)>,
) -> Result<Json<ResultEnvelope<DeleteResult>>, GatewayError> {
    ensure_bucket(&state).await;

    let data = state
        .store
        .delete_object(&path_key(&folder_path, &key))
        .await
        .map_err(GatewayError::Delete)?;

    Ok(Json(ResultEnvelope {
        result: DeleteResult {
            message: "Successfully deleted file from bucket".to_string(),
            data,
        },
    }))
}
