//! # GET /
//!
//! サービス情報の公開。外部依存がないため常に成功する。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use upload_gateway_types::{ServiceDescription, UploadParams, UploadUrls};

use crate::config::GatewayState;

/// GET /: 利用可能なアップロードエンドポイントとパラメータの説明を返す。
pub async fn handle_describe(State(state): State<Arc<GatewayState>>) -> Json<ServiceDescription> {
    let base = &state.config.public_base_url;

    Json(ServiceDescription {
        message: "AWS S3 file upload running successfully".to_string(),
        url: UploadUrls {
            single: format!("{base}/files/upload/single"),
            multiple: format!("{base}/files/upload/multiple"),
        },
        params: UploadParams {
            file: "this is the name of the input field".to_string(),
            folder_name:
                "if you want to place files in a folder, add folderName as query string"
                    .to_string(),
            format: format!("{base}/files/upload/single?folderName=my_files"),
        },
    })
}
