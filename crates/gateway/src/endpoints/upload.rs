//! # POST /files/upload/single, POST /files/upload/multiple
//!
//! multipartで受け取ったファイルをストアへ `public-read` で書き込む。
//! キーは `{folderName}/{epochMillis}-{originalFilename}` 形式でサーバー側が生成する。

use std::sync::Arc;

use axum::extract::{Multipart, Query, State};
use axum::Json;
use upload_gateway_types::{ObjectAcl, UploadResponse, UploadedFile};

use crate::config::GatewayState;
use crate::error::GatewayError;
use crate::keys::{epoch_millis, folder_name, object_key};
use crate::multipart::{read_file_parts, FilePart};

/// アップロード成功時のメッセージ
const UPLOADED: &str = "Uploaded";

/// POST /files/upload/multiple: 複数ファイルのアップロード。
///
/// ファイル数が上限を超える場合は書き込み前に拒否する。
/// 書き込みは並行に行い、最初の失敗でバッチ全体を中断する（書き込み済みのものは残る）。
///
/// キーの時刻部分はバッチ内で共通のため、同名ファイルは同じキーになり
/// ストアには1件しか残らない（レスポンスには全件が含まれる）。
pub async fn handle_upload_multiple(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<Vec<(String, String)>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse<Vec<UploadedFile>>>, GatewayError> {
    let parts = read_file_parts(multipart, state.config.upload_limit).await?;
    let folder = folder_name(&query);
    let millis = epoch_millis()?;

    let uploads = parts
        .into_iter()
        .map(|part| store_file(&state, folder.as_deref(), millis, part));
    let files = futures::future::try_join_all(uploads).await?;

    tracing::info!(file_count = files.len(), "複数ファイルのアップロード完了");

    Ok(Json(UploadResponse {
        message: UPLOADED.to_string(),
        file_data: files,
    }))
}

/// POST /files/upload/single: 単一ファイルのアップロード。
pub async fn handle_upload_single(
    State(state): State<Arc<GatewayState>>,
    Query(query): Query<Vec<(String, String)>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse<UploadedFile>>, GatewayError> {
    let part = read_file_parts(multipart, 1)
        .await?
        .pop()
        .ok_or_else(|| GatewayError::BadRequest("No file provided".to_string()))?;
    let folder = folder_name(&query);

    let file = store_file(&state, folder.as_deref(), epoch_millis()?, part).await?;

    Ok(Json(UploadResponse {
        message: UPLOADED.to_string(),
        file_data: file,
    }))
}

/// ファイル1件のキーを生成し、ストアへ書き込む。
async fn store_file(
    state: &GatewayState,
    folder: Option<&str>,
    millis: u128,
    part: FilePart,
) -> Result<UploadedFile, GatewayError> {
    let key = object_key(folder, millis, &part.originalname);
    let size = part.data.len() as u64;

    let output = state
        .store
        .put_object(&key, part.data, &part.mimetype, ObjectAcl::PublicRead)
        .await
        .map_err(GatewayError::Upload)?;

    Ok(UploadedFile {
        fieldname: part.fieldname,
        originalname: part.originalname,
        encoding: part.encoding,
        content_type: part.mimetype.clone(),
        mimetype: part.mimetype,
        size,
        bucket: state.store.bucket_name().to_string(),
        key,
        acl: ObjectAcl::PublicRead,
        location: output.location,
        etag: output.etag,
        version_id: output.version_id,
    })
}
