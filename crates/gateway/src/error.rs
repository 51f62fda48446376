//! # Gateway エラー型
//!
//! 全エンドポイントで共通のエラー型と、ストア層のエラー型。

use axum::http::StatusCode;
use axum::Json;
use upload_gateway_types::{ErrorResponse, StoreErrorDetail};

/// ストア操作のエラー型。
/// ストアが返したエラーは加工せずに呼び出し元へ転送する。
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// ストアがエラーレスポンスを返した
    #[error("ストアがエラーを返しました: HTTP {status_code} {code} - {message}")]
    Service {
        code: String,
        message: String,
        status_code: u16,
    },
    /// ストアとの通信に失敗
    #[error("ストアとの通信に失敗: {0}")]
    Transport(String),
}

impl StorageError {
    /// レスポンスに埋め込むエラー詳細
    pub fn detail(&self) -> StoreErrorDetail {
        match self {
            StorageError::Service {
                code,
                message,
                status_code,
            } => StoreErrorDetail {
                code: code.clone(),
                message: message.clone(),
                status_code: Some(*status_code),
            },
            StorageError::Transport(message) => StoreErrorDetail {
                code: "NetworkingError".to_string(),
                message: message.clone(),
                status_code: None,
            },
        }
    }
}

/// ストア操作の結果型
pub type StorageResult<T> = Result<T, StorageError>;

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// 不正なリクエスト（multipartのパース失敗、想定外のフィールド、ファイル数超過）
    #[error("{0}")]
    BadRequest(String),
    /// アップロード中のストア操作に失敗
    #[error("Error uploading")]
    Upload(StorageError),
    /// 取得・一覧中のストア操作に失敗
    #[error("an error occurred")]
    Storage(StorageError),
    /// 削除中のストア操作に失敗
    #[error("An error occurred")]
    Delete(StorageError),
    /// 内部エラー
    #[error("{0}")]
    Internal(String),
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::BadRequest(_) | GatewayError::Upload(_) => StatusCode::BAD_REQUEST,
            GatewayError::Storage(_) | GatewayError::Delete(_) | GatewayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let error = match &self {
            GatewayError::Upload(e) | GatewayError::Storage(e) | GatewayError::Delete(e) => {
                Some(e.detail())
            }
            GatewayError::BadRequest(_) | GatewayError::Internal(_) => None,
        };
        let body = ErrorResponse {
            message: self.to_string(),
            error,
        };
        (status, Json(body)).into_response()
    }
}
