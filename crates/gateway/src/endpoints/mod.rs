//! # Gatewayエンドポイント

pub mod delete;
pub mod describe;
pub mod list;
pub mod read;
pub mod upload;

pub use delete::handle_delete;
pub use describe::handle_describe;
pub use list::handle_list;
pub use read::handle_read;
pub use upload::{handle_upload_multiple, handle_upload_single};

use crate::config::GatewayState;

/// 削除・取得の前にバケットの存在を保証する。
/// 失敗してもログに残すのみで、後続の操作はそのまま実行する。
pub(crate) async fn ensure_bucket(state: &GatewayState) {
    if let Err(e) = state.store.ensure_bucket().await {
        tracing::warn!(
            error = %e,
            bucket = %state.store.bucket_name(),
            "バケットの存在確認に失敗しました。処理を続行します"
        );
    }
}

/// パスパラメータからオブジェクトキーを構築する。
pub(crate) fn path_key(folder_path: &str, key: &str) -> String {
    format!("{folder_path}/{key}")
}
