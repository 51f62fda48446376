//! # オブジェクトキー生成
//!
//! アップロード時のキーは常にサーバー側で生成する。
//! 一意性はミリ秒タイムスタンプのプレフィックスのみで担保する
//! （同一ミリ秒・同一ファイル名のアップロードは衝突しうる）。

use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::GatewayError;

/// 現在時刻のUNIXエポックミリ秒
pub fn epoch_millis() -> Result<u128, GatewayError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .map_err(|e| GatewayError::Internal(format!("時刻取得失敗: {e}")))
}

/// オブジェクトキーを構築する。
///
/// - フォルダ指定あり: `{folder}/{millis}-{original_filename}`
/// - フォルダ指定なし（空文字列を含む）: `{millis}-{original_filename}`
pub fn object_key(folder: Option<&str>, millis: u128, original_filename: &str) -> String {
    match folder.filter(|f| !f.is_empty()) {
        Some(folder) => format!("{folder}/{millis}-{original_filename}"),
        None => format!("{millis}-{original_filename}"),
    }
}

/// クエリ文字列から `folderName` を取り出す。
///
/// 同名パラメータが複数ある場合は最後の値を採用し、
/// `<` は `&lt;` にエスケープする。
pub fn folder_name(query: &[(String, String)]) -> Option<String> {
    query
        .iter()
        .rev()
        .find(|(name, _)| name == "folderName")
        .map(|(_, value)| value.replace('<', "&lt;"))
        .filter(|value| !value.is_empty())
}
