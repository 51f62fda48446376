//! # Upload Gateway 共有型定義
//!
//! GatewayのHTTPレスポンスとして返却されるJSON構造をRust構造体として提供する。
//!
//! ## 命名規則
//! - アップロード結果・エラー詳細: camelCase
//! - ストア由来のペイロード（一覧・オブジェクト・削除結果）: PascalCase（S3 APIの形に合わせる）

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 共通エンベロープ
// ---------------------------------------------------------------------------

/// 成功レスポンスのエンベロープ `{"result": ...}`。
/// 一覧・取得・削除エンドポイントで共通。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope<T> {
    pub result: T,
}

/// アップロード成功レスポンス `{"message": "Uploaded", "fileData": ...}`。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse<T> {
    pub message: String,
    pub file_data: T,
}

/// エラーレスポンス。
/// `error` はストア層のエラー時のみ付与される。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<StoreErrorDetail>,
}

/// ストアから返されたエラーの詳細。加工せずに呼び出し元へ転送する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreErrorDetail {
    /// ストアのエラーコード（例: "NoSuchKey", "AccessDenied"）
    pub code: String,
    pub message: String,
    /// ストアが返したHTTPステータス。通信失敗時はNone
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

// ---------------------------------------------------------------------------
// アップロード
// ---------------------------------------------------------------------------

/// オブジェクトのアクセス制御設定。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObjectAcl {
    Private,
    PublicRead,
}

impl ObjectAcl {
    /// `x-amz-acl` ヘッダーに設定する値
    pub fn as_header_value(&self) -> &'static str {
        match self {
            ObjectAcl::Private => "private",
            ObjectAcl::PublicRead => "public-read",
        }
    }
}

/// アップロード済みファイル1件分のメタデータ。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// multipartのフィールド名（常に "file"）
    pub fieldname: String,
    /// クライアントが送信した元のファイル名
    pub originalname: String,
    /// Content-Transfer-Encoding（未指定時は "7bit"）
    pub encoding: String,
    /// multipartパートのMIMEタイプ
    pub mimetype: String,
    pub size: u64,
    pub bucket: String,
    /// サーバー側で生成したオブジェクトキー
    pub key: String,
    pub acl: ObjectAcl,
    /// ストアに保存したContent-Type
    pub content_type: String,
    /// 公開URL
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

// ---------------------------------------------------------------------------
// 一覧・取得・削除
// ---------------------------------------------------------------------------

/// `GET /files` のレスポンス本体。ストアの1ページ分の一覧。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectListing {
    pub name: String,
    pub prefix: String,
    /// ストアが一覧を打ち切った場合true。続きのページは取得しない
    pub is_truncated: bool,
    pub key_count: usize,
    pub contents: Vec<ObjectEntry>,
}

/// 一覧の1エントリ。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ObjectEntry {
    pub key: String,
    pub last_modified: String,
    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    pub size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

/// `GET /files/read/...` のレスポンス本体。
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StoredObject {
    pub content_length: u64,
    pub content_type: String,
    #[serde(rename = "ETag", skip_serializing_if = "Option::is_none")]
    pub e_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    /// Base64（Standard）エンコードされたオブジェクト本体
    pub body: String,
}

/// ストアの削除結果。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DeleteOutput {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_marker: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
}

/// `DELETE /files/delete/...` の `result` 部分。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResult {
    pub message: String,
    pub data: DeleteOutput,
}

// ---------------------------------------------------------------------------
// サービス情報 (GET /)
// ---------------------------------------------------------------------------

/// `GET /` のレスポンス。利用可能なエンドポイントとパラメータの説明。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDescription {
    pub message: String,
    pub url: UploadUrls,
    pub params: UploadParams,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadUrls {
    pub single: String,
    pub multiple: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadParams {
    pub file: String,
    pub folder_name: String,
    pub format: String,
}
