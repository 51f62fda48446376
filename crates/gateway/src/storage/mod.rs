//! # Object Store
//!
//! バケット + キーの名前空間に対する操作の抽象インターフェース。
//! S3互換ストレージ実装は `s3`、プロセス内実装は `memory` サブモジュールを参照。

#[cfg(feature = "vendor-aws")]
pub mod s3;

#[cfg(any(test, feature = "vendor-local"))]
pub mod memory;

#[cfg(feature = "vendor-aws")]
pub use s3::S3ObjectStore;

#[cfg(any(test, feature = "vendor-local"))]
pub use memory::MemoryObjectStore;

use upload_gateway_types::{DeleteOutput, ObjectAcl, ObjectListing, StoredObject};

use crate::error::StorageResult;

/// オブジェクト書き込みの結果。
#[derive(Debug, Clone)]
pub struct PutObjectOutput {
    /// オブジェクトの公開URL
    pub location: String,
    pub etag: Option<String>,
    pub version_id: Option<String>,
}

/// オブジェクトストアの抽象インターフェース。
///
/// 各操作は単体でアトミックであることを前提とし、
/// Gateway側ではトランザクション・リトライ・キャッシュを行わない。
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// 設定されたバケット名
    fn bucket_name(&self) -> &str;

    /// バケットが存在しなければ作成する。既に存在する場合は何もしない。
    async fn ensure_bucket(&self) -> StorageResult<()>;

    /// オブジェクトを書き込む。
    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> StorageResult<PutObjectOutput>;

    /// オブジェクトの本体とメタデータを取得する。
    async fn get_object(&self, key: &str) -> StorageResult<StoredObject>;

    /// オブジェクトを削除する。存在しないキーの扱いはストアに従う。
    async fn delete_object(&self, key: &str) -> StorageResult<DeleteOutput>;

    /// プレフィックスに一致するオブジェクトを1ページ分取得する。
    async fn list_objects(&self, prefix: &str) -> StorageResult<ObjectListing>;
}

/// 公開URLを構築する。キーはパスセグメントごとにURLエンコードする。
///
/// - エンドポイント指定時（パススタイル）: `{endpoint}/{bucket}/{key}`
/// - AWS S3: `https://{bucket}.s3.{region}.amazonaws.com/{key}`
pub(crate) fn object_url(endpoint: Option<&str>, bucket: &str, region: &str, key: &str) -> String {
    let encoded_key = key
        .split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/");

    match endpoint {
        Some(endpoint) => format!(
            "{}/{}/{}",
            endpoint.trim_end_matches('/'),
            bucket,
            encoded_key
        ),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com/{encoded_key}"),
    }
}
