//! # S3互換 Object Store 実装
//!
//! AWS S3, MinIO, Cloudflare R2 等のS3互換APIを使用する実装。

use std::time::Instant;

use base64::Engine;
use upload_gateway_types::{DeleteOutput, ObjectAcl, ObjectEntry, ObjectListing, StoredObject};

use super::{object_url, ObjectStore, PutObjectOutput};
use crate::config::GatewayConfig;
use crate::error::{StorageError, StorageResult};

/// S3互換ストレージによるObject Store実装。
pub struct S3ObjectStore {
    bucket: s3::Bucket,
    bucket_name: String,
    region: s3::Region,
    region_name: String,
    credentials: s3::creds::Credentials,
    /// カスタムエンドポイント（パススタイル時のみ）
    endpoint: Option<String>,
}

impl S3ObjectStore {
    /// 設定からS3互換バケットを初期化する。
    pub fn from_config(config: &GatewayConfig) -> anyhow::Result<Self> {
        let credentials = match &config.credentials {
            Some(creds) => s3::creds::Credentials::new(
                Some(creds.access_key_id.as_str()),
                Some(creds.secret_access_key.as_str()),
                None,
                None,
                None,
            )?,
            None => {
                tracing::info!("静的な認証情報が未設定です。既定の認証情報チェーンを使用します");
                s3::creds::Credentials::default()?
            }
        };

        let region = s3::Region::Custom {
            region: config.region.clone(),
            endpoint: config
                .endpoint
                .clone()
                .unwrap_or_else(|| format!("https://s3.{}.amazonaws.com", config.region)),
        };

        let bucket = s3::Bucket::new(&config.bucket_name, region.clone(), credentials.clone())?;
        let bucket = match &config.endpoint {
            Some(endpoint) => {
                tracing::info!(s3_endpoint = %endpoint, "S3互換エンドポイントを設定");
                bucket.with_path_style()
            }
            None => bucket,
        };

        Ok(Self {
            bucket: *bucket,
            bucket_name: config.bucket_name.clone(),
            region,
            region_name: config.region.clone(),
            credentials,
            endpoint: config.endpoint.clone(),
        })
    }

    fn location(&self, key: &str) -> String {
        object_url(
            self.endpoint.as_deref(),
            &self.bucket_name,
            &self.region_name,
            key,
        )
    }
}

/// 非2xxのレスポンスからStorageErrorを組み立てる。
/// XMLエラーの `<Code>`/`<Message>` を優先し、無ければ `HTTP{status}` と本文を使う。
fn service_error(status_code: u16, body: &str) -> StorageError {
    StorageError::Service {
        code: xml_tag(body, "Code").unwrap_or_else(|| format!("HTTP{status_code}")),
        message: xml_tag(body, "Message").unwrap_or_else(|| body.trim().to_string()),
        status_code,
    }
}

/// S3のXMLエラーレスポンスから単純なタグの値を取り出す。
fn xml_tag(body: &str, tag: &str) -> Option<String> {
    let open = format!("<{tag}>");
    let close = format!("</{tag}>");
    let start = body.find(&open)? + open.len();
    let end = body[start..].find(&close)? + start;
    Some(body[start..end].to_string())
}

/// rust-s3のエラーをStorageErrorに変換する。
/// `fail-on-err` により非2xxは本文付きの `HttpFailWithBody` として届く。
fn store_error(e: s3::error::S3Error) -> StorageError {
    match e {
        s3::error::S3Error::HttpFailWithBody(status_code, body) => {
            service_error(status_code, &body)
        }
        other => StorageError::Transport(other.to_string()),
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn ensure_bucket(&self) -> StorageResult<()> {
        if self.bucket.exists().await.map_err(store_error)? {
            return Ok(());
        }

        let config = s3::BucketConfiguration::default();
        let response = if self.endpoint.is_some() {
            s3::Bucket::create_with_path_style(
                &self.bucket_name,
                self.region.clone(),
                self.credentials.clone(),
                config,
            )
            .await
        } else {
            s3::Bucket::create(
                &self.bucket_name,
                self.region.clone(),
                self.credentials.clone(),
                config,
            )
            .await
        }
        .map_err(store_error)?;

        if !response.success() {
            return Err(service_error(response.response_code, &response.response_text));
        }

        tracing::info!(bucket = %self.bucket_name, "バケットを作成しました");
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> StorageResult<PutObjectOutput> {
        let start = Instant::now();
        let size = data.len();

        let mut bucket = self.bucket.clone();
        bucket.add_header("x-amz-acl", acl.as_header_value());

        let result = bucket
            .put_object_with_content_type(key, &data, content_type)
            .await
            .map_err(store_error);

        let response = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket_name,
                key = %key,
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3アップロードに失敗"
            );
            e
        })?;

        tracing::info!(
            bucket = %self.bucket_name,
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3アップロード完了"
        );

        let headers = response.headers();
        Ok(PutObjectOutput {
            location: self.location(key),
            etag: headers.get("etag").cloned(),
            version_id: headers.get("x-amz-version-id").cloned(),
        })
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let start = Instant::now();

        let result = self
            .bucket
            .get_object(key)
            .await
            .map_err(store_error);

        let response = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket_name,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3ダウンロードに失敗"
            );
            e
        })?;

        let body = response.bytes();
        tracing::info!(
            bucket = %self.bucket_name,
            key = %key,
            size_bytes = body.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3ダウンロード完了"
        );

        let headers = response.headers();
        Ok(StoredObject {
            content_length: body.len() as u64,
            content_type: headers
                .get("content-type")
                .cloned()
                .unwrap_or_else(|| "application/octet-stream".to_string()),
            e_tag: headers.get("etag").cloned(),
            last_modified: headers.get("last-modified").cloned(),
            body: base64::engine::general_purpose::STANDARD.encode(body),
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<DeleteOutput> {
        let start = Instant::now();

        let result = self
            .bucket
            .delete_object(key)
            .await
            .map_err(store_error);

        let response = result.map_err(|e| {
            tracing::error!(
                error = %e,
                bucket = %self.bucket_name,
                key = %key,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "S3削除に失敗"
            );
            e
        })?;

        tracing::info!(
            bucket = %self.bucket_name,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3削除完了"
        );

        let headers = response.headers();
        Ok(DeleteOutput {
            delete_marker: headers.get("x-amz-delete-marker").map(|v| v == "true"),
            version_id: headers.get("x-amz-version-id").cloned(),
        })
    }

    async fn list_objects(&self, prefix: &str) -> StorageResult<ObjectListing> {
        let start = Instant::now();

        // 1ページのみ取得する（続きのページは辿らない）
        let (page, _) = self
            .bucket
            .list_page(prefix.to_string(), None, None, None, None)
            .await
            .map_err(|e| {
                let e = store_error(e);
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket_name,
                    prefix = %prefix,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3一覧取得に失敗"
                );
                e
            })?;

        let contents: Vec<ObjectEntry> = page
            .contents
            .into_iter()
            .map(|object| ObjectEntry {
                key: object.key,
                last_modified: object.last_modified,
                e_tag: object.e_tag,
                size: object.size,
                storage_class: object.storage_class,
            })
            .collect();

        tracing::info!(
            bucket = %self.bucket_name,
            prefix = %prefix,
            key_count = contents.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3一覧取得完了"
        );

        Ok(ObjectListing {
            name: self.bucket_name.clone(),
            prefix: prefix.to_string(),
            is_truncated: page.is_truncated,
            key_count: contents.len(),
            contents,
        })
    }
}
