//! # プロセス内 Object Store 実装
//!
//! S3への接続なしで動作するローカル開発・テスト用の実装。
//! 存在しないキーの削除は成功、取得は `NoSuchKey` とS3と同じ振る舞いをする。

use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::RwLock;
use upload_gateway_types::{DeleteOutput, ObjectAcl, ObjectEntry, ObjectListing, StoredObject};

use super::{object_url, ObjectStore, PutObjectOutput};
use crate::error::{StorageError, StorageResult};

/// 1ページで返す最大キー数（S3の既定値と同じ）
const MAX_KEYS: usize = 1000;

#[derive(Debug, Clone)]
struct MemoryObject {
    data: Vec<u8>,
    content_type: String,
    etag: String,
    #[cfg(test)]
    acl: ObjectAcl,
    last_modified: DateTime<Utc>,
}

/// プロセス内メモリによるObject Store実装。
pub struct MemoryObjectStore {
    bucket_name: String,
    /// `location` に使用するベースURL
    base_url: String,
    objects: RwLock<BTreeMap<String, MemoryObject>>,
}

impl MemoryObjectStore {
    pub fn new(bucket_name: &str, base_url: &str) -> Self {
        Self {
            bucket_name: bucket_name.to_string(),
            base_url: base_url.to_string(),
            objects: RwLock::new(BTreeMap::new()),
        }
    }

    #[cfg(test)]
    async fn acl(&self, key: &str) -> Option<ObjectAcl> {
        self.objects.read().await.get(key).map(|o| o.acl)
    }
}

fn etag(data: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    format!("\"{:016x}\"", hasher.finish())
}

#[async_trait::async_trait]
impl ObjectStore for MemoryObjectStore {
    fn bucket_name(&self) -> &str {
        &self.bucket_name
    }

    async fn ensure_bucket(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        acl: ObjectAcl,
    ) -> StorageResult<PutObjectOutput> {
        let etag = etag(&data);
        let size = data.len();
        self.objects.write().await.insert(
            key.to_string(),
            MemoryObject {
                data,
                content_type: content_type.to_string(),
                etag: etag.clone(),
                #[cfg(test)]
                acl,
                last_modified: Utc::now(),
            },
        );

        tracing::debug!(
            bucket = %self.bucket_name,
            key = %key,
            size_bytes = size,
            acl = acl.as_header_value(),
            "メモリに保存"
        );

        Ok(PutObjectOutput {
            location: object_url(Some(self.base_url.as_str()), &self.bucket_name, "local", key),
            etag: Some(etag),
            version_id: None,
        })
    }

    async fn get_object(&self, key: &str) -> StorageResult<StoredObject> {
        let objects = self.objects.read().await;
        let object = objects.get(key).ok_or_else(|| StorageError::Service {
            code: "NoSuchKey".to_string(),
            message: "The specified key does not exist.".to_string(),
            status_code: 404,
        })?;

        Ok(StoredObject {
            content_length: object.data.len() as u64,
            content_type: object.content_type.clone(),
            e_tag: Some(object.etag.clone()),
            last_modified: Some(
                object
                    .last_modified
                    .format("%a, %d %b %Y %H:%M:%S GMT")
                    .to_string(),
            ),
            body: base64::engine::general_purpose::STANDARD.encode(&object.data),
        })
    }

    async fn delete_object(&self, key: &str) -> StorageResult<DeleteOutput> {
        self.objects.write().await.remove(key);
        Ok(DeleteOutput::default())
    }

    async fn list_objects(&self, prefix: &str) -> StorageResult<ObjectListing> {
        let objects = self.objects.read().await;
        let mut matching = objects
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix));

        let contents: Vec<ObjectEntry> = matching
            .by_ref()
            .take(MAX_KEYS)
            .map(|(key, object)| ObjectEntry {
                key: key.clone(),
                last_modified: object
                    .last_modified
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
                e_tag: Some(object.etag.clone()),
                size: object.data.len() as u64,
                storage_class: Some("STANDARD".to_string()),
            })
            .collect();

        Ok(ObjectListing {
            name: self.bucket_name.clone(),
            prefix: prefix.to_string(),
            is_truncated: matching.next().is_some(),
            key_count: contents.len(),
            contents,
        })
    }
}
