//! # Gateway結合テスト
//!
//! 実際のルーターを `127.0.0.1:0` で起動し、reqwestでHTTP経由の振る舞いを確認する。
//! ストアにはMemoryObjectStore、エラー経路にはFailingStoreを使用する。

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::multipart::{Form, Part};
use serde_json::Value;
use upload_gateway_types::{DeleteOutput, ObjectAcl, ObjectListing, StoredObject};

use crate::app::build_router;
use crate::config::{GatewayConfig, GatewayState};
use crate::error::{StorageError, StorageResult};
use crate::storage::{MemoryObjectStore, ObjectStore, PutObjectOutput};

/// 全操作がAccessDeniedで失敗するモックストア。
struct FailingStore;

fn access_denied() -> StorageError {
    StorageError::Service {
        code: "AccessDenied".to_string(),
        message: "Access Denied".to_string(),
        status_code: 403,
    }
}

#[async_trait::async_trait]
impl ObjectStore for FailingStore {
    fn bucket_name(&self) -> &str {
        "test-bucket"
    }

    async fn ensure_bucket(&self) -> StorageResult<()> {
        Err(access_denied())
    }

    async fn put_object(
        &self,
        _key: &str,
        _data: Vec<u8>,
        _content_type: &str,
        _acl: ObjectAcl,
    ) -> StorageResult<PutObjectOutput> {
        Err(access_denied())
    }

    async fn get_object(&self, _key: &str) -> StorageResult<StoredObject> {
        Err(access_denied())
    }

    async fn delete_object(&self, _key: &str) -> StorageResult<DeleteOutput> {
        Err(access_denied())
    }

    async fn list_objects(&self, _prefix: &str) -> StorageResult<ObjectListing> {
        Err(StorageError::Transport("connection refused".to_string()))
    }
}

/// テスト用の設定を構築するヘルパー
fn test_config(extra: &[(&str, &str)]) -> GatewayConfig {
    let mut vars: HashMap<String, String> = HashMap::from([
        ("AWS_S3_BUCKET_NAME".to_string(), "test-bucket".to_string()),
        ("PUBLIC_BASE_URL".to_string(), "http://gateway.test".to_string()),
    ]);
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    GatewayConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
}

fn memory_state(extra: &[(&str, &str)]) -> Arc<GatewayState> {
    let config = test_config(extra);
    let store = MemoryObjectStore::new(&config.bucket_name, "http://localhost:9000");
    Arc::new(GatewayState {
        config,
        store: Box::new(store),
    })
}

/// Gatewayを起動し、ベースURLを返す。
async fn spawn_gateway(state: Arc<GatewayState>) -> String {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

fn file_part(name: &str, content: &str) -> Part {
    Part::bytes(content.as_bytes().to_vec())
        .file_name(name.to_string())
        .mime_str("text/plain")
        .unwrap()
}

async fn upload(base: &str, path: &str, form: Form) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("{base}{path}"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    let status = response.status().as_u16();
    (status, response.json().await.unwrap())
}

/// `{digits}-{filename}` 形式であることを確認する
fn assert_generated_key(key: &str, folder: Option<&str>, filename: &str) {
    let rest = match folder {
        Some(folder) => key
            .strip_prefix(&format!("{folder}/"))
            .unwrap_or_else(|| panic!("フォルダプレフィックスがありません: {key}")),
        None => key,
    };
    let (millis, name) = rest
        .split_once('-')
        .unwrap_or_else(|| panic!("タイムスタンプ区切りがありません: {key}"));
    assert!(!millis.is_empty() && millis.chars().all(|c| c.is_ascii_digit()), "{key}");
    assert_eq!(name, filename);
}

/// GET / がサービス情報を返し、ミドルウェアのヘッダーが付与されることを確認
#[tokio::test]
async fn test_describe_service() {
    let base = spawn_gateway(memory_state(&[])).await;

    let response = reqwest::Client::new()
        .get(format!("{base}/"))
        .header("Origin", "http://example.com")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    assert_eq!(headers["access-control-allow-origin"], "*");

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "AWS S3 file upload running successfully");
    assert_eq!(body["url"]["single"], "http://gateway.test/files/upload/single");
    assert_eq!(body["url"]["multiple"], "http://gateway.test/files/upload/multiple");
    assert_eq!(
        body["params"]["format"],
        "http://gateway.test/files/upload/single?folderName=my_files"
    );
}

/// フォルダ指定なしの単一アップロードで `{digits}-hello.txt` が生成されることを確認
#[tokio::test]
async fn test_upload_single_without_folder() {
    let base = spawn_gateway(memory_state(&[])).await;

    let form = Form::new().part("file", file_part("hello.txt", "hi"));
    let (status, body) = upload(&base, "/files/upload/single", form).await;

    assert_eq!(status, 200, "{body}");
    assert_eq!(body["message"], "Uploaded");
    let file = &body["fileData"];
    assert_generated_key(file["key"].as_str().unwrap(), None, "hello.txt");
    assert_eq!(file["fieldname"], "file");
    assert_eq!(file["originalname"], "hello.txt");
    assert_eq!(file["mimetype"], "text/plain");
    assert_eq!(file["size"], 2);
    assert_eq!(file["bucket"], "test-bucket");
    assert_eq!(file["acl"], "public-read");
}

/// folderName指定時は `X/{digits}-{filename}` になり、重複指定は最後の値が使われることを確認
#[tokio::test]
async fn test_upload_single_with_folder() {
    let base = spawn_gateway(memory_state(&[])).await;

    let form = Form::new().part("file", file_part("hello.txt", "hi"));
    let (status, body) = upload(&base, "/files/upload/single?folderName=my_files", form).await;
    assert_eq!(status, 200, "{body}");
    assert_generated_key(body["fileData"]["key"].as_str().unwrap(), Some("my_files"), "hello.txt");

    let form = Form::new().part("file", file_part("hello.txt", "hi"));
    let (status, body) = upload(
        &base,
        "/files/upload/single?folderName=first&folderName=second",
        form,
    )
    .await;
    assert_eq!(status, 200, "{body}");
    assert_generated_key(body["fileData"]["key"].as_str().unwrap(), Some("second"), "hello.txt");
}

/// 単一アップロードの入力エラーが400になることを確認
#[tokio::test]
async fn test_upload_single_rejects_invalid_forms() {
    let state = memory_state(&[("LIST_PREFIX", "")]);
    let base = spawn_gateway(state.clone()).await;

    // ファイルなし
    let form = Form::new().text("note", "no file here");
    let (status, body) = upload(&base, "/files/upload/single", form).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "No file provided");

    // ファイル2件
    let form = Form::new()
        .part("file", file_part("a.txt", "a"))
        .part("file", file_part("b.txt", "b"));
    let (status, _) = upload(&base, "/files/upload/single", form).await;
    assert_eq!(status, 400);

    // 想定外のフィールド名
    let form = Form::new().part("upload", file_part("a.txt", "a"));
    let (status, body) = upload(&base, "/files/upload/single", form).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Unexpected field: upload");

    let listing = state.store.list_objects("").await.unwrap();
    assert!(listing.contents.is_empty());
}

/// 既定上限12件ちょうどは受け付け、13件は書き込み前に拒否されることを確認
#[tokio::test]
async fn test_upload_multiple_limit() {
    let state = memory_state(&[]);
    assert_eq!(state.config.upload_limit, 12);
    let base = spawn_gateway(state.clone()).await;

    let mut form = Form::new();
    for i in 0..12 {
        form = form.part("file", file_part(&format!("file-{i}.txt"), "x"));
    }
    let (status, body) = upload(&base, "/files/upload/multiple?folderName=batch", form).await;
    assert_eq!(status, 200, "{body}");
    let files = body["fileData"].as_array().unwrap();
    assert_eq!(files.len(), 12);
    for (i, file) in files.iter().enumerate() {
        assert_generated_key(
            file["key"].as_str().unwrap(),
            Some("batch"),
            &format!("file-{i}.txt"),
        );
    }

    let state = memory_state(&[]);
    let base = spawn_gateway(state.clone()).await;

    let mut form = Form::new();
    for i in 0..13 {
        form = form.part("file", file_part(&format!("file-{i}.txt"), "x"));
    }
    let (status, body) = upload(&base, "/files/upload/multiple", form).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Too many files: at most 12 allowed");

    let listing = state.store.list_objects("").await.unwrap();
    assert!(listing.contents.is_empty(), "上限超過時に書き込みが発生した");
}

/// 上限は設定で変更できることを確認
#[tokio::test]
async fn test_upload_multiple_configured_limit() {
    let base = spawn_gateway(memory_state(&[("MULTIPLE_FILE_UPLOAD_LIMIT", "2")])).await;

    let form = Form::new()
        .part("file", file_part("a.txt", "a"))
        .part("file", file_part("b.txt", "b"))
        .part("file", file_part("c.txt", "c"));
    let (status, _) = upload(&base, "/files/upload/multiple", form).await;
    assert_eq!(status, 400);

    let form = Form::new().text("note", "no files");
    let (status, body) = upload(&base, "/files/upload/multiple", form).await;
    assert_eq!(status, 200);
    assert_eq!(body["fileData"], serde_json::json!([]));
}

/// アップロードしたオブジェクトが同じフォルダ/キーで取得でき、メタデータが一致することを確認
#[tokio::test]
async fn test_upload_then_read_roundtrip() {
    let base = spawn_gateway(memory_state(&[])).await;

    let form = Form::new().part("file", file_part("hello.txt", "hi"));
    let (status, body) = upload(&base, "/files/upload/single?folderName=docs", form).await;
    assert_eq!(status, 200, "{body}");
    let uploaded = &body["fileData"];
    let key = uploaded["key"].as_str().unwrap();
    let rest = key.strip_prefix("docs/").unwrap();

    let response = reqwest::get(format!("{base}/files/read/docs/{rest}"))
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let object = &body["result"];

    assert_eq!(object["ContentLength"], 2);
    assert_eq!(object["ContentType"], "text/plain");
    assert_eq!(object["ETag"], uploaded["etag"]);
    // "hi" のBase64
    assert_eq!(object["Body"], "aGk=");
}

/// 存在しないオブジェクトの取得は500になることを確認
#[tokio::test]
async fn test_read_missing_object() {
    let base = spawn_gateway(memory_state(&[])).await;

    let response = reqwest::get(format!("{base}/files/read/docs/missing.txt"))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "an error occurred");
    assert_eq!(body["error"]["code"], "NoSuchKey");
}

/// 同じフォルダ/キーの削除を2回行っても同じ結果になることを確認
#[tokio::test]
async fn test_delete_is_idempotent() {
    let base = spawn_gateway(memory_state(&[])).await;
    let client = reqwest::Client::new();

    let mut bodies = Vec::new();
    for _ in 0..2 {
        let response = client
            .delete(format!("{base}/files/delete/myfolder/123-hello.txt"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        bodies.push(response.json::<Value>().await.unwrap());
    }

    assert_eq!(bodies[0], bodies[1]);
    assert_eq!(
        bodies[0]["result"]["message"],
        "Successfully deleted file from bucket"
    );
}

/// 削除後は取得できなくなることを確認
#[tokio::test]
async fn test_delete_removes_uploaded_object() {
    let base = spawn_gateway(memory_state(&[])).await;
    let client = reqwest::Client::new();

    let form = Form::new().part("file", file_part("hello.txt", "hi"));
    let (_, body) = upload(&base, "/files/upload/single?folderName=myfolder", form).await;
    let key = body["fileData"]["key"].as_str().unwrap().to_string();
    let rest = key.strip_prefix("myfolder/").unwrap();

    let response = client
        .delete(format!("{base}/files/delete/myfolder/{rest}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let response = client
        .get(format!("{base}/files/read/myfolder/{rest}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
}

/// 一覧は設定されたプレフィックス配下のみを返すことを確認
#[tokio::test]
async fn test_list_restricted_to_prefix() {
    let base = spawn_gateway(memory_state(&[])).await;

    // 何もない状態では空の一覧
    let body: Value = reqwest::get(format!("{base}/files"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"]["Contents"], serde_json::json!([]));
    assert_eq!(body["result"]["Prefix"], "Centric");

    for folder in ["Centric", "Other"] {
        let form = Form::new().part("file", file_part("hello.txt", "hi"));
        let (status, _) =
            upload(&base, &format!("/files/upload/single?folderName={folder}"), form).await;
        assert_eq!(status, 200);
    }

    let response = reqwest::get(format!("{base}/files")).await.unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    let contents = body["result"]["Contents"].as_array().unwrap();
    assert_eq!(contents.len(), 1);
    assert!(contents[0]["Key"].as_str().unwrap().starts_with("Centric/"));
    assert_eq!(body["result"]["Name"], "test-bucket");
}

/// 同一バッチ内の同名ファイルは同じキーに書き込まれる
#[tokio::test]
async fn test_upload_multiple_same_name_shares_key() {
    let base = spawn_gateway(memory_state(&[])).await;

    let form = Form::new()
        .part("file", file_part("dup.txt", "first"))
        .part("file", file_part("dup.txt", "second"));
    let (status, body) = upload(&base, "/files/upload/multiple?folderName=Centric", form).await;
    assert_eq!(status, 200);

    let files = body["fileData"].as_array().unwrap();
    assert_eq!(files.len(), 2);
    assert_eq!(files[0]["key"], files[1]["key"]);

    let body: Value = reqwest::get(format!("{base}/files"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["result"]["Contents"].as_array().unwrap().len(), 1);
}

/// ストア層のエラーがアップロードは400、その他は500で転送されることを確認
#[tokio::test]
async fn test_store_failures_are_forwarded() {
    let state = Arc::new(GatewayState {
        config: test_config(&[]),
        store: Box::new(FailingStore),
    });
    let base = spawn_gateway(state).await;
    let client = reqwest::Client::new();

    let form = Form::new().part("file", file_part("hello.txt", "hi"));
    let (status, body) = upload(&base, "/files/upload/single", form).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Error uploading");
    assert_eq!(body["error"]["code"], "AccessDenied");
    assert_eq!(body["error"]["statusCode"], 403);

    let form = Form::new()
        .part("file", file_part("a.txt", "a"))
        .part("file", file_part("b.txt", "b"));
    let (status, body) = upload(&base, "/files/upload/multiple", form).await;
    assert_eq!(status, 400);
    assert_eq!(body["message"], "Error uploading");

    let response = client.get(format!("{base}/files")).send().await.unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "an error occurred");
    assert_eq!(body["error"]["code"], "NetworkingError");

    // ensure_bucketの失敗は無視され、削除・取得自体のエラーが返る
    let response = client
        .delete(format!("{base}/files/delete/a/b.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "An error occurred");
    assert_eq!(body["error"]["code"], "AccessDenied");

    let response = client
        .get(format!("{base}/files/read/a/b.txt"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["message"], "an error occurred");
}
