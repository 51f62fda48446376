//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。
//! 設定は起動時に一度だけ構築し、以降は読み取り専用。

use anyhow::Context;

use crate::storage::ObjectStore;

/// 複数ファイルアップロードの既定上限
pub const DEFAULT_UPLOAD_LIMIT: usize = 12;
/// 待ち受けポートの既定値
pub const DEFAULT_PORT: u16 = 8080;
/// 一覧取得時の既定プレフィックス
pub const DEFAULT_LIST_PREFIX: &str = "Centric";
/// リクエストボディの既定上限（100MiB）
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// ストレージバックエンドの種別。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// S3互換ストレージ（AWS S3, MinIO, Cloudflare R2等）
    S3,
    /// プロセス内メモリ（ローカル開発用）
    Memory,
}

/// ストアの認証情報。
/// 未設定の場合はクライアントの既定の認証情報チェーンを使用する。
#[derive(Clone)]
pub struct StoreCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

/// Gateway設定。
#[derive(Clone)]
pub struct GatewayConfig {
    pub credentials: Option<StoreCredentials>,
    pub region: String,
    pub bucket_name: String,
    /// S3互換エンドポイント。設定時はパススタイルでアクセスする
    pub endpoint: Option<String>,
    pub port: u16,
    /// `/files/upload/multiple` で受け付ける最大ファイル数
    pub upload_limit: usize,
    /// `GET /files` が適用するプレフィックス
    pub list_prefix: String,
    /// リクエストボディの最大サイズ（バイト）
    pub max_upload_bytes: usize,
    /// `GET /` で案内するベースURL
    pub public_base_url: String,
    pub backend: StorageBackend,
}

impl GatewayConfig {
    /// 環境変数から構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意のルックアップ関数から構築する。
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_key_id = var("AWS_ACCESS_KEY_ID").or_else(|| var("aws_access_key_id"));
        let secret_access_key =
            var("AWS_SECRET_ACCESS_KEY").or_else(|| var("aws_secret_access_key"));
        let credentials = match (access_key_id, secret_access_key) {
            (Some(access_key_id), Some(secret_access_key)) => Some(StoreCredentials {
                access_key_id,
                secret_access_key,
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "AWS_ACCESS_KEY_IDとAWS_SECRET_ACCESS_KEYは両方設定する必要があります"
            ),
        };

        let backend = match var("STORAGE_BACKEND").as_deref() {
            None | Some("s3") => StorageBackend::S3,
            Some("memory") => StorageBackend::Memory,
            Some(other) => anyhow::bail!("不明なSTORAGE_BACKENDです: {other}"),
        };

        let bucket_name = match var("AWS_S3_BUCKET_NAME") {
            Some(name) => name,
            None if backend == StorageBackend::Memory => "local".to_string(),
            None => anyhow::bail!("AWS_S3_BUCKET_NAMEが設定されていません"),
        };

        let port = parse_or(var("PORT"), "PORT", DEFAULT_PORT)?;
        let upload_limit = parse_or(
            var("MULTIPLE_FILE_UPLOAD_LIMIT"),
            "MULTIPLE_FILE_UPLOAD_LIMIT",
            DEFAULT_UPLOAD_LIMIT,
        )?;
        let max_upload_bytes = parse_or(
            var("MAX_UPLOAD_BYTES"),
            "MAX_UPLOAD_BYTES",
            DEFAULT_MAX_UPLOAD_BYTES,
        )?;

        let public_base_url = var("PUBLIC_BASE_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        Ok(Self {
            credentials,
            region: var("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            bucket_name,
            endpoint: var("S3_ENDPOINT"),
            port,
            upload_limit,
            // 空文字列は「プレフィックスなし」として有効な値
            list_prefix: lookup("LIST_PREFIX").unwrap_or_else(|| DEFAULT_LIST_PREFIX.to_string()),
            max_upload_bytes,
            public_base_url,
            backend,
        })
    }
}

fn parse_or<T>(value: Option<String>, name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .with_context(|| format!("{name}の値が不正です: {v}")),
        None => Ok(default),
    }
}

/// Gatewayの共有状態。
pub struct GatewayState {
    pub config: GatewayConfig,
    /// オブジェクトストア（S3互換等、トレイトで抽象化）
    pub store: Box<dyn ObjectStore>,
}
