//! # Upload Gateway
//!
//! S3互換オブジェクトストレージのバケットに対する
//! アップロード・一覧・取得・削除をHTTP経由で中継するマイクロサービス。
//!
//! ## API エンドポイント
//! - `GET /`: サービス情報
//! - `POST /files/upload/multiple?folderName=`: 複数ファイルのアップロード
//! - `POST /files/upload/single?folderName=`: 単一ファイルのアップロード
//! - `DELETE /files/delete/{folderPath}/{key}`: オブジェクトの削除
//! - `GET /files`: オブジェクト一覧（固定プレフィックス）
//! - `GET /files/read/{folderPath}/{key}`: オブジェクトの取得

mod app;
mod config;
mod endpoints;
mod error;
mod keys;
mod middleware;
mod multipart;
mod storage;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use config::{GatewayConfig, GatewayState, StorageBackend};
use storage::ObjectStore;

/// 設定に応じたストレージバックエンドを構築する。
fn build_store(config: &GatewayConfig) -> anyhow::Result<Box<dyn ObjectStore>> {
    match config.backend {
        #[cfg(feature = "vendor-aws")]
        StorageBackend::S3 => Ok(Box::new(storage::S3ObjectStore::from_config(config)?)),
        #[cfg(not(feature = "vendor-aws"))]
        StorageBackend::S3 => anyhow::bail!("S3バックエンドを使用するにはvendor-aws featureが必要です"),
        #[cfg(feature = "vendor-local")]
        StorageBackend::Memory => {
            tracing::warn!("メモリバックエンドで起動します（ローカル開発用、再起動で消去されます）");
            Ok(Box::new(storage::MemoryObjectStore::new(
                &config.bucket_name,
                &config.public_base_url,
            )))
        }
        #[cfg(not(feature = "vendor-local"))]
        StorageBackend::Memory => {
            anyhow::bail!("メモリバックエンドを使用するにはvendor-local featureが必要です")
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .envファイルがあれば読み込む（存在しなくてもよい）
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = GatewayConfig::from_env()?;
    let store = build_store(&config)?;

    tracing::info!(
        bucket = %config.bucket_name,
        region = %config.region,
        backend = ?config.backend,
        upload_limit = config.upload_limit,
        list_prefix = %config.list_prefix,
        "Gateway設定を読み込みました"
    );

    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(GatewayState { config, store });
    let app = app::build_router(state);

    tracing::info!("File Upload Micro-Serviceを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
