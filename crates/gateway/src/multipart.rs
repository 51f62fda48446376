//! # multipartフォームの読み取り
//!
//! アップロードエンドポイントで共通の、`file` フィールドの抽出処理。

use axum::extract::Multipart;

use crate::error::GatewayError;

/// ファイルを受け付けるフィールド名
pub const FILE_FIELD: &str = "file";

/// 読み取ったファイルパート1件。
#[derive(Debug, Clone)]
pub struct FilePart {
    pub fieldname: String,
    pub originalname: String,
    pub encoding: String,
    pub mimetype: String,
    pub data: Vec<u8>,
}

/// multipartボディから `file` フィールドのファイルパートを全て読み取る。
///
/// - ファイル名を持たないテキストフィールドは無視する
/// - `file` 以外の名前のファイルパートはエラー
/// - ファイル数が `max_files` を超えた時点でエラー（ストアへの書き込み前に拒否する）
pub async fn read_file_parts(
    mut multipart: Multipart,
    max_files: usize,
) -> Result<Vec<FilePart>, GatewayError> {
    let mut parts = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let Some(originalname) = field.file_name().map(str::to_string) else {
            continue;
        };

        let fieldname = field.name().unwrap_or_default().to_string();
        if fieldname != FILE_FIELD {
            return Err(GatewayError::BadRequest(format!(
                "Unexpected field: {fieldname}"
            )));
        }

        if parts.len() == max_files {
            return Err(GatewayError::BadRequest(format!(
                "Too many files: at most {max_files} allowed"
            )));
        }

        let encoding = field
            .headers()
            .get("content-transfer-encoding")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("7bit")
            .to_string();
        let mimetype = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();

        let data = field
            .bytes()
            .await
            .map_err(|e| GatewayError::BadRequest(format!("Failed to read file data: {e}")))?;

        parts.push(FilePart {
            fieldname,
            originalname,
            encoding,
            mimetype,
            data: data.to_vec(),
        });
    }

    Ok(parts)
}
