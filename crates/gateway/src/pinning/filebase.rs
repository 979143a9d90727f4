//! # Filebase IPFSピン留め実装
//!
//! `POST https://api.filebase.io/v1/ipfs/pins` にJSONファイルをマルチパートで送信する。

use std::time::{SystemTime, UNIX_EPOCH};

use super::Pinner;
use crate::error::GatewayError;

/// FilebaseのピンAPIエンドポイント
pub const FILEBASE_PINS_ENDPOINT: &str = "https://api.filebase.io/v1/ipfs/pins";

/// Filebaseによるピン留め実装。
pub struct FilebasePinner {
    http_client: reqwest::Client,
    endpoint: String,
    api_token: String,
    bucket: String,
}

impl FilebasePinner {
    pub fn new(http_client: reqwest::Client, api_token: String, bucket: String) -> Self {
        Self {
            http_client,
            endpoint: FILEBASE_PINS_ENDPOINT.to_string(),
            api_token,
            bucket,
        }
    }

    /// エンドポイントを差し替える（テスト・互換サービス用）。
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// 環境変数から構築する。`FILEBASE_API_TOKEN` が未設定ならNone。
    pub fn from_env(http_client: reqwest::Client) -> Option<Self> {
        let api_token = std::env::var("FILEBASE_API_TOKEN").ok()?;
        let bucket =
            std::env::var("FILEBASE_BUCKET").unwrap_or_else(|_| "prescriptions".to_string());
        Some(Self::new(http_client, api_token, bucket))
    }
}

/// 失敗応答の本文からエラーメッセージを取り出す。
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.pointer("/error/message")
                .or_else(|| json.get("message"))
                .and_then(|v| v.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// 成功応答からCIDを取り出す（`pin.cid` → `cid` → `IpfsHash` の順）。
fn extract_cid(json: &serde_json::Value) -> Option<String> {
    json.pointer("/pin/cid")
        .or_else(|| json.get("cid"))
        .or_else(|| json.get("IpfsHash"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

#[async_trait::async_trait]
impl Pinner for FilebasePinner {
    async fn pin_json(&self, data: &serde_json::Value) -> Result<String, GatewayError> {
        let json_bytes = serde_json::to_vec_pretty(data)
            .map_err(|e| GatewayError::Internal(format!("JSONのシリアライズに失敗: {e}")))?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| GatewayError::Internal(format!("時刻取得失敗: {e}")))?
            .as_millis();
        let filename = format!("prescription-{millis}.json");

        let part = reqwest::multipart::Part::bytes(json_bytes)
            .file_name(filename.clone())
            .mime_str("application/json")
            .map_err(|e| GatewayError::Internal(format!("マルチパートの構築に失敗: {e}")))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        tracing::info!(filename = %filename, bucket = %self.bucket, "Filebaseにピン留め");

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| GatewayError::Pinning(format!("Filebaseへの送信に失敗: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = if body.is_empty() {
                format!("HTTP {status}")
            } else {
                error_message(&body)
            };
            return Err(GatewayError::Pinning(message));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Pinning(format!("レスポンスのパースに失敗: {e}")))?;
        extract_cid(&json)
            .ok_or_else(|| GatewayError::Pinning("レスポンスにCIDがありません".to_string()))
    }
}
