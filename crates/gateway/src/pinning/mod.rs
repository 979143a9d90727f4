//! # IPFSピン留め
//!
//! 処方データ（JSON）をIPFSにピン留めし、CIDを返す抽象インターフェース。
//! ミント経路では使用しない。Filebase実装は `filebase` サブモジュールを参照。

pub mod filebase;

pub use filebase::FilebasePinner;

use crate::error::GatewayError;

/// IPFSピン留めの抽象インターフェース。
#[async_trait::async_trait]
pub trait Pinner: Send + Sync {
    /// JSONをピン留めし、CIDを返す。
    async fn pin_json(&self, data: &serde_json::Value) -> Result<String, GatewayError>;
}
