//! # JSON-RPCウォレット
//!
//! アカウントを管理するノード（またはウォレットブリッジ）にJSON-RPCで接続する。
//! ブラウザウォレットと同じメソッド・エラーコード（EIP-1193）を使う。

use std::sync::atomic::{AtomicU64, Ordering};

use alloy_primitives::{Address, Bytes, B256};
use rx_crypto::Signature;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{TransactionReceipt, TransactionRequest, Wallet};
use crate::error::{WalletError, RPC_METHOD_NOT_FOUND};

/// JSON-RPCのエラーオブジェクト
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPCの応答
#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

/// JSON-RPCウォレット。
pub struct RpcWallet {
    endpoint: String,
    http_client: reqwest::Client,
    next_id: AtomicU64,
}

impl RpcWallet {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(endpoint, reqwest::Client::new())
    }

    pub fn with_client(endpoint: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into(),
            http_client,
            next_id: AtomicU64::new(1),
        }
    }

    /// JSON-RPCリクエストを送信し、`result` を指定の型でデコードする。
    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, WalletError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let rpc_request = serde_json::json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&rpc_request)
            .send()
            .await
            .map_err(|e| WalletError::Transport(format!("{method}: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| WalletError::Transport(format!("{method}: {e}")))?;

        // エラー応答はHTTPステータスに関わらずJSON-RPCのerrorを優先する
        let parsed: RpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(WalletError::Transport(format!(
                    "{method}: HTTP {status}: {body}"
                )));
            }
            Err(e) => {
                return Err(WalletError::InvalidResponse(format!(
                    "{method}のレスポンスのパースに失敗: {e}"
                )));
            }
        };

        if let Some(error) = parsed.error {
            tracing::debug!(method, code = error.code, message = %error.message, "JSON-RPCエラー");
            return Err(WalletError::from_rpc(error.code, error.message));
        }

        let result = parsed.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result).map_err(|e| {
            WalletError::InvalidResponse(format!("{method}のresultが不正です: {e}"))
        })
    }
}

#[async_trait::async_trait]
impl Wallet for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        match self
            .request("eth_requestAccounts", serde_json::json!([]))
            .await
        {
            Err(WalletError::Rpc { code, .. }) if code == RPC_METHOD_NOT_FOUND => {
                // ノードはeth_requestAccountsを持たないことがある
                tracing::debug!("eth_requestAccounts非対応、eth_accountsで再試行");
                self.request("eth_accounts", serde_json::json!([])).await
            }
            other => other,
        }
    }

    async fn sign_message(
        &self,
        account: Address,
        message: &[u8],
    ) -> Result<Signature, WalletError> {
        let message_hex = format!("0x{}", hex::encode(message));
        let signature_hex: String = self
            .request("personal_sign", serde_json::json!([message_hex, account]))
            .await?;
        signature_hex
            .parse()
            .map_err(|e| WalletError::InvalidResponse(format!("署名が不正です: {e}")))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, WalletError> {
        self.request("eth_sendTransaction", serde_json::json!([tx]))
            .await
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, WalletError> {
        self.request("eth_getTransactionReceipt", serde_json::json!([tx_hash]))
            .await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        self.request(
            "eth_call",
            serde_json::json!([{ "to": to, "data": data }, "latest"]),
        )
        .await
    }
}
