//! # ウォレット抽象化
//!
//! アカウント選択・メッセージ署名・トランザクション送信を行うウォレットの能力を
//! トレイトとして抽象化する。署名・ミント処理にはこのトレイトを明示的に渡し、
//! グローバルなプロバイダオブジェクトには触れない。
//!
//! 現在のウォレット実装:
//! - `rpc`: JSON-RPC（アカウントを管理するノード・ウォレットブリッジ）
//! - `mock`: ローカル開発・テスト用（メモリ内の鍵と模擬コントラクト）

pub mod mock;
pub mod rpc;

pub use mock::{MockBehavior, MockWallet, WalletCall};
pub use rpc::RpcWallet;

use alloy_primitives::{Address, Bytes, B256, U64};
use rx_crypto::Signature;
use serde::{Deserialize, Serialize};

use crate::error::WalletError;

/// 状態を変更するトランザクションの送信内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// 送信元（署名者）アカウント
    pub from: Address,
    /// 宛先コントラクト
    pub to: Address,
    /// ABIエンコード済みのcalldata
    pub data: Bytes,
}

/// トランザクションレシートに含まれるログ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ログを発行したコントラクト
    pub address: Address,
    /// topics[0]はイベントシグネチャのハッシュ
    pub topics: Vec<B256>,
    /// indexedでない引数のABIエンコード
    #[serde(default)]
    pub data: Bytes,
}

/// 確定したトランザクションのレシート。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<U64>,
    /// 1: 成功, 0: revert。Byzantium以前のチェーンでは存在しない。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<U64>,
    /// 発行順のログ
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

impl TransactionReceipt {
    /// オンチェーン実行が成功したか。statusが無い場合は成功とみなす。
    pub fn succeeded(&self) -> bool {
        self.status.map_or(true, |status| !status.is_zero())
    }
}

/// ウォレットのトレイト。
///
/// `sign_message` はウォレット自身が `"\x19Ethereum Signed Message:\n" + len` を
/// 前置してハッシュし直してから署名する（個人メッセージ署名規約）。
/// 呼び出し側でプレフィックスを付けてはならない。
#[async_trait::async_trait]
pub trait Wallet: Send + Sync {
    /// 接続を要求し、承認済みアカウントの一覧を返す。先頭がアクティブアカウント。
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError>;

    /// 個人メッセージ署名規約でメッセージに署名する。
    async fn sign_message(&self, account: Address, message: &[u8])
        -> Result<Signature, WalletError>;

    /// トランザクションを署名・送信し、トランザクションハッシュを返す。
    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, WalletError>;

    /// レシートを取得する。未確定ならNone。
    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, WalletError>;

    /// 状態を変更しないコントラクト呼び出し。
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// JSON-RPCのレシート形式（余分なフィールドを含む）からデシリアライズできる
    #[test]
    fn test_receipt_from_json_rpc() {
        let json = serde_json::json!({
            "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
            "blockNumber": "0x10",
            "blockHash": "0x2222222222222222222222222222222222222222222222222222222222222222",
            "gasUsed": "0x5208",
            "status": "0x1",
            "logs": [{
                "address": "0x3333333333333333333333333333333333333333",
                "topics": ["0x4444444444444444444444444444444444444444444444444444444444444444"],
                "data": "0x",
                "logIndex": "0x0",
                "removed": false
            }]
        });
        let receipt: TransactionReceipt = serde_json::from_value(json).unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.block_number, Some(U64::from(16)));
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].topics.len(), 1);
        assert!(receipt.logs[0].data.is_empty());
    }

    #[test]
    fn test_receipt_status() {
        let mut receipt = TransactionReceipt {
            transaction_hash: B256::ZERO,
            block_number: None,
            status: Some(U64::ZERO),
            logs: vec![],
        };
        assert!(!receipt.succeeded());

        receipt.status = None;
        assert!(receipt.succeeded());
    }

    /// eth_sendTransaction に渡す形式でシリアライズされる
    #[test]
    fn test_transaction_request_json() {
        let tx = TransactionRequest {
            from: Address::repeat_byte(0x01),
            to: Address::repeat_byte(0x02),
            data: Bytes::from(vec![0xde, 0xad]),
        };
        let json = serde_json::to_value(&tx).unwrap();
        assert_eq!(json["data"], "0xdead");
        assert_eq!(
            json["to"].as_str().unwrap().to_lowercase(),
            "0x0202020202020202020202020202020202020202"
        );
    }
}
