//! # コアエラー型
//!
//! ウォレット・署名・コントラクト・ミントの各段階のエラー。
//! ミント処理の失敗は全て `MintError` に集約され、メッセージはそのまま画面に表示できる。

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// EIP-1193: ユーザーがリクエストを拒否した
pub const PROVIDER_USER_REJECTED: i64 = 4001;
/// EIP-1193: 要求されたアカウント・メソッドが未承認
pub const PROVIDER_UNAUTHORIZED: i64 = 4100;
/// EIP-1193: プロバイダがどのチェーンにも接続していない
pub const PROVIDER_DISCONNECTED: i64 = 4900;
/// EIP-1193: プロバイダが要求されたチェーンに接続していない
pub const PROVIDER_CHAIN_DISCONNECTED: i64 = 4901;
/// JSON-RPC: メソッドが存在しない
pub const RPC_METHOD_NOT_FOUND: i64 = -32601;
/// JSON-RPC: コントラクト実行のrevert
pub const RPC_EXECUTION_REVERTED: i64 = 3;
/// JSON-RPC: ノードがトランザクションを受理しなかった（EIP-1474）
pub const RPC_TRANSACTION_REJECTED: i64 = -32003;

/// ウォレット（プロバイダ）エラー型。
#[derive(Debug, Clone, thiserror::Error)]
pub enum WalletError {
    /// ユーザーがウォレットのプロンプトを拒否した（4001）
    #[error("ユーザーがリクエストを拒否しました: {0}")]
    UserRejected(String),
    /// アカウントが承認されていない（4100）
    #[error("アカウントが承認されていません: {0}")]
    Unauthorized(String),
    /// ウォレットが切断されている（4900, 4901）
    #[error("ウォレットが切断されています: {0}")]
    Disconnected(String),
    /// その他のJSON-RPCエラー
    #[error("JSON-RPCエラー ({code}): {message}")]
    Rpc { code: i64, message: String },
    /// 通信失敗
    #[error("ウォレットとの通信に失敗: {0}")]
    Transport(String),
    /// 応答のパース失敗
    #[error("ウォレットの応答が不正です: {0}")]
    InvalidResponse(String),
}

impl WalletError {
    /// JSON-RPCのエラーコードからEIP-1193の分類に振り分ける。
    pub fn from_rpc(code: i64, message: impl Into<String>) -> Self {
        let message = message.into();
        match code {
            PROVIDER_USER_REJECTED => WalletError::UserRejected(message),
            PROVIDER_UNAUTHORIZED => WalletError::Unauthorized(message),
            PROVIDER_DISCONNECTED | PROVIDER_CHAIN_DISCONNECTED => {
                WalletError::Disconnected(message)
            }
            _ => WalletError::Rpc { code, message },
        }
    }
}

/// 署名アダプタのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum SignError {
    /// ウォレットが存在しない
    #[error("ウォレットが見つかりません。MetaMask等のWeb3ウォレットを設定してください")]
    WalletUnavailable,
    /// ユーザーが署名を拒否した
    #[error("署名がユーザーに拒否されました: {0}")]
    UserRejected(String),
    /// 接続済み・承認済みのアカウントがない
    #[error("利用可能なアカウントがありません: {0}")]
    AccountUnavailable(String),
    /// その他のウォレットエラー
    #[error("署名に失敗: {0}")]
    Wallet(WalletError),
}

impl From<WalletError> for SignError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::UserRejected(msg) => SignError::UserRejected(msg),
            WalletError::Unauthorized(msg) | WalletError::Disconnected(msg) => {
                SignError::AccountUnavailable(msg)
            }
            other => SignError::Wallet(other),
        }
    }
}

/// コントラクト呼び出しのエラー型。
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// ウォレット経由の呼び出し失敗
    #[error(transparent)]
    Wallet(#[from] WalletError),
    /// ABIデコード失敗
    #[error("コントラクト応答のデコードに失敗: {0}")]
    Decode(String),
    /// レシート待ちのタイムアウト
    #[error("トランザクション {0} の確定待ちがタイムアウトしました")]
    ReceiptTimeout(B256),
}

/// ミント失敗の分類。状態機械の `Failed` に載せる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MintErrorKind {
    MissingConfiguration,
    ValidationFailed,
    WalletUnavailable,
    TransactionRejected,
    TransactionReverted,
    Unknown,
}

/// ミント処理のエラー型。メッセージはそのまま利用者に表示する。
#[derive(Debug, thiserror::Error)]
pub enum MintError {
    /// コントラクトアドレスが未設定
    #[error("コントラクトアドレスが設定されていません: {0}")]
    MissingConfiguration(String),
    /// 必須フィールドが空
    #[error("必須項目を入力してください: {0}")]
    ValidationFailed(String),
    /// ウォレットが利用できない
    #[error("ウォレットを利用できません: {0}")]
    WalletUnavailable(String),
    /// ユーザーまたはノードが拒否した
    #[error("リクエストが拒否されました: {0}")]
    TransactionRejected(String),
    /// オンチェーン実行に失敗した
    #[error("トランザクションがrevertしました: {0}")]
    TransactionReverted(String),
    /// その他
    #[error("不明なエラー: {0}")]
    Unknown(String),
}

impl MintError {
    pub fn kind(&self) -> MintErrorKind {
        match self {
            MintError::MissingConfiguration(_) => MintErrorKind::MissingConfiguration,
            MintError::ValidationFailed(_) => MintErrorKind::ValidationFailed,
            MintError::WalletUnavailable(_) => MintErrorKind::WalletUnavailable,
            MintError::TransactionRejected(_) => MintErrorKind::TransactionRejected,
            MintError::TransactionReverted(_) => MintErrorKind::TransactionReverted,
            MintError::Unknown(_) => MintErrorKind::Unknown,
        }
    }

    /// トランザクション送信時のウォレットエラーを分類する。
    pub fn from_submission(e: WalletError) -> Self {
        match e {
            WalletError::UserRejected(msg) => MintError::TransactionRejected(msg),
            WalletError::Unauthorized(msg) | WalletError::Disconnected(msg) => {
                MintError::WalletUnavailable(msg)
            }
            WalletError::Rpc { code, message } if code == RPC_EXECUTION_REVERTED => {
                MintError::TransactionReverted(message)
            }
            WalletError::Rpc { code, message } if code == RPC_TRANSACTION_REJECTED => {
                MintError::TransactionRejected(message)
            }
            other => MintError::Unknown(other.to_string()),
        }
    }
}

impl From<SignError> for MintError {
    fn from(e: SignError) -> Self {
        match &e {
            SignError::WalletUnavailable => MintError::WalletUnavailable(e.to_string()),
            SignError::AccountUnavailable(_) => MintError::WalletUnavailable(e.to_string()),
            SignError::UserRejected(_) => MintError::TransactionRejected(e.to_string()),
            SignError::Wallet(inner) => MintError::Unknown(inner.to_string()),
        }
    }
}

impl From<ContractError> for MintError {
    fn from(e: ContractError) -> Self {
        match e {
            ContractError::Wallet(inner) => MintError::from_submission(inner),
            other => MintError::Unknown(other.to_string()),
        }
    }
}

/// 受付窓口（デスク）のエラー型。
#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    /// 別のミント処理が進行中
    #[error("処方のミント処理が進行中です。完了までお待ちください")]
    AttemptInProgress,
    /// ミント失敗
    #[error(transparent)]
    Mint(#[from] MintError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eip1193_codes() {
        assert!(matches!(
            WalletError::from_rpc(4001, "denied"),
            WalletError::UserRejected(_)
        ));
        assert!(matches!(
            WalletError::from_rpc(4100, "unauthorized"),
            WalletError::Unauthorized(_)
        ));
        assert!(matches!(
            WalletError::from_rpc(4900, "disconnected"),
            WalletError::Disconnected(_)
        ));
        assert!(matches!(
            WalletError::from_rpc(-32000, "nonce too low"),
            WalletError::Rpc { code: -32000, .. }
        ));
    }

    #[test]
    fn test_sign_error_mapping() {
        let rejected: MintError = SignError::from(WalletError::UserRejected("x".into())).into();
        assert_eq!(rejected.kind(), MintErrorKind::TransactionRejected);

        let no_account: MintError =
            SignError::from(WalletError::Unauthorized("x".into())).into();
        assert_eq!(no_account.kind(), MintErrorKind::WalletUnavailable);

        let missing: MintError = SignError::WalletUnavailable.into();
        assert_eq!(missing.kind(), MintErrorKind::WalletUnavailable);
    }

    #[test]
    fn test_submission_mapping() {
        let reverted = MintError::from_submission(WalletError::Rpc {
            code: RPC_EXECUTION_REVERTED,
            message: "execution reverted: invalid signature".into(),
        });
        assert_eq!(reverted.kind(), MintErrorKind::TransactionReverted);
        assert!(reverted.to_string().contains("invalid signature"));

        let rejected = MintError::from_submission(WalletError::UserRejected("denied".into()));
        assert_eq!(rejected.kind(), MintErrorKind::TransactionRejected);

        let transport = MintError::from_submission(WalletError::Transport("refused".into()));
        assert_eq!(transport.kind(), MintErrorKind::Unknown);
    }
}
