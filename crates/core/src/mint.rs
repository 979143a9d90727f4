//! # ミント処理
//!
//! 1回のミント試行を状態機械として実行する。
//!
//! ```text
//! Idle → Validating → AwaitingWalletConnection → AwaitingSignature
//!      → Submitting → AwaitingConfirmation → { Success | Failed }
//! ```
//!
//! 各段階は厳密に逐次実行する（エンコード → ダイジェスト → 署名 → 送信）。
//! 現在の状態は `tokio::sync::watch` で購読できる。

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use rx_types::PrescriptionFields;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::contract::PrescriptionContract;
use crate::error::{MintError, MintErrorKind, SignError};
use crate::events::find_token_id;
use crate::signature;
use crate::wallet::Wallet;

/// レシートのポーリング間隔のデフォルト
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// レシート待ちのタイムアウトのデフォルト
pub const DEFAULT_RECEIPT_TIMEOUT: Duration = Duration::from_secs(120);

/// ミント処理の設定。
#[derive(Debug, Clone)]
pub struct MintConfig {
    /// 処方コントラクトのアドレス（未設定ならミント時に `MissingConfiguration`）
    pub contract_address: Option<Address>,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
            receipt_timeout: DEFAULT_RECEIPT_TIMEOUT,
        }
    }
}

/// ミント試行の状態。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MintState {
    Idle,
    Validating,
    AwaitingWalletConnection,
    AwaitingSignature,
    Submitting,
    AwaitingConfirmation,
    /// ミント成功。TokenIdが取得できなかった場合はNone（「ミント済み・ID不明」）
    Success { token_id: Option<String> },
    Failed { kind: MintErrorKind, message: String },
}

impl MintState {
    /// 終端状態か
    pub fn is_terminal(&self) -> bool {
        matches!(self, MintState::Success { .. } | MintState::Failed { .. })
    }
}

/// ミント成功の結果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintSuccess {
    /// `Prescribed` イベントから復元したTokenId
    pub token_id: Option<U256>,
    pub tx_hash: B256,
    /// 署名者かつ受取人（医師のアカウント）
    pub recipient: Address,
}

/// ミント処理の実行者。
pub struct Minter {
    config: MintConfig,
    state: watch::Sender<MintState>,
}

impl Minter {
    pub fn new(config: MintConfig) -> Self {
        let (state, _) = watch::channel(MintState::Idle);
        Self { config, state }
    }

    pub fn config(&self) -> &MintConfig {
        &self.config
    }

    /// 状態変化を購読する。
    pub fn subscribe(&self) -> watch::Receiver<MintState> {
        self.state.subscribe()
    }

    /// 現在の状態
    pub fn state(&self) -> MintState {
        self.state.borrow().clone()
    }

    fn transition(&self, next: MintState) {
        tracing::debug!(state = ?next, "ミント状態遷移");
        self.state.send_replace(next);
    }

    fn record_failure(&self, error: &MintError) {
        tracing::warn!(kind = ?error.kind(), error = %error, "ミント失敗");
        self.transition(MintState::Failed {
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    /// 処方をミントする。
    ///
    /// 設定とフィールドの検証に失敗した場合、ウォレットには一切触れない。
    /// `Prescribed` イベントが見つからなくても成功として扱う。
    pub async fn mint(
        &self,
        wallet: Option<&dyn Wallet>,
        fields: &PrescriptionFields,
    ) -> Result<MintSuccess, MintError> {
        self.mint_checked(wallet, fields, &[]).await
    }

    /// 呼び出し側（フォーム）で検出した未入力項目も `Validating` 段階で検証する。
    pub async fn mint_checked(
        &self,
        wallet: Option<&dyn Wallet>,
        fields: &PrescriptionFields,
        missing_inputs: &[&str],
    ) -> Result<MintSuccess, MintError> {
        let result = self.run(wallet, fields, missing_inputs).await;
        match &result {
            Ok(success) => {
                tracing::info!(
                    tx_hash = %success.tx_hash,
                    token_id = ?success.token_id,
                    "処方のミント完了"
                );
                self.transition(MintState::Success {
                    token_id: success.token_id.map(|id| id.to_string()),
                });
            }
            Err(e) => self.record_failure(e),
        }
        result
    }

    async fn run(
        &self,
        wallet: Option<&dyn Wallet>,
        fields: &PrescriptionFields,
        missing_inputs: &[&str],
    ) -> Result<MintSuccess, MintError> {
        // Step 1: 検証
        self.transition(MintState::Validating);
        let contract_address = self.config.contract_address.ok_or_else(|| {
            MintError::MissingConfiguration("PRESCRIPTION_CONTRACTを設定してください".to_string())
        })?;
        if !missing_inputs.is_empty() {
            return Err(MintError::ValidationFailed(missing_inputs.join(", ")));
        }
        let missing = fields.missing_fields();
        if !missing.is_empty() {
            return Err(MintError::ValidationFailed(missing.join(", ")));
        }

        // Step 2: ウォレット接続
        self.transition(MintState::AwaitingWalletConnection);
        let wallet = wallet.ok_or_else(|| MintError::from(SignError::WalletUnavailable))?;
        let recipient = signature::connect(Some(wallet)).await?;

        // Step 3: 医師署名
        self.transition(MintState::AwaitingSignature);
        let doctor_signature = signature::sign_prescription(Some(wallet), recipient, fields).await?;

        // Step 4: mintWithSignature送信
        self.transition(MintState::Submitting);
        let contract = PrescriptionContract::new(contract_address, wallet);
        let tx_hash = contract
            .mint_with_signature(recipient, recipient, fields, &doctor_signature)
            .await
            .map_err(MintError::from_submission)?;
        tracing::info!(tx_hash = %tx_hash, recipient = %recipient, "mintWithSignatureを送信");

        // Step 5: 確定待ち
        self.transition(MintState::AwaitingConfirmation);
        let receipt = contract
            .wait_for_receipt(
                tx_hash,
                self.config.receipt_poll_interval,
                self.config.receipt_timeout,
            )
            .await?;
        if !receipt.succeeded() {
            return Err(MintError::TransactionReverted(format!(
                "トランザクション {tx_hash} はオンチェーンで失敗しました"
            )));
        }

        // Step 6: TokenIdの復元
        let token_id = find_token_id(&receipt);
        if token_id.is_none() {
            tracing::warn!(tx_hash = %tx_hash, "Prescribedイベントが見つかりません（TokenId不明）");
        }

        Ok(MintSuccess {
            token_id,
            tx_hash,
            recipient,
        })
    }
}
