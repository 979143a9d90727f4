//! # 医師署名アダプタ
//!
//! 処方フィールドのダイジェストをウォレットに個人メッセージとして署名させる。
//!
//! ## 処理フロー
//! 1. `recipient ++ medication ++ dosage ++ instructions` をパックする
//! 2. Keccak-256で32バイトのダイジェストを得る
//! 3. ダイジェスト32バイトのみをウォレットに渡す
//!    （プレフィックス付与と再ハッシュはウォレット側が行う）
//!
//! コントラクトは `toEthSignedMessageHash(messageHash)` に対して `ecrecover` するため、
//! ここでプレフィックスを付けたりパック済みバイト列をそのまま渡したりしてはならない。

use alloy_primitives::{Address, B256};
use rx_crypto::{prescription_digest, Signature};
use rx_types::PrescriptionFields;

use crate::error::SignError;
use crate::wallet::Wallet;

/// ウォレットに接続し、アクティブアカウント（先頭）を返す。
pub async fn connect(wallet: Option<&dyn Wallet>) -> Result<Address, SignError> {
    let wallet = wallet.ok_or(SignError::WalletUnavailable)?;
    let accounts = wallet.request_accounts().await?;
    accounts.first().copied().ok_or_else(|| {
        SignError::AccountUnavailable("ウォレットが承認済みアカウントを返しませんでした".into())
    })
}

/// 32バイトのダイジェストに個人メッセージ署名を要求する。
pub async fn sign_digest(
    wallet: &dyn Wallet,
    account: Address,
    digest: &B256,
) -> Result<Signature, SignError> {
    tracing::debug!(account = %account, digest = %digest, "ダイジェストへの署名を要求");
    let signature = wallet.sign_message(account, digest.as_slice()).await?;
    Ok(signature)
}

/// 処方に医師として署名する。署名アカウントは `recipient`。
pub async fn sign_prescription(
    wallet: Option<&dyn Wallet>,
    recipient: Address,
    fields: &PrescriptionFields,
) -> Result<Signature, SignError> {
    let wallet = wallet.ok_or(SignError::WalletUnavailable)?;
    let digest = prescription_digest(&recipient, fields);
    sign_digest(wallet, recipient, &digest).await
}
