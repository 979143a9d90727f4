//! # Rx Dashboard Core
//!
//! 医師署名プロトコルとミント処理を実装する。
//!
//! ## 処理フロー
//! 1. フォームの入力から処方フィールド（medication, dosage, instructions）を得る
//! 2. 必須項目とコントラクト設定を検証する（失敗時はウォレットに触れない）
//! 3. ウォレットに接続し、医師のアカウントを得る
//! 4. パック済みフィールドのKeccak-256ダイジェストに個人メッセージ署名を得る
//! 5. `mintWithSignature` を送信し、レシートの確定を待つ
//! 6. `Prescribed` イベントから新しいTokenIdを復元する
//!
//! ウォレットは `Wallet` トレイトとして明示的に渡す。

pub mod contract;
pub mod error;
pub mod events;
pub mod form;
pub mod mint;
pub mod patients;
pub mod receipt;
pub mod signature;
pub mod viewer;
pub mod wallet;

pub use contract::{OnChainPrescription, PrescriptionContract};
pub use error::{ContractError, DeskError, MintError, MintErrorKind, SignError, WalletError};
pub use events::{decode_prescribed, find_token_id, PrescribedEvent};
pub use form::{MintedPrescription, PrescriptionDesk, PrescriptionForm};
pub use mint::{MintConfig, MintState, MintSuccess, Minter};
pub use viewer::{parse_token_uri, view_prescription};
pub use wallet::{
    LogEntry, MockBehavior, MockWallet, RpcWallet, TransactionReceipt, TransactionRequest, Wallet,
};
