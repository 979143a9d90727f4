//! # Prescribedイベントのデコード
//!
//! レシートのログを既知のイベントスキーマに照合し、型付きの結果を返す。
//! 一致しないログやデコードに失敗したログは「該当なし」として扱い、エラーにはしない。

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent;

use crate::contract::IPrescription::Prescribed;
use crate::wallet::{LogEntry, TransactionReceipt};

/// デコード済みの `Prescribed` イベント。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrescribedEvent {
    /// 署名した医師
    pub doctor: Address,
    /// ミントされたTokenId（イベントの第2引数）
    pub token_id: U256,
}

/// ログを `Prescribed` として解釈する。該当しなければNone。
pub fn decode_prescribed(log: &LogEntry) -> Option<PrescribedEvent> {
    if log.topics.first() != Some(&Prescribed::SIGNATURE_HASH) {
        return None;
    }
    match Prescribed::decode_raw_log(log.topics.iter().copied(), &log.data, true) {
        Ok(event) => Some(PrescribedEvent {
            doctor: event.doctor,
            token_id: event.tokenId,
        }),
        Err(e) => {
            tracing::debug!(error = %e, "Prescribedシグネチャのログをデコードできません");
            None
        }
    }
}

/// レシートから最初の `Prescribed` イベントのTokenIdを取り出す。
pub fn find_token_id(receipt: &TransactionReceipt) -> Option<U256> {
    receipt
        .logs
        .iter()
        .find_map(decode_prescribed)
        .map(|event| event.token_id)
}
