//! # 処方ビューア（読み出し経路）
//!
//! ミント済みトークンの処方内容と `tokenURI` のメタデータを取得する。

use alloy_primitives::U256;
use percent_encoding::percent_decode_str;
use rx_types::PrescriptionView;

use crate::contract::PrescriptionContract;
use crate::error::ContractError;

/// メタデータを埋め込んだtokenURIのプレフィックス
pub const JSON_DATA_URI_PREFIX: &str = "data:application/json,";

/// `data:application/json,<パーセントエンコードされたJSON>` をパースする。
///
/// それ以外の形式や壊れたペイロードはNone（エラーにはしない）。
pub fn parse_token_uri(uri: &str) -> Option<serde_json::Value> {
    let payload = uri.strip_prefix(JSON_DATA_URI_PREFIX)?;

    let decoded = match percent_decode_str(payload).decode_utf8() {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(error = %e, "tokenURIのデコードに失敗");
            return None;
        }
    };

    match serde_json::from_str(&decoded) {
        Ok(metadata) => Some(metadata),
        Err(e) => {
            tracing::warn!(error = %e, "tokenURIのJSONパースに失敗");
            None
        }
    }
}

/// トークンの処方内容とメタデータを読み出す。
pub async fn view_prescription(
    contract: &PrescriptionContract<'_>,
    token_id: U256,
) -> Result<PrescriptionView, ContractError> {
    let prescription = contract.prescription(token_id).await?;
    let token_uri = contract.token_uri(token_id).await?;
    let metadata = parse_token_uri(&token_uri);

    Ok(PrescriptionView {
        token_id: token_id.to_string(),
        medication: prescription.medication,
        dosage: prescription.dosage,
        instructions: prescription.instructions,
        token_uri,
        metadata,
    })
}
