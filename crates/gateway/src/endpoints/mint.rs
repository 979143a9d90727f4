//! # POST /form/submit, GET /mint/state
//!
//! 下書きの内容で処方をミントする。同時に実行できる試行は1つだけ。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rx_core::receipt::receipt_url;
use rx_core::MintState;
use rx_types::MintResponse;

use crate::config::GatewayState;
use crate::error::GatewayError;

/// POST /form/submit: ミント試行。
///
/// 成功時はレシートとレシートURLを返し、下書きを初期化する。
/// 失敗時は下書きを保持し、エラーメッセージを返す。進行中の試行があれば409。
pub async fn handle_submit(
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<MintResponse>, GatewayError> {
    let minted = state.desk.submit().await?;

    let receipt_url = receipt_url(&state.public_base_url, &minted.receipt);
    Ok(Json(MintResponse {
        token_id: minted.success.token_id.map(|id| id.to_string()),
        tx_hash: minted.success.tx_hash.to_string(),
        recipient: minted.success.recipient.to_string(),
        receipt: minted.receipt,
        receipt_url,
    }))
}

/// GET /mint/state: 現在のミント状態。
pub async fn handle_mint_state(State(state): State<Arc<GatewayState>>) -> Json<MintState> {
    Json(state.desk.minter().state())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::form::{handle_select_patient, handle_update_form};
    use crate::endpoints::test_helpers::{test_state, test_state_with};
    use axum::extract::Path;
    use rx_core::{MintErrorKind, MockBehavior, MockWallet};
    use rx_types::DraftUpdate;

    async fn fill(state: &Arc<GatewayState>) {
        handle_update_form(
            State(state.clone()),
            Json(DraftUpdate {
                medication: Some("Ibuprofen".to_string()),
                amount_mg: Some(200),
                notes: Some("Take twice daily".to_string()),
                ..DraftUpdate::default()
            }),
        )
        .await;
        handle_select_patient(State(state.clone()), Path("2".to_string()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_success() {
        let wallet = Arc::new(MockWallet::random());
        let state = test_state(wallet.clone());
        fill(&state).await;

        let Json(response) = handle_submit(State(state.clone())).await.unwrap();
        assert_eq!(response.token_id.as_deref(), Some("1"));
        assert_eq!(response.recipient, wallet.address().to_string());
        assert_eq!(response.receipt.patient_name, "Jane Smith");
        assert!(response
            .receipt_url
            .starts_with("http://localhost:3000/receipt?tokenId=1&patientName=Jane%20Smith"));

        let Json(mint_state) = handle_mint_state(State(state.clone())).await;
        assert_eq!(
            mint_state,
            MintState::Success {
                token_id: Some("1".to_string())
            }
        );
        // 成功後は下書きが初期化される
        assert_eq!(state.desk.form().await.to_draft().medication, "");
    }

    /// 必須項目が空なら400相当の検証エラー、下書きは保持
    #[tokio::test]
    async fn test_submit_validation_failed() {
        let wallet = Arc::new(MockWallet::random());
        let state = test_state(wallet.clone());
        handle_update_form(
            State(state.clone()),
            Json(DraftUpdate {
                medication: Some("Ibuprofen".to_string()),
                ..DraftUpdate::default()
            }),
        )
        .await;

        let err = handle_submit(State(state.clone())).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Mint(ref e) if e.kind() == MintErrorKind::ValidationFailed
        ));
        assert!(wallet.calls().await.is_empty());
        assert_eq!(state.desk.form().await.to_draft().medication, "Ibuprofen");
    }

    #[tokio::test]
    async fn test_submit_without_wallet() {
        let state = test_state_with(None, None);
        fill(&state).await;
        let err = handle_submit(State(state)).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Mint(ref e) if e.kind() == MintErrorKind::WalletUnavailable
        ));
    }

    #[tokio::test]
    async fn test_submit_reverted_keeps_draft() {
        let wallet = Arc::new(MockWallet::random().with_behavior(MockBehavior {
            revert: true,
            ..MockBehavior::default()
        }));
        let state = test_state(wallet);
        fill(&state).await;

        let err = handle_submit(State(state.clone())).await.unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Mint(ref e) if e.kind() == MintErrorKind::TransactionReverted
        ));
        assert_eq!(state.desk.form().await.to_draft().patient_name, "Jane Smith");
        assert!(matches!(
            state.desk.minter().state(),
            MintState::Failed {
                kind: MintErrorKind::TransactionReverted,
                ..
            }
        ));
    }
}
