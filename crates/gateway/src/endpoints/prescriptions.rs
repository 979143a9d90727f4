//! # GET /prescriptions/{token_id}
//!
//! ミント済みトークンの処方内容とメタデータを読み出す。

use std::sync::Arc;

use alloy_primitives::U256;
use axum::extract::{Path, State};
use axum::Json;
use rx_core::error::RPC_EXECUTION_REVERTED;
use rx_core::{
    view_prescription, ContractError, MintError, PrescriptionContract, SignError, WalletError,
};
use rx_types::PrescriptionView;

use crate::config::GatewayState;
use crate::error::GatewayError;

pub async fn handle_view_prescription(
    State(state): State<Arc<GatewayState>>,
    Path(token_id): Path<String>,
) -> Result<Json<PrescriptionView>, GatewayError> {
    let token = token_id
        .parse::<U256>()
        .map_err(|e| GatewayError::BadRequest(format!("TokenIdが不正です: {e}")))?;

    let contract_address = state
        .desk
        .minter()
        .config()
        .contract_address
        .ok_or_else(|| {
            MintError::MissingConfiguration("PRESCRIPTION_CONTRACTを設定してください".to_string())
        })?;
    let wallet = state
        .desk
        .wallet()
        .ok_or_else(|| MintError::from(SignError::WalletUnavailable))?;

    let contract = PrescriptionContract::new(contract_address, wallet);
    let view = view_prescription(&contract, token).await.map_err(|e| match e {
        ContractError::Wallet(WalletError::Rpc { code, .. }) if code == RPC_EXECUTION_REVERTED => {
            GatewayError::NotFound(format!("トークン {token_id}"))
        }
        other => GatewayError::Contract(other.to_string()),
    })?;
    Ok(Json(view))
}
