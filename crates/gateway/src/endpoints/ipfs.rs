//! # POST /ipfs/pin
//!
//! JSONをIPFSにピン留めしてCIDを返す。ミント経路とは独立。

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rx_types::PinResponse;

use crate::config::GatewayState;
use crate::error::GatewayError;

pub async fn handle_pin(
    State(state): State<Arc<GatewayState>>,
    Json(data): Json<serde_json::Value>,
) -> Result<Json<PinResponse>, GatewayError> {
    let pinner = state.pinner.as_ref().ok_or(GatewayError::PinningDisabled)?;
    let cid = pinner.pin_json(&data).await?;
    tracing::info!(cid = %cid, "IPFSにピン留め");
    Ok(Json(PinResponse { cid }))
}
