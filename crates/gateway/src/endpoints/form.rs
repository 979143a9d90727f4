//! # /form
//!
//! 処方作成モーダルの下書き。
//! - `GET /form`: 現在の下書き
//! - `PUT /form`: 指定項目の更新
//! - `DELETE /form`: 破棄（初期状態に戻す）
//! - `POST /form/patient/{id}`: 患者の選択

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use rx_types::{DraftUpdate, PrescriptionDraft};

use crate::config::GatewayState;
use crate::error::GatewayError;

pub async fn handle_get_form(State(state): State<Arc<GatewayState>>) -> Json<PrescriptionDraft> {
    Json(state.desk.form().await.to_draft())
}

pub async fn handle_update_form(
    State(state): State<Arc<GatewayState>>,
    Json(update): Json<DraftUpdate>,
) -> Json<PrescriptionDraft> {
    Json(state.desk.update_form(update).await.to_draft())
}

pub async fn handle_reset_form(State(state): State<Arc<GatewayState>>) -> Json<PrescriptionDraft> {
    Json(state.desk.reset_form().await.to_draft())
}

/// POST /form/patient/{id}: 患者を選択し、氏名とIDを下書きに入れる。
pub async fn handle_select_patient(
    State(state): State<Arc<GatewayState>>,
    Path(patient_id): Path<String>,
) -> Result<Json<PrescriptionDraft>, GatewayError> {
    let patient = rx_core::patients::find(&patient_id)
        .ok_or_else(|| GatewayError::NotFound(format!("患者 {patient_id}")))?;
    Ok(Json(state.desk.select_patient(&patient).await.to_draft()))
}
