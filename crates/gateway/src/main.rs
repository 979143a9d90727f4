//! # Rx Dashboard Gateway
//!
//! 医師用ダッシュボードのHTTPバックエンド。
//!
//! ## 役割
//! - 患者一覧と処方作成フォーム（下書き）の管理
//! - ミント試行の実行と状態の公開（同時実行は1つまで）
//! - レシートの再構成とミント済み処方の読み出し
//! - IPFSピン留め（オプション）
//!
//! ## API エンドポイント
//! - `GET /patients`: 患者一覧
//! - `GET /form` / `PUT /form` / `DELETE /form`: 下書きの取得・更新・破棄
//! - `POST /form/patient/{id}`: 患者の選択
//! - `POST /form/submit`: ミント試行
//! - `GET /mint/state`: ミント状態
//! - `GET /receipt`: レシートの再構成
//! - `GET /prescriptions/{token_id}`: 処方の読み出し
//! - `POST /ipfs/pin`: IPFSピン留め

mod config;
mod endpoints;
mod error;
mod pinning;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use config::GatewayState;
use endpoints::*;

/// ルーティングを構築する。
fn app(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/patients", get(handle_list_patients))
        .route(
            "/form",
            get(handle_get_form)
                .put(handle_update_form)
                .delete(handle_reset_form),
        )
        .route("/form/patient/{id}", post(handle_select_patient))
        .route("/form/submit", post(handle_submit))
        .route("/mint/state", get(handle_mint_state))
        .route("/receipt", get(handle_receipt))
        .route("/prescriptions/{token_id}", get(handle_view_prescription))
        .route("/ipfs/pin", post(handle_pin))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// エントリポイント
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let state = Arc::new(GatewayState::from_env()?);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    tracing::info!("Gatewayを {} で起動します", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app(state)).await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// テスト
// ---------------------------------------------------------------------------
