//! # Gateway エラー型

use axum::http::StatusCode;
use rx_core::{DeskError, MintError, MintErrorKind};

/// Gatewayエラー型。
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// ミント処理の失敗（メッセージはそのまま表示できる）
    #[error(transparent)]
    Mint(#[from] MintError),
    /// 別のミント処理が進行中
    #[error("処方のミント処理が進行中です。完了までお待ちください")]
    Busy,
    /// 対象が存在しない
    #[error("見つかりません: {0}")]
    NotFound(String),
    /// コントラクトの読み出しに失敗
    #[error("コントラクトの読み出しに失敗: {0}")]
    Contract(String),
    /// IPFSピン留めが未設定
    #[error("IPFSピン留めが設定されていません（FILEBASE_API_TOKEN）")]
    PinningDisabled,
    /// IPFSピン留めに失敗
    #[error("IPFSピン留めに失敗: {0}")]
    Pinning(String),
    /// 内部エラー
    #[error("内部エラー: {0}")]
    Internal(String),
    /// 不正なリクエスト
    #[error("不正なリクエスト: {0}")]
    BadRequest(String),
}

impl From<DeskError> for GatewayError {
    fn from(e: DeskError) -> Self {
        match e {
            DeskError::AttemptInProgress => GatewayError::Busy,
            DeskError::Mint(inner) => GatewayError::Mint(inner),
        }
    }
}

fn mint_status(kind: MintErrorKind) -> StatusCode {
    match kind {
        MintErrorKind::MissingConfiguration | MintErrorKind::WalletUnavailable => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        MintErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
        MintErrorKind::TransactionRejected => StatusCode::FORBIDDEN,
        MintErrorKind::TransactionReverted => StatusCode::BAD_GATEWAY,
        MintErrorKind::Unknown => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl axum::response::IntoResponse for GatewayError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            GatewayError::Mint(e) => mint_status(e.kind()),
            GatewayError::Busy => StatusCode::CONFLICT,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::Contract(_) | GatewayError::Pinning(_) => StatusCode::BAD_GATEWAY,
            GatewayError::PinningDisabled => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %self, "リクエスト処理に失敗");
        }
        (status, self.to_string()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                GatewayError::Mint(MintError::ValidationFailed("notes".into())),
                StatusCode::BAD_REQUEST,
            ),
            (
                GatewayError::Mint(MintError::MissingConfiguration("x".into())),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (
                GatewayError::Mint(MintError::TransactionRejected("denied".into())),
                StatusCode::FORBIDDEN,
            ),
            (
                GatewayError::Mint(MintError::TransactionReverted("x".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (GatewayError::Busy, StatusCode::CONFLICT),
            (GatewayError::NotFound("4".into()), StatusCode::NOT_FOUND),
        ];
        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_from_desk_error() {
        assert!(matches!(
            GatewayError::from(DeskError::AttemptInProgress),
            GatewayError::Busy
        ));
        let e = GatewayError::from(DeskError::Mint(MintError::Unknown("boom".into())));
        assert!(e.to_string().contains("boom"));
    }
}
