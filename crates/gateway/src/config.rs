//! # Gateway設定・共有状態
//!
//! 環境変数からの設定読み込みとGatewayの共有状態の定義。

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::Address;
use rx_core::mint::{DEFAULT_RECEIPT_POLL_INTERVAL, DEFAULT_RECEIPT_TIMEOUT};
use rx_core::{MintConfig, Minter, MockWallet, PrescriptionDesk, RpcWallet, Wallet};

use crate::pinning::{FilebasePinner, Pinner};

/// Gatewayの共有状態。
pub struct GatewayState {
    /// 処方受付窓口（フォーム・処理中フラグ・ミント処理）
    pub desk: PrescriptionDesk,
    /// IPFSピン留め（未設定ならNone）
    pub pinner: Option<Box<dyn Pinner>>,
    /// レシートURLの基点
    pub public_base_url: String,
}

/// ウォレットの接続方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletMode {
    /// JSON-RPCノード（WALLET_RPC_URL）
    Rpc,
    /// メモリ内の鍵と模擬コントラクト（開発用）
    Mock,
}

impl std::str::FromStr for WalletMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rpc" => Ok(WalletMode::Rpc),
            "mock" => Ok(WalletMode::Mock),
            other => Err(anyhow::anyhow!(
                "WALLET_MODEは rpc または mock である必要があります: {other}"
            )),
        }
    }
}

/// 処方コントラクトのアドレスを読み込む。未設定はNone（ミント時にMissingConfiguration）。
fn contract_address_from_env() -> anyhow::Result<Option<Address>> {
    match std::env::var("PRESCRIPTION_CONTRACT") {
        Ok(value) if !value.is_empty() => {
            let address = value.parse::<Address>().map_err(|e| {
                anyhow::anyhow!("PRESCRIPTION_CONTRACTが不正なアドレスです: {e}")
            })?;
            Ok(Some(address))
        }
        _ => {
            tracing::warn!("PRESCRIPTION_CONTRACTが未設定です。ミントは失敗します");
            Ok(None)
        }
    }
}

fn duration_from_env(
    name: &str,
    default: Duration,
    to_duration: fn(u64) -> Duration,
) -> anyhow::Result<Duration> {
    match std::env::var(name) {
        Ok(value) => {
            let n: u64 = value
                .parse()
                .map_err(|e| anyhow::anyhow!("{name}は整数である必要があります: {e}"))?;
            Ok(to_duration(n))
        }
        Err(_) => Ok(default),
    }
}

/// ミント処理の設定を環境変数から読み込む。
pub fn mint_config_from_env() -> anyhow::Result<MintConfig> {
    Ok(MintConfig {
        contract_address: contract_address_from_env()?,
        receipt_poll_interval: duration_from_env(
            "RECEIPT_POLL_INTERVAL_MS",
            DEFAULT_RECEIPT_POLL_INTERVAL,
            Duration::from_millis,
        )?,
        receipt_timeout: duration_from_env(
            "RECEIPT_TIMEOUT_SECS",
            DEFAULT_RECEIPT_TIMEOUT,
            Duration::from_secs,
        )?,
    })
}

/// ウォレットを環境変数から構築する。
pub fn wallet_from_env(http_client: reqwest::Client) -> anyhow::Result<Arc<dyn Wallet>> {
    let mode: WalletMode = std::env::var("WALLET_MODE")
        .unwrap_or_else(|_| "rpc".to_string())
        .parse()?;

    match mode {
        WalletMode::Rpc => {
            let rpc_url = std::env::var("WALLET_RPC_URL")
                .unwrap_or_else(|_| "http://localhost:8545".to_string());
            tracing::info!(wallet_rpc_url = %rpc_url, "JSON-RPCウォレットを使用");
            Ok(Arc::new(RpcWallet::with_client(rpc_url, http_client)))
        }
        WalletMode::Mock => {
            let wallet = if let Ok(key_hex) = std::env::var("MOCK_WALLET_KEY") {
                MockWallet::from_hex(&key_hex)?
            } else {
                // 開発環境用: ランダムキーを生成
                tracing::warn!("MOCK_WALLET_KEYが未設定です。ランダムキーを生成します（開発環境用）");
                MockWallet::random()
            };
            tracing::info!(account = %wallet.address(), "モックウォレットを使用");
            Ok(Arc::new(wallet))
        }
    }
}

impl GatewayState {
    /// 環境変数から共有状態を構築する。
    pub fn from_env() -> anyhow::Result<Self> {
        let http_client = reqwest::Client::new();
        let wallet = wallet_from_env(http_client.clone())?;
        let minter = Minter::new(mint_config_from_env()?);

        let pinner = FilebasePinner::from_env(http_client).map(|p| Box::new(p) as Box<dyn Pinner>);
        if pinner.is_none() {
            tracing::info!("FILEBASE_API_TOKENが未設定のため、IPFSピン留めは無効です");
        }

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".to_string());

        Ok(Self {
            desk: PrescriptionDesk::new(minter, Some(wallet)),
            pinner,
            public_base_url,
        })
    }
}
