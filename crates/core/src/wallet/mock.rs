//! # ローカル開発用モックウォレット
//!
//! ブラウザウォレットやノードが利用できない開発環境で使用するモック実装。
//! メモリ内のsecp256k1鍵で署名し、処方コントラクトを模擬する。
//!
//! 模擬コントラクトは本物と同じく医師署名を検証する:
//! `ecrecover(toEthSignedMessageHash(keccak256(abi.encodePacked(...))))` が
//! 送信者と一致しなければrevertする。

use std::collections::{BTreeMap, HashMap};

use alloy_primitives::{keccak256, Address, Bytes, B256, U256, U64};
use alloy_sol_types::SolCall;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rx_crypto::{
    address_of, prescription_digest, recover_personal_signer, sign_personal_message,
    signing_key_from_hex, CryptoError, Signature, SigningKey,
};
use rx_types::PrescriptionFields;
use tokio::sync::Mutex;

use super::{LogEntry, TransactionReceipt, TransactionRequest, Wallet};
use crate::contract::{IPrescription, OnChainPrescription};
use crate::error::{WalletError, RPC_EXECUTION_REVERTED};

/// モックウォレットの振る舞い。全てfalseで正常系。
#[derive(Debug, Clone, Default)]
pub struct MockBehavior {
    /// 承認済みアカウントを返さない
    pub no_accounts: bool,
    /// 署名プロンプトをユーザーが拒否する
    pub reject_signing: bool,
    /// トランザクション送信をユーザーが拒否する
    pub reject_transactions: bool,
    /// ミントを常にrevertさせる
    pub revert: bool,
    /// ミント成功時に `Prescribed` を発行しない
    pub omit_event: bool,
    /// レシートがNoneを返す回数（未確定状態の模擬）
    pub pending_polls: u32,
}

/// モックウォレットが受けた呼び出しの記録。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletCall {
    RequestAccounts,
    SignMessage { account: Address, message_len: usize },
    SendTransaction { from: Address, to: Address },
    TransactionReceipt { tx_hash: B256 },
    Call { to: Address },
}

/// 模擬コントラクトに記録された処方。
struct MintedRecord {
    doctor: Address,
    prescription: OnChainPrescription,
}

/// 模擬チェーンの状態。
struct MockChain {
    next_token_id: U256,
    nonce: u64,
    block_number: u64,
    minted: BTreeMap<U256, MintedRecord>,
    receipts: HashMap<B256, TransactionReceipt>,
    pending: HashMap<B256, u32>,
    calls: Vec<WalletCall>,
}

/// モックウォレット。ローカル開発・テスト用。
pub struct MockWallet {
    /// secp256k1署名鍵（メモリ内）
    signing_key: SigningKey,
    /// 署名鍵に対応するアカウント
    address: Address,
    behavior: MockBehavior,
    chain: Mutex<MockChain>,
}

impl MockWallet {
    /// 指定の秘密鍵でMockWalletを初期化する。
    pub fn new(signing_key: SigningKey) -> Self {
        let address = address_of(signing_key.verifying_key());
        Self {
            signing_key,
            address,
            behavior: MockBehavior::default(),
            chain: Mutex::new(MockChain {
                next_token_id: U256::from(1u64),
                nonce: 0,
                block_number: 0,
                minted: BTreeMap::new(),
                receipts: HashMap::new(),
                pending: HashMap::new(),
                calls: Vec::new(),
            }),
        }
    }

    /// ランダムな鍵で初期化する。
    pub fn random() -> Self {
        Self::new(SigningKey::random(&mut rand::rngs::OsRng))
    }

    /// 16進数の秘密鍵から初期化する。
    pub fn from_hex(key_hex: &str) -> Result<Self, CryptoError> {
        Ok(Self::new(signing_key_from_hex(key_hex)?))
    }

    pub fn with_behavior(mut self, behavior: MockBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    /// ウォレットのアカウント
    pub fn address(&self) -> Address {
        self.address
    }

    /// これまでの呼び出し記録
    pub async fn calls(&self) -> Vec<WalletCall> {
        self.chain.lock().await.calls.clone()
    }

    /// ミント済みトークン数
    pub async fn minted_count(&self) -> usize {
        self.chain.lock().await.minted.len()
    }

    /// 模擬コントラクトの `mintWithSignature` を実行する。revert理由をErrで返す。
    fn execute_mint(
        &self,
        chain: &mut MockChain,
        tx: &TransactionRequest,
    ) -> Result<Vec<LogEntry>, String> {
        if self.behavior.revert {
            return Err("mock revert".to_string());
        }

        let call = IPrescription::mintWithSignatureCall::abi_decode(&tx.data, true)
            .map_err(|e| format!("calldataを解釈できません: {e}"))?;
        let fields = PrescriptionFields {
            medication: call.medication,
            dosage: call.dosage,
            instructions: call.instructions,
        };
        let signature =
            Signature::from_slice(&call.signature).map_err(|e| format!("invalid signature: {e}"))?;

        let digest = prescription_digest(&call.recipient, &fields);
        let signer = recover_personal_signer(digest.as_slice(), &signature)
            .map_err(|e| format!("invalid signature: {e}"))?;
        if signer != tx.from {
            return Err(format!("invalid doctor signature: recovered {signer}"));
        }

        let token_id = chain.next_token_id;
        chain.next_token_id += U256::from(1u64);
        chain.minted.insert(
            token_id,
            MintedRecord {
                doctor: signer,
                prescription: OnChainPrescription {
                    medication: fields.medication,
                    dosage: fields.dosage,
                    instructions: fields.instructions,
                },
            },
        );

        if self.behavior.omit_event {
            return Ok(Vec::new());
        }
        Ok(vec![LogEntry {
            address: tx.to,
            topics: vec![
                <IPrescription::Prescribed as alloy_sol_types::SolEvent>::SIGNATURE_HASH,
                B256::left_padding_from(signer.as_slice()),
                B256::from(token_id.to_be_bytes::<32>()),
            ],
            data: Bytes::new(),
        }])
    }

    /// `tokenURI` の応答。`data:application/json,` + パーセントエンコードしたJSON。
    fn token_uri(token_id: U256, record: &MintedRecord) -> String {
        let metadata = serde_json::json!({
            "name": format!("Prescription #{token_id}"),
            "description": format!("On-chain prescription signed by {}", record.doctor),
            "attributes": [
                {"trait_type": "Medication", "value": record.prescription.medication},
                {"trait_type": "Dosage", "value": record.prescription.dosage},
                {"trait_type": "Instructions", "value": record.prescription.instructions},
            ],
        });
        format!(
            "data:application/json,{}",
            utf8_percent_encode(&metadata.to_string(), NON_ALPHANUMERIC)
        )
    }
}

fn reverted(reason: &str) -> WalletError {
    WalletError::Rpc {
        code: RPC_EXECUTION_REVERTED,
        message: format!("execution reverted: {reason}"),
    }
}

#[async_trait::async_trait]
impl Wallet for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        self.chain.lock().await.calls.push(WalletCall::RequestAccounts);
        if self.behavior.no_accounts {
            return Ok(Vec::new());
        }
        Ok(vec![self.address])
    }

    async fn sign_message(
        &self,
        account: Address,
        message: &[u8],
    ) -> Result<Signature, WalletError> {
        self.chain.lock().await.calls.push(WalletCall::SignMessage {
            account,
            message_len: message.len(),
        });
        if self.behavior.reject_signing {
            return Err(WalletError::UserRejected(
                "User denied message signature.".to_string(),
            ));
        }
        if account != self.address {
            return Err(WalletError::Unauthorized(format!(
                "アカウント {account} はこのウォレットで承認されていません"
            )));
        }
        sign_personal_message(&self.signing_key, message)
            .map_err(|e| WalletError::InvalidResponse(e.to_string()))
    }

    async fn send_transaction(&self, tx: &TransactionRequest) -> Result<B256, WalletError> {
        let mut chain = self.chain.lock().await;
        chain.calls.push(WalletCall::SendTransaction {
            from: tx.from,
            to: tx.to,
        });
        if self.behavior.reject_transactions {
            return Err(WalletError::UserRejected(
                "User denied transaction signature.".to_string(),
            ));
        }
        if tx.from != self.address {
            return Err(WalletError::Unauthorized(format!(
                "アカウント {} はこのウォレットで承認されていません",
                tx.from
            )));
        }

        chain.nonce += 1;
        chain.block_number += 1;
        let mut preimage = tx.data.to_vec();
        preimage.extend_from_slice(tx.to.as_slice());
        preimage.extend_from_slice(&chain.nonce.to_be_bytes());
        let tx_hash = keccak256(&preimage);

        let (status, logs) = match self.execute_mint(&mut chain, tx) {
            Ok(logs) => (U64::from(1u64), logs),
            Err(reason) => {
                tracing::debug!(tx_hash = %tx_hash, reason = %reason, "模擬コントラクトがrevert");
                (U64::ZERO, Vec::new())
            }
        };

        let receipt = TransactionReceipt {
            transaction_hash: tx_hash,
            block_number: Some(U64::from(chain.block_number)),
            status: Some(status),
            logs,
        };
        chain.receipts.insert(tx_hash, receipt);
        if self.behavior.pending_polls > 0 {
            chain.pending.insert(tx_hash, self.behavior.pending_polls);
        }
        Ok(tx_hash)
    }

    async fn transaction_receipt(
        &self,
        tx_hash: B256,
    ) -> Result<Option<TransactionReceipt>, WalletError> {
        let mut chain = self.chain.lock().await;
        chain.calls.push(WalletCall::TransactionReceipt { tx_hash });
        if let Some(remaining) = chain.pending.get_mut(&tx_hash) {
            if *remaining > 0 {
                *remaining -= 1;
                return Ok(None);
            }
        }
        Ok(chain.receipts.get(&tx_hash).cloned())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        let mut chain = self.chain.lock().await;
        chain.calls.push(WalletCall::Call { to });

        if data.len() < 4 {
            return Err(reverted("calldata too short"));
        }
        let selector: [u8; 4] = [data[0], data[1], data[2], data[3]];

        if selector == IPrescription::prescriptionsCall::SELECTOR {
            let call = IPrescription::prescriptionsCall::abi_decode(&data, true)
                .map_err(|e| reverted(&e.to_string()))?;
            let record = chain
                .minted
                .get(&call.tokenId)
                .ok_or_else(|| reverted("nonexistent token"))?;
            let p = &record.prescription;
            let output = IPrescription::prescriptionsCall::abi_encode_returns(&(
                p.medication.clone(),
                p.dosage.clone(),
                p.instructions.clone(),
            ));
            return Ok(Bytes::from(output));
        }

        if selector == IPrescription::tokenURICall::SELECTOR {
            let call = IPrescription::tokenURICall::abi_decode(&data, true)
                .map_err(|e| reverted(&e.to_string()))?;
            let record = chain
                .minted
                .get(&call.tokenId)
                .ok_or_else(|| reverted("nonexistent token"))?;
            let uri = Self::token_uri(call.tokenId, record);
            let output = IPrescription::tokenURICall::abi_encode_returns(&(uri,));
            return Ok(Bytes::from(output));
        }

        Err(reverted("unknown selector"))
    }
}
