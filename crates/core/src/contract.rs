//! # 処方コントラクトのバインディング
//!
//! `mintWithSignature` の送信、`prescriptions` / `tokenURI` の読み出し、
//! レシート確定待ちを行う。呼び出しは全てウォレット経由。

use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use rx_crypto::Signature;
use rx_types::PrescriptionFields;

use crate::error::{ContractError, WalletError};
use crate::wallet::{TransactionReceipt, TransactionRequest, Wallet};

sol! {
    /// 署名付き処方NFTコントラクト
    interface IPrescription {
        function mintWithSignature(
            address recipient,
            string medication,
            string dosage,
            string instructions,
            bytes signature
        ) external returns (uint256 tokenId);

        function prescriptions(uint256 tokenId)
            external
            view
            returns (string medication, string dosage, string instructions);

        function tokenURI(uint256 tokenId) external view returns (string);

        event Prescribed(address indexed doctor, uint256 indexed tokenId);
    }
}

/// コントラクトに記録された処方。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnChainPrescription {
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
}

/// デプロイ済み処方コントラクトへのハンドル。
pub struct PrescriptionContract<'a> {
    address: Address,
    wallet: &'a dyn Wallet,
}

impl<'a> PrescriptionContract<'a> {
    pub fn new(address: Address, wallet: &'a dyn Wallet) -> Self {
        Self { address, wallet }
    }

    /// `mintWithSignature` のcalldataを構築する。
    pub fn encode_mint(
        recipient: Address,
        fields: &PrescriptionFields,
        signature: &Signature,
    ) -> Bytes {
        let call = IPrescription::mintWithSignatureCall {
            recipient,
            medication: fields.medication.clone(),
            dosage: fields.dosage.clone(),
            instructions: fields.instructions.clone(),
            signature: Bytes::from(signature.to_vec()),
        };
        Bytes::from(call.abi_encode())
    }

    /// `mintWithSignature(recipient, medication, dosage, instructions, signature)` を送信する。
    pub async fn mint_with_signature(
        &self,
        from: Address,
        recipient: Address,
        fields: &PrescriptionFields,
        signature: &Signature,
    ) -> Result<B256, WalletError> {
        let tx = TransactionRequest {
            from,
            to: self.address,
            data: Self::encode_mint(recipient, fields, signature),
        };
        self.wallet.send_transaction(&tx).await
    }

    /// レシートが得られるまでポーリングする。
    pub async fn wait_for_receipt(
        &self,
        tx_hash: B256,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TransactionReceipt, ContractError> {
        let poll = async {
            loop {
                if let Some(receipt) = self.wallet.transaction_receipt(tx_hash).await? {
                    return Ok::<_, ContractError>(receipt);
                }
                tracing::debug!(tx_hash = %tx_hash, "レシート未確定、再取得を待機");
                tokio::time::sleep(poll_interval).await;
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| ContractError::ReceiptTimeout(tx_hash))?
    }

    /// `prescriptions(tokenId)` を読み出す。
    pub async fn prescription(&self, token_id: U256) -> Result<OnChainPrescription, ContractError> {
        let data = IPrescription::prescriptionsCall { tokenId: token_id }.abi_encode();
        let output = self.wallet.call(self.address, Bytes::from(data)).await?;
        let decoded = IPrescription::prescriptionsCall::abi_decode_returns(&output, true)
            .map_err(|e| ContractError::Decode(format!("prescriptions: {e}")))?;
        Ok(OnChainPrescription {
            medication: decoded.medication,
            dosage: decoded.dosage,
            instructions: decoded.instructions,
        })
    }

    /// `tokenURI(tokenId)` を読み出す。
    pub async fn token_uri(&self, token_id: U256) -> Result<String, ContractError> {
        let data = IPrescription::tokenURICall { tokenId: token_id }.abi_encode();
        let output = self.wallet.call(self.address, Bytes::from(data)).await?;
        let decoded = IPrescription::tokenURICall::abi_decode_returns(&output, true)
            .map_err(|e| ContractError::Decode(format!("tokenURI: {e}")))?;
        Ok(decoded._0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_sol_types::SolEvent;

    fn fields() -> PrescriptionFields {
        PrescriptionFields {
            medication: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            instructions: "Take twice daily".to_string(),
        }
    }

    #[test]
    fn test_selectors() {
        assert_eq!(
            hex::encode(IPrescription::mintWithSignatureCall::SELECTOR),
            "c8a9757f"
        );
        assert_eq!(
            hex::encode(IPrescription::Prescribed::SIGNATURE_HASH),
            "cdde735337bc2d8fdd5b283ee426dd38c601c3f009a3785da5ce87374210da62"
        );
    }

    /// calldataはセレクタ + ABIエンコードで、デコードすると元の値に戻る
    #[test]
    fn test_encode_mint_calldata() {
        let recipient = Address::repeat_byte(0xab);
        let signature = Signature::from_slice(&[7u8; 65]).unwrap();
        let data = PrescriptionContract::encode_mint(recipient, &fields(), &signature);

        assert_eq!(&data[..4], IPrescription::mintWithSignatureCall::SELECTOR.as_slice());
        let call = IPrescription::mintWithSignatureCall::abi_decode(&data, true).unwrap();
        assert_eq!(call.recipient, recipient);
        assert_eq!(call.medication, "Ibuprofen");
        assert_eq!(call.dosage, "200mg");
        assert_eq!(call.instructions, "Take twice daily");
        assert_eq!(call.signature.as_ref(), signature.as_bytes().as_slice());
    }
}
