//! # secp256k1 署名
//!
//! ウォレットが返す65バイト署名（r ++ s ++ v）の型と、
//! 個人メッセージ署名規約による署名・署名者復元。

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{keccak256, Address};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

use crate::{personal_message_hash, CryptoError};

/// 署名のバイト長（r: 32, s: 32, v: 1）
pub const SIGNATURE_LENGTH: usize = 65;

/// ウォレットが生成した65バイト署名。
///
/// バイト列はウォレットの出力をそのまま保持し、v値の正規化は行わない。
/// コントラクトに渡す値と同一である必要がある。
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LENGTH]);

impl Signature {
    /// バイト列から構築する。65バイト以外はエラー。
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let arr: [u8; SIGNATURE_LENGTH] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))?;
        Ok(Self(arr))
    }

    /// r, s, vから構築する。
    pub fn from_parts(r: &[u8; 32], s: &[u8; 32], v: u8) -> Self {
        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..32].copy_from_slice(r);
        bytes[32..64].copy_from_slice(s);
        bytes[64] = v;
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// v値（27/28 もしくは 0/1）
    pub fn v(&self) -> u8 {
        self.0[64]
    }

    /// v値から復元IDを得る。27/28 と 0/1 の両方を受け付ける。
    fn recovery_id(&self) -> Result<RecoveryId, CryptoError> {
        let v = self.v();
        let parity = match v {
            0 | 1 => v,
            27 | 28 => v - 27,
            _ => return Err(CryptoError::InvalidRecoveryId(v)),
        };
        RecoveryId::from_byte(parity).ok_or(CryptoError::InvalidRecoveryId(v))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl FromStr for Signature {
    type Err = CryptoError;

    /// `0x`付き・なしの16進数文字列をパースする。
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl serde::Serialize for Signature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> serde::Deserialize<'de> for Signature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// 16進数文字列（`0x`任意）からsecp256k1秘密鍵を構築する。
pub fn signing_key_from_hex(key_hex: &str) -> Result<SigningKey, CryptoError> {
    let stripped = key_hex.trim().strip_prefix("0x").unwrap_or(key_hex.trim());
    let bytes = hex::decode(stripped).map_err(|e| CryptoError::InvalidHex(e.to_string()))?;
    SigningKey::from_slice(&bytes).map_err(|_| CryptoError::InvalidPrivateKey)
}

/// 公開鍵からアカウントアドレスを導出する。
/// 非圧縮公開鍵（先頭0x04を除く64バイト）のKeccak-256の下位20バイト。
pub fn address_of(verifying_key: &VerifyingKey) -> Address {
    let point = verifying_key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}

/// 個人メッセージ署名規約でメッセージに署名する（ウォレット側の処理）。
///
/// プレフィックス付与 → Keccak-256 → 復元可能ECDSA。v = 27 + 復元ID。
pub fn sign_personal_message(
    signing_key: &SigningKey,
    message: &[u8],
) -> Result<Signature, CryptoError> {
    let hash = personal_message_hash(message);
    let (signature, recovery_id) = signing_key
        .sign_prehash_recoverable(hash.as_slice())
        .map_err(|_| CryptoError::SigningFailed)?;

    let rs = signature.to_bytes();
    let mut r = [0u8; 32];
    let mut s = [0u8; 32];
    r.copy_from_slice(&rs[..32]);
    s.copy_from_slice(&rs[32..]);
    Ok(Signature::from_parts(&r, &s, 27 + recovery_id.to_byte()))
}

/// 個人メッセージ署名から署名者アドレスを復元する（コントラクト側の`ecrecover`相当）。
pub fn recover_personal_signer(
    message: &[u8],
    signature: &Signature,
) -> Result<Address, CryptoError> {
    let hash = personal_message_hash(message);
    let mut recovery_id = signature.recovery_id()?;
    let mut ecdsa = EcdsaSignature::from_slice(&signature.as_bytes()[..64])
        .map_err(|_| CryptoError::MalformedSignature)?;

    // high-s署名は low-s に正規化し、y座標のパリティを反転させる
    if let Some(normalized) = ecdsa.normalize_s() {
        ecdsa = normalized;
        recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
    }

    let verifying_key = VerifyingKey::recover_from_prehash(hash.as_slice(), &ecdsa, recovery_id)
        .map_err(|_| CryptoError::RecoveryFailed)?;
    Ok(address_of(&verifying_key))
}
