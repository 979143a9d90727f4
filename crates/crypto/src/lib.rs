//! # Rx Dashboard 暗号処理
//!
//! 処方コントラクトの署名検証と一致させる必要がある暗号処理を実装する。
//!
//! ## 署名対象の構築
//! | 段階 | 内容 |
//! |------|------|
//! | 正規エンコード | `recipient(20バイト) ++ utf8(medication) ++ utf8(dosage) ++ utf8(instructions)` |
//! | ダイジェスト | Keccak-256（NIST SHA3-256ではない） |
//! | 個人メッセージ署名 | `keccak256("\x19Ethereum Signed Message:\n32" ++ digest)` をsecp256k1で署名 |
//!
//! コントラクト側は `keccak256(abi.encodePacked(recipient, medication, dosage, instructions))`
//! に `toEthSignedMessageHash` を適用して `ecrecover` する。区切り文字の追加や
//! フィールドの並べ替えを行うと署名は検証に失敗する。

mod signature;

pub use alloy_primitives::{keccak256, Address, B256};
pub use k256::ecdsa::{SigningKey, VerifyingKey};
pub use signature::{
    address_of, recover_personal_signer, sign_personal_message, signing_key_from_hex, Signature,
    SIGNATURE_LENGTH,
};

use rx_types::PrescriptionFields;

/// 暗号処理のエラー型
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// 署名長が65バイトでない
    #[error("署名は65バイトである必要があります（実際: {0}バイト）")]
    InvalidSignatureLength(usize),
    /// 16進数デコードに失敗
    #[error("16進数のデコードに失敗しました: {0}")]
    InvalidHex(String),
    /// 復元ID（v値）が不正
    #[error("署名のv値が不正です: {0}")]
    InvalidRecoveryId(u8),
    /// r, sが有効なECDSA署名でない
    #[error("ECDSA署名の形式が不正です")]
    MalformedSignature,
    /// 公開鍵の復元に失敗
    #[error("署名者の復元に失敗しました")]
    RecoveryFailed,
    /// 秘密鍵が不正
    #[error("secp256k1秘密鍵が不正です")]
    InvalidPrivateKey,
    /// ECDSA署名処理に失敗
    #[error("ECDSA署名に失敗しました")]
    SigningFailed,
}

/// 個人メッセージ署名のプレフィックス。後ろにメッセージ長（10進数）が続く。
pub const PERSONAL_MESSAGE_PREFIX: &[u8] = b"\x19Ethereum Signed Message:\n";

/// 処方フィールドを正規バイト列に変換する。
///
/// `abi.encodePacked(address, string, string, string)` と同一。
/// 長さプレフィックス・区切り・パディングは一切入らない。
pub fn encode_prescription(recipient: &Address, fields: &PrescriptionFields) -> Vec<u8> {
    let mut encoded = Vec::with_capacity(
        20 + fields.medication.len()
            + fields.dosage.len()
            + fields.instructions.len(),
    );
    encoded.extend_from_slice(recipient.as_slice());
    encoded.extend_from_slice(fields.medication.as_bytes());
    encoded.extend_from_slice(fields.dosage.as_bytes());
    encoded.extend_from_slice(fields.instructions.as_bytes());
    encoded
}

/// 処方ダイジェスト（コントラクトの `messageHash`）を計算する。
pub fn prescription_digest(recipient: &Address, fields: &PrescriptionFields) -> B256 {
    keccak256(encode_prescription(recipient, fields))
}

/// 個人メッセージ署名規約のハッシュを計算する。
///
/// `keccak256("\x19Ethereum Signed Message:\n" ++ len ++ message)`。
/// 32バイトのダイジェストを渡した場合はコントラクトの `toEthSignedMessageHash` と一致する。
pub fn personal_message_hash(message: &[u8]) -> B256 {
    let length = message.len().to_string();
    let mut prefixed =
        Vec::with_capacity(PERSONAL_MESSAGE_PREFIX.len() + length.len() + message.len());
    prefixed.extend_from_slice(PERSONAL_MESSAGE_PREFIX);
    prefixed.extend_from_slice(length.as_bytes());
    prefixed.extend_from_slice(message);
    keccak256(prefixed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scenario_a() -> (Address, PrescriptionFields) {
        let recipient: Address = "0xABCDABCDABCDABCDABCDABCDABCDABCDABCDABCD".parse().unwrap();
        let fields = PrescriptionFields {
            medication: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            instructions: "Take twice daily".to_string(),
        };
        (recipient, fields)
    }

    /// 既知ベクタ: パック済みバイト列
    #[test]
    fn test_encode_known_vector() {
        let (recipient, fields) = scenario_a();
        let encoded = encode_prescription(&recipient, &fields);
        assert_eq!(
            hex::encode(&encoded),
            "abcdabcdabcdabcdabcdabcdabcdabcdabcdabcd\
             49627570726f66656e\
             3230306d67\
             54616b65207477696365206461696c79"
        );
    }

    /// 既知ベクタ: Keccak-256ダイジェストと個人メッセージハッシュ
    #[test]
    fn test_digest_known_vector() {
        let (recipient, fields) = scenario_a();
        let digest = prescription_digest(&recipient, &fields);
        assert_eq!(
            hex::encode(digest),
            "a016209301991d77ec3479bbc9fddeb7ceab4e24924de8b217c9d65986821902"
        );
        assert_eq!(
            hex::encode(personal_message_hash(digest.as_slice())),
            "d7a95ca82ca510a66e9051851d29f9dea1a019d42fb4e07a6a5879ca89f2eaea"
        );
    }

    /// Keccak-256であってSHA3-256ではないことを空入力で確認
    #[test]
    fn test_keccak_not_sha3() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    /// 出力長 = 20 + 各フィールドのUTF-8バイト長
    #[test]
    fn test_encoded_length() {
        let recipient = Address::repeat_byte(0x11);
        let cases = [
            ("", "", ""),
            ("Amoxicillin", "500mg", "Three times a day"),
            ("アセトアミノフェン", "300mg", "食後に服用"),
            ("a b", " ", "\t\n"),
        ];
        for (medication, dosage, instructions) in cases {
            let fields = PrescriptionFields {
                medication: medication.to_string(),
                dosage: dosage.to_string(),
                instructions: instructions.to_string(),
            };
            let encoded = encode_prescription(&recipient, &fields);
            assert_eq!(
                encoded.len(),
                20 + medication.len() + dosage.len() + instructions.len()
            );
        }
    }

    /// フィールド境界をずらすとバイト列は同じになる（パック形式の性質）が、
    /// 並べ替えや区切りの追加はダイジェストを変える
    #[test]
    fn test_digest_sensitivity() {
        let (recipient, fields) = scenario_a();
        let base = prescription_digest(&recipient, &fields);
        assert_eq!(base, prescription_digest(&recipient, &fields));

        let mut trailing_space = fields.clone();
        trailing_space.instructions.push(' ');
        assert_ne!(base, prescription_digest(&recipient, &trailing_space));

        let mut case_changed = fields.clone();
        case_changed.medication = "ibuprofen".to_string();
        assert_ne!(base, prescription_digest(&recipient, &case_changed));

        let swapped = PrescriptionFields {
            medication: fields.dosage.clone(),
            dosage: fields.medication.clone(),
            instructions: fields.instructions.clone(),
        };
        assert_ne!(base, prescription_digest(&recipient, &swapped));

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(recipient.as_slice());
        bytes[19] ^= 0x01;
        assert_ne!(base, prescription_digest(&Address::from(bytes), &fields));

        let shifted = PrescriptionFields {
            medication: "Ibuprofen200".to_string(),
            dosage: "mg".to_string(),
            instructions: fields.instructions.clone(),
        };
        assert_eq!(base, prescription_digest(&recipient, &shifted));
    }

    /// 1ビットの変更でダイジェストが変わる
    #[test]
    fn test_single_bit_flip_changes_digest() {
        let (recipient, fields) = scenario_a();
        let base = prescription_digest(&recipient, &fields);

        let mut flipped = fields.clone();
        // 'I'(0x49) → 'H'(0x48)
        flipped.medication.replace_range(0..1, "H");
        assert_ne!(base, prescription_digest(&recipient, &flipped));

        let mut flipped = fields.clone();
        // '2'(0x32) → '3'(0x33)
        flipped.dosage.replace_range(0..1, "3");
        assert_ne!(base, prescription_digest(&recipient, &flipped));

        let mut flipped = fields.clone();
        // 'y'(0x79) → 'x'(0x78)、末尾の1バイト
        let last = flipped.instructions.len() - 1;
        flipped.instructions.replace_range(last.., "x");
        assert_eq!(flipped.instructions, "Take twice dailx");
        assert_ne!(base, prescription_digest(&recipient, &flipped));

        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(recipient.as_slice());
        bytes[0] ^= 0x80;
        assert_ne!(base, prescription_digest(&Address::from(bytes), &fields));
    }

    /// alloyのEIP-191実装と一致することを確認
    #[test]
    fn test_personal_message_hash_matches_eip191() {
        let (recipient, fields) = scenario_a();
        let digest = prescription_digest(&recipient, &fields);
        assert_eq!(
            personal_message_hash(digest.as_slice()),
            alloy_primitives::eip191_hash_message(digest)
        );
        assert_eq!(
            personal_message_hash(b"hello world"),
            alloy_primitives::eip191_hash_message(b"hello world")
        );
    }
}
