//! # Rx Dashboard 共有型定義
//!
//! ダッシュボード・CLI・署名コアで共有するデータ構造をRust構造体として提供する。
//!
//! ## エンコーディング規則
//! - アドレス、トランザクションハッシュ: `0x`付き16進数文字列
//! - TokenId: 10進数文字列（表示用）
//! - 受領証ルートのクエリ: camelCase

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// 処方データ
// ---------------------------------------------------------------------------

/// 医師が署名しコントラクトに記録する処方の3フィールド。
///
/// 署名対象のバイト列はこの値をそのまま使う。トリムや正規化は行わない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionFields {
    /// 薬剤名
    pub medication: String,
    /// 用量（例: "200mg"）
    pub dosage: String,
    /// 服用指示
    pub instructions: String,
}

impl PrescriptionFields {
    /// 空のフィールド名を返す。全て埋まっていれば空のVec。
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.medication.is_empty() {
            missing.push("medication");
        }
        if self.dosage.is_empty() {
            missing.push("dosage");
        }
        if self.instructions.is_empty() {
            missing.push("instructions");
        }
        missing
    }
}

// ---------------------------------------------------------------------------
// 患者
// ---------------------------------------------------------------------------

/// ダッシュボードの患者一覧に表示する患者。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    /// 患者ID
    pub id: String,
    /// 氏名
    pub name: String,
    /// 生年月日（MM/DD/YYYY）
    pub dob: String,
    /// 住所
    pub address: String,
}

// ---------------------------------------------------------------------------
// 処方フォーム
// ---------------------------------------------------------------------------

/// 処方モーダルの入力内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionDraft {
    /// 患者氏名
    pub patient_name: String,
    /// 患者ID
    pub patient_id: String,
    /// 薬剤名
    pub medication: String,
    /// 用量スライダーの値（mg）
    pub amount_mg: u32,
    /// 服用指示メモ
    pub notes: String,
}

/// PUT /form リクエスト。指定されたフィールドのみ更新する。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_mg: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// 受領証
// ---------------------------------------------------------------------------

/// ミント完了後に表示する受領証。表示専用でオンチェーン上の意味はない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    /// ミントされたTokenId（イベントから取得できなかった場合はNone）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    pub patient_name: String,
    pub patient_id: String,
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
    /// 発行日時（表示用文字列）
    pub date: String,
}

/// 受領証ルート（GET /receipt）のクエリパラメータ。全て任意。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dosage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

// ---------------------------------------------------------------------------
// API リクエスト/レスポンス
// ---------------------------------------------------------------------------

/// POST /form/submit レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintResponse {
    /// ミントされたTokenId（10進数）。イベント未検出時はNone。
    pub token_id: Option<String>,
    /// トランザクションハッシュ
    pub tx_hash: String,
    /// 署名者（=受取人）アドレス
    pub recipient: String,
    /// 受領証
    pub receipt: ReceiptView,
    /// 受領証ルートへのリンク（クエリ付き相対URL）
    pub receipt_url: String,
}

/// GET /prescriptions/{token_id} レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionView {
    /// TokenId（10進数）
    pub token_id: String,
    pub medication: String,
    pub dosage: String,
    pub instructions: String,
    /// コントラクトのtokenURIの生値
    pub token_uri: String,
    /// tokenURIから復元したメタデータ。パース不能ならNone。
    pub metadata: Option<serde_json::Value>,
}

/// POST /ipfs/pin レスポンス。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinResponse {
    /// ピン留めされたコンテンツのCID
    pub cid: String,
}
