//! # 処方レシート
//!
//! ミント結果から表示用の `ReceiptView` を組み立てる。
//! レシート画面はクエリパラメータだけから再構成できる（オンチェーンの意味は持たない）。

use alloy_primitives::U256;
use chrono::{DateTime, TimeZone};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use rx_types::{PrescriptionDraft, PrescriptionFields, ReceiptQuery, ReceiptView};

/// レシートの日時表記（例: `3/7/2025, 2:05:09 PM`）
pub const DATE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

/// レシート画面のパス
pub const RECEIPT_PATH: &str = "/receipt";

pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(DATE_FORMAT).to_string()
}

/// ミント結果からレシートを組み立てる。
pub fn build_receipt<Tz: TimeZone>(
    token_id: Option<U256>,
    draft: &PrescriptionDraft,
    fields: &PrescriptionFields,
    issued_at: &DateTime<Tz>,
) -> ReceiptView
where
    Tz::Offset: std::fmt::Display,
{
    ReceiptView {
        token_id: token_id.map(|id| id.to_string()),
        patient_name: draft.patient_name.clone(),
        patient_id: draft.patient_id.clone(),
        medication: fields.medication.clone(),
        dosage: fields.dosage.clone(),
        instructions: fields.instructions.clone(),
        date: format_date(issued_at),
    }
}

/// レシート画面のクエリ文字列を生成する（先頭の `?` は含まない）。
pub fn receipt_query_string(receipt: &ReceiptView) -> String {
    let mut pairs: Vec<(&str, &str)> = Vec::with_capacity(7);
    if let Some(token_id) = &receipt.token_id {
        pairs.push(("tokenId", token_id));
    }
    pairs.extend([
        ("patientName", receipt.patient_name.as_str()),
        ("patientId", receipt.patient_id.as_str()),
        ("medication", receipt.medication.as_str()),
        ("dosage", receipt.dosage.as_str()),
        ("instructions", receipt.instructions.as_str()),
        ("date", receipt.date.as_str()),
    ]);

    pairs
        .iter()
        .map(|(key, value)| format!("{key}={}", utf8_percent_encode(value, NON_ALPHANUMERIC)))
        .collect::<Vec<_>>()
        .join("&")
}

/// レシート画面のURLを生成する。
pub fn receipt_url(base_url: &str, receipt: &ReceiptView) -> String {
    format!(
        "{}{RECEIPT_PATH}?{}",
        base_url.trim_end_matches('/'),
        receipt_query_string(receipt)
    )
}

/// クエリパラメータからレシートを再構成する。
///
/// 検証は行わない。欠けた項目は空文字、`date` が無ければ `now` を表示する。
pub fn receipt_from_query<Tz: TimeZone>(query: ReceiptQuery, now: &DateTime<Tz>) -> ReceiptView
where
    Tz::Offset: std::fmt::Display,
{
    ReceiptView {
        token_id: query.token_id,
        patient_name: query.patient_name.unwrap_or_default(),
        patient_id: query.patient_id.unwrap_or_default(),
        medication: query.medication.unwrap_or_default(),
        dosage: query.dosage.unwrap_or_default(),
        instructions: query.instructions.unwrap_or_default(),
        date: query.date.unwrap_or_else(|| format_date(now)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use percent_encoding::percent_decode_str;

    fn issued_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 7, 14, 5, 9).unwrap()
    }

    fn draft() -> PrescriptionDraft {
        PrescriptionDraft {
            patient_name: "Jane Smith".to_string(),
            patient_id: "2".to_string(),
            medication: "Ibuprofen".to_string(),
            amount_mg: 200,
            notes: "Take twice daily".to_string(),
        }
    }

    fn fields() -> PrescriptionFields {
        PrescriptionFields {
            medication: "Ibuprofen".to_string(),
            dosage: "200mg".to_string(),
            instructions: "Take twice daily".to_string(),
        }
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&issued_at()), "3/7/2025, 2:05:09 PM");
    }

    #[test]
    fn test_build_receipt() {
        let receipt = build_receipt(Some(U256::from(12u64)), &draft(), &fields(), &issued_at());
        assert_eq!(receipt.token_id.as_deref(), Some("12"));
        assert_eq!(receipt.patient_name, "Jane Smith");
        assert_eq!(receipt.dosage, "200mg");
        assert_eq!(receipt.date, "3/7/2025, 2:05:09 PM");
    }

    /// URLに埋め込んだ値はデコードすると元の値に戻る
    #[test]
    fn test_receipt_url_encoding() {
        let receipt = build_receipt(None, &draft(), &fields(), &issued_at());
        let url = receipt_url("http://localhost:3000/", &receipt);
        assert!(url.starts_with("http://localhost:3000/receipt?patientName=Jane%20Smith&"));
        assert!(!url.contains("tokenId"));

        let query = url.split_once('?').unwrap().1;
        let date = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("date="))
            .unwrap();
        assert_eq!(
            percent_decode_str(date).decode_utf8().unwrap(),
            "3/7/2025, 2:05:09 PM"
        );
    }

    #[test]
    fn test_receipt_from_query_defaults() {
        let receipt = receipt_from_query(
            ReceiptQuery {
                token_id: Some("5".to_string()),
                medication: Some("Amoxicillin".to_string()),
                ..ReceiptQuery::default()
            },
            &issued_at(),
        );
        assert_eq!(receipt.token_id.as_deref(), Some("5"));
        assert_eq!(receipt.medication, "Amoxicillin");
        assert_eq!(receipt.patient_name, "");
        assert_eq!(receipt.date, "3/7/2025, 2:05:09 PM");
    }
}
