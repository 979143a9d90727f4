//! # GET /receipt
//!
//! クエリパラメータからレシートを再構成する。読み取り専用で検証は行わない。

use axum::extract::Query;
use axum::Json;
use chrono::Local;
use rx_core::receipt::receipt_from_query;
use rx_types::{ReceiptQuery, ReceiptView};

pub async fn handle_receipt(Query(query): Query<ReceiptQuery>) -> Json<ReceiptView> {
    Json(receipt_from_query(query, &Local::now()))
}
