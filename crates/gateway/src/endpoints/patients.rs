//! # GET /patients

use axum::Json;
use rx_types::Patient;

/// GET /patients: 患者一覧。
pub async fn handle_list_patients() -> Json<Vec<Patient>> {
    Json(rx_core::patients::roster())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_patients() {
        let Json(patients) = handle_list_patients().await;
        let names: Vec<&str> = patients.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["John Doe", "Jane Smith", "Bob Johnson"]);
    }
}
