//! # 患者名簿
//!
//! ダッシュボードに表示する固定の患者一覧。永続化は行わない。

use rx_types::Patient;

fn patient(id: &str, name: &str, dob: &str, address: &str) -> Patient {
    Patient {
        id: id.to_string(),
        name: name.to_string(),
        dob: dob.to_string(),
        address: address.to_string(),
    }
}

/// 患者一覧を返す。
pub fn roster() -> Vec<Patient> {
    vec![
        patient("1", "John Doe", "01/15/1985", "123 Main St, City, State 12345"),
        patient("2", "Jane Smith", "03/22/1990", "456 Oak Ave, City, State 12345"),
        patient("3", "Bob Johnson", "07/10/1978", "789 Pine Rd, City, State 12345"),
    ]
}

/// IDで患者を検索する。
pub fn find(id: &str) -> Option<Patient> {
    roster().into_iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster() {
        let patients = roster();
        assert_eq!(patients.len(), 3);
        assert_eq!(patients[0].name, "John Doe");
        assert_eq!(patients[2].dob, "07/10/1978");
    }

    #[test]
    fn test_find() {
        assert_eq!(find("2").unwrap().name, "Jane Smith");
        assert!(find("4").is_none());
        assert!(find("").is_none());
    }
}
