//! # Gatewayエンドポイント

pub mod form;
pub mod ipfs;
pub mod mint;
pub mod patients;
pub mod prescriptions;
pub mod receipt;

pub use form::{handle_get_form, handle_reset_form, handle_select_patient, handle_update_form};
pub use ipfs::handle_pin;
pub use mint::{handle_mint_state, handle_submit};
pub use patients::handle_list_patients;
pub use prescriptions::handle_view_prescription;
pub use receipt::handle_receipt;
