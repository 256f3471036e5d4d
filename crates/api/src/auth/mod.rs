//! Token issuance and passcode verification.

pub mod jwt;
pub mod password;
