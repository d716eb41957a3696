//! RSA certificate chain recovery, 3DES/Retail MAC, and EMV session-key
//! derivation (spec §4.4 Offline Data Authentication, §4.2 cryptograms).

pub mod ca_keys;
pub mod chain;
pub mod errors;
pub mod rsa;
pub mod session_keys;
pub mod tdes;

pub use ca_keys::{CaKeyStore, CaPublicKey};
pub use errors::VerifyError;
