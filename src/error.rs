//! Crate-wide error aggregation.
//!
//! Every module returns its own tagged error enum (see `tlv::DecodeError`,
//! `crypto::VerifyError`, `dukpt::DukptError`, ...). `EngineError` is only
//! used at the boundary where the kernel state machine aggregates a
//! component failure into an `Outcome`, per spec §7 ("Propagation").

use std::error::Error;
use std::fmt::{self, Display};

use crate::crypto::VerifyError;
use crate::dukpt::DukptError;
use crate::tlv::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    Tlv(DecodeError),
    Crypto(VerifyError),
    Dukpt(DukptError),
    /// Communication error (I/O, timeout) talking to the card or issuer host.
    Communication(String),
    /// Card returned a status word indicating a security or state failure.
    CardStatus(u16),
    /// Mandatory tag or structure was missing or malformed in card data.
    Protocol(String),
    Internal(String),
}

impl Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Tlv(e) => write!(f, "TLV error: {e}"),
            EngineError::Crypto(e) => write!(f, "crypto error: {e}"),
            EngineError::Dukpt(e) => write!(f, "DUKPT error: {e}"),
            EngineError::Communication(msg) => write!(f, "communication error: {msg}"),
            EngineError::CardStatus(sw) => write!(f, "card returned status word {sw:04x}"),
            EngineError::Protocol(msg) => write!(f, "protocol error: {msg}"),
            EngineError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl Error for EngineError {}

impl From<DecodeError> for EngineError {
    fn from(e: DecodeError) -> Self {
        EngineError::Tlv(e)
    }
}

impl From<VerifyError> for EngineError {
    fn from(e: VerifyError) -> Self {
        EngineError::Crypto(e)
    }
}

impl From<DukptError> for EngineError {
    fn from(e: DukptError) -> Self {
        EngineError::Dukpt(e)
    }
}
