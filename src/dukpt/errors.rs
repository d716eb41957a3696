use std::error::Error;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DukptError {
    AlreadyInitialized,
    NotInitialized,
    Destroyed,
    InvalidIpekLength(usize),
    Exhausted,
}

impl Display for DukptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DukptError::AlreadyInitialized => write!(f, "DUKPT state already initialized"),
            DukptError::NotInitialized => write!(f, "DUKPT state not initialized"),
            DukptError::Destroyed => write!(f, "DUKPT state has been destroyed"),
            DukptError::InvalidIpekLength(len) => {
                write!(f, "IPEK must be 16 or 32 bytes, got {len}")
            }
            DukptError::Exhausted => write!(f, "DUKPT key space exhausted, re-injection required"),
        }
    }
}

impl Error for DukptError {}
