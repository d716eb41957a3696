use std::error::Error;
use std::fmt::{self, Display};

/// Grounded on the teacher's `crypto/errors.rs` `VerifyError`, extended with
/// the certificate-recovery failure reasons spec §4.4 names explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    CaKeyNotFound { rid: [u8; 5], index: u8 },
    CaKeyExpired { rid: [u8; 5], index: u8 },
    CaKeyRevoked { rid: [u8; 5], index: u8 },
    IssuerKeyRecoveryFailed,
    IccKeyRecoveryFailed,
    HashMismatch,
    InvalidIssuerCertFormat,
    InvalidIccCertFormat,
    InvalidSdadFormat,
    CertificateExpired,
    CertificateTooLarge(usize),
    CertificateLengthMismatch { key_len: usize, cert_len: usize },
    UnmatchedPan,
    MissingTag(u32),
}

impl Display for VerifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VerifyError::CaKeyNotFound { rid, index } => write!(
                f,
                "no CA key for RID {} index {:#02x}",
                hex::encode(rid),
                index
            ),
            VerifyError::CaKeyExpired { rid, index } => write!(
                f,
                "CA key for RID {} index {:#02x} is expired",
                hex::encode(rid),
                index
            ),
            VerifyError::CaKeyRevoked { rid, index } => write!(
                f,
                "CA key for RID {} index {:#02x} is revoked",
                hex::encode(rid),
                index
            ),
            VerifyError::IssuerKeyRecoveryFailed => write!(f, "issuer key recovery failed"),
            VerifyError::IccKeyRecoveryFailed => write!(f, "ICC key recovery failed"),
            VerifyError::HashMismatch => write!(f, "recovered data hash mismatch"),
            VerifyError::InvalidIssuerCertFormat => write!(f, "invalid issuer certificate format"),
            VerifyError::InvalidIccCertFormat => write!(f, "invalid ICC certificate format"),
            VerifyError::InvalidSdadFormat => write!(f, "invalid signed dynamic data format"),
            VerifyError::CertificateExpired => write!(f, "certificate expired"),
            VerifyError::CertificateTooLarge(len) => write!(f, "certificate too large ({len} bytes)"),
            VerifyError::CertificateLengthMismatch { key_len, cert_len } => write!(
                f,
                "key is {key_len} bytes but certificate is {cert_len} bytes"
            ),
            VerifyError::UnmatchedPan => write!(f, "PAN in certificate does not match card PAN"),
            VerifyError::MissingTag(tag) => write!(f, "missing mandatory tag {tag:#x}"),
        }
    }
}

impl Error for VerifyError {}
