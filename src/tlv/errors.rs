use std::error::Error;
use std::fmt::{self, Display};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    Alphabetic,
    Alphanumeric,
    AlphanumericSpecial,
}

/// Fails closed on any malformed BER-TLV input. Never panics; every read is
/// bounds-checked against the remaining input (spec §4.1).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    Truncated(usize),
    InvalidTag,
    InvalidLength(usize, u8),
    LengthExceedsData {
        tag: u32,
        declared: usize,
        available: usize,
    },
    TooManyTags(usize),
    UnsupportedChar(StringKind, u8),
    NoSuchMember(u32),
    WrongType(u32, &'static str),
    NoPathRequested,
    BadBcd(u8),
    AflInvalidLength,
    AflInvalidSfi(u8),
    AflInvalidRecordRange { first: u8, last: u8 },
    AflSignedRecordsExceedRange { signed: u8, range: u8 },
    InvalidPan(&'static str),
    InvalidExpiry(&'static str),
}

impl Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Truncated(offset) => write!(f, "truncated input at offset {offset}"),
            DecodeError::InvalidTag => write!(f, "invalid tag encoding"),
            DecodeError::InvalidLength(offset, byte) => {
                write!(f, "invalid length byte 0x{byte:02x} at offset {offset}")
            }
            DecodeError::LengthExceedsData {
                tag,
                declared,
                available,
            } => write!(
                f,
                "tag 0x{tag:x} declares length {declared} but only {available} bytes remain"
            ),
            DecodeError::TooManyTags(n) => write!(f, "too many tags ({n}), exceeds DoS bound"),
            DecodeError::UnsupportedChar(kind, ch) => {
                write!(f, "unsupported character 0x{ch:02x} in {kind:?} string")
            }
            DecodeError::NoSuchMember(tag) => write!(f, "no member with tag 0x{tag:x}"),
            DecodeError::WrongType(tag, wanted) => {
                write!(f, "tag 0x{tag:x} is not {wanted}")
            }
            DecodeError::NoPathRequested => write!(f, "no path requested"),
            DecodeError::BadBcd(b) => write!(f, "bad BCD nibble in byte 0x{b:02x}"),
            DecodeError::AflInvalidLength => write!(f, "AFL length is not a multiple of 4"),
            DecodeError::AflInvalidSfi(sfi) => write!(f, "invalid SFI {sfi} (must be 1..=30)"),
            DecodeError::AflInvalidRecordRange { first, last } => {
                write!(f, "invalid record range {first}..={last}")
            }
            DecodeError::AflSignedRecordsExceedRange { signed, range } => write!(
                f,
                "signed_records {signed} exceeds record range of {range}"
            ),
            DecodeError::InvalidPan(reason) => write!(f, "invalid PAN: {reason}"),
            DecodeError::InvalidExpiry(reason) => write!(f, "invalid expiry: {reason}"),
        }
    }
}

impl Error for DecodeError {}

/// The outcome of a pure structural validation pass (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructureValidation {
    Valid(usize),
    Truncated(usize),
    InvalidTag,
    InvalidLength(usize, u8),
    LengthExceedsData {
        tag: u32,
        declared: usize,
        available: usize,
    },
    TooManyTags(usize),
}
