//! Human-readable names for known EMV tags, used only for logging/Display —
//! grounded on the teacher's `tlv/elements.rs` macro-built table, trimmed to
//! name-only since semantic decoding now happens per data element (PAN,
//! expiry, AFL, DOL, ...) rather than through one big decoder dispatch.

use std::collections::HashMap;

use lazy_static::lazy_static;

macro_rules! tag_names {
    [$($tag:expr => $name:expr,)*] => {
        HashMap::from([$(($tag as u32, $name),)*])
    };
}

lazy_static! {
    pub static ref TAG_NAMES: HashMap<u32, &'static str> = tag_names![
        0x42 => "Issuer Identification Number (IIN)",
        0x4f => "Application Dedicated File (ADF) Name",
        0x50 => "Application Label",
        0x57 => "Track 2 Equivalent Data",
        0x5a => "Application Primary Account Number (PAN)",
        0x61 => "Application Template",
        0x6f => "File Control Information (FCI) Template",
        0x70 => "READ RECORD Response Message Template",
        0x71 => "Issuer Script Template 1",
        0x72 => "Issuer Script Template 2",
        0x73 => "Directory Discretionary Template",
        0x77 => "Response Message Template Format 2",
        0x80 => "Response Message Template Format 1",
        0x81 => "Amount, Authorised (Binary)",
        0x82 => "Application Interchange Profile",
        0x83 => "Command Template",
        0x84 => "Dedicated File (DF) Name",
        0x86 => "Issuer Script Command",
        0x87 => "Application Priority Indicator",
        0x88 => "Short File Identifier (SFI)",
        0x89 => "Authorisation Code",
        0x8a => "Authorisation Response Code",
        0x8c => "Card Risk Management Data Object List 1 (CDOL1)",
        0x8d => "Card Risk Management Data Object List 2 (CDOL2)",
        0x8e => "Cardholder Verification Method (CVM) List",
        0x8f => "Certification Authority Public Key Index",
        0x90 => "Issuer Public Key Certificate",
        0x91 => "Issuer Authentication Data",
        0x92 => "Issuer Public Key Remainder",
        0x93 => "Signed Static Application Data",
        0x94 => "Application File Locator (AFL)",
        0x95 => "Terminal Verification Results",
        0x97 => "Transaction Certificate Data Object List (TDOL)",
        0x98 => "Transaction Certificate (TC) Hash Value",
        0x9a => "Transaction Date",
        0x9b => "Transaction Status Information",
        0x9c => "Transaction Type",
        0x9d => "Directory Definition File (DDF) Name",
        0xa5 => "FCI Proprietary Template",
        0xbf0c => "FCI Issuer Discretionary Data",
        0x5f20 => "Cardholder Name",
        0x5f24 => "Application Expiration Date",
        0x5f25 => "Application Effective Date",
        0x5f28 => "Issuer Country Code",
        0x5f2a => "Transaction Currency Code",
        0x5f2d => "Language Preference",
        0x5f30 => "Service Code",
        0x5f34 => "Application PAN Sequence Number",
        0x9f01 => "Acquirer Identifier",
        0x9f02 => "Amount, Authorised (Numeric)",
        0x9f03 => "Amount, Other (Numeric)",
        0x9f06 => "Application Identifier (AID) - terminal",
        0x9f07 => "Application Usage Control",
        0x9f08 => "Application Version Number",
        0x9f09 => "Application Version Number (terminal)",
        0x9f0d => "Issuer Action Code - Default",
        0x9f0e => "Issuer Action Code - Denial",
        0x9f0f => "Issuer Action Code - Online",
        0x9f10 => "Issuer Application Data",
        0x9f1a => "Terminal Country Code",
        0x9f1e => "Interface Device (IFD) Serial Number",
        0x9f21 => "Transaction Time",
        0x9f26 => "Application Cryptogram",
        0x9f27 => "Cryptogram Information Data",
        0x9f32 => "Issuer Public Key Exponent",
        0x9f33 => "Terminal Capabilities",
        0x9f34 => "Cardholder Verification Method (CVM) Results",
        0x9f35 => "Terminal Type",
        0x9f36 => "Application Transaction Counter (ATC)",
        0x9f37 => "Unpredictable Number",
        0x9f38 => "Processing Options Data Object List (PDOL)",
        0x9f40 => "Additional Terminal Capabilities",
        0x9f45 => "Data Authentication Code",
        0x9f46 => "ICC Public Key Certificate",
        0x9f47 => "ICC Public Key Exponent",
        0x9f48 => "ICC Public Key Remainder",
        0x9f49 => "Dynamic Data Authentication Data Object List (DDOL)",
        0x9f4a => "Static Data Authentication Tag List",
        0x9f4b => "Signed Dynamic Application Data",
        0x9f4c => "ICC Dynamic Number",
        0x9f66 => "Terminal Transaction Qualifiers (TTQ)",
        0x9f6c => "Card Transaction Qualifiers (CTQ)",
        0x9f6e => "Enhanced Contactless Reader Capabilities",
    ];
}

pub fn tag_name(tag: u32) -> &'static str {
    TAG_NAMES.get(&tag).copied().unwrap_or("<unknown tag>")
}
