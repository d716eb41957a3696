//! The Authorization Request record (spec §6): every field the kernel
//! marshals for the online authorization dialogue collaborator when a
//! transaction needs an ARQC decided online.

#[derive(Debug, Clone, Default)]
pub struct AuthorizationRequest {
    pub pan: String,
    pub track2_equivalent: Vec<u8>,
    pub expiry_yymm: [u8; 2],
    pub pan_sequence_number: Option<u8>,
    pub application_cryptogram: Vec<u8>,
    pub cid: u8,
    pub atc: [u8; 2],
    pub issuer_application_data: Vec<u8>,
    pub tvr: [u8; 5],
    pub cvm_results: [u8; 3],
    pub amount_authorized: [u8; 6],
    pub amount_other: [u8; 6],
    pub terminal_country_code: [u8; 2],
    pub transaction_currency_code: [u8; 2],
    pub transaction_date: [u8; 3],
    pub transaction_time: [u8; 3],
    pub transaction_type: u8,
    pub unpredictable_number: [u8; 4],
    pub aip: [u8; 2],
    pub aid: Vec<u8>,
    pub cardholder_name: Option<String>,
    pub form_factor_indicator: Option<[u8; 4]>,
    pub enhanced_contactless_reader_capabilities: Option<[u8; 4]>,
    pub raw_cryptogram_data: Vec<u8>,
}
