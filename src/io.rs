//! External collaborator interfaces (spec §6).
//!
//! The card transceiver, the online authorisation host round trip, and the
//! DUKPT injection surface are all implemented elsewhere (NFC driver,
//! merchant host HTTP client, HSM). The engine only depends on the traits
//! here, grounded on the teacher's `exchange.rs` `ADPUCommand`/`exchange`
//! pair, generalised from a direct `pcsc::Card` dependency to a trait so the
//! kernel state machine can be driven by a mock in tests.

use std::fmt;

use crate::error::EngineError;

/// A single ISO/IEC 7816-4 command APDU.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub struct CommandApdu<'a> {
    pub cla: u8,
    pub ins: u8,
    pub p1: u8,
    pub p2: u8,
    pub data: &'a [u8],
    /// Expected response length, 0..=65536.
    pub ne: u32,
}

impl<'a> CommandApdu<'a> {
    pub fn encode(&self) -> Option<Box<[u8]>> {
        let mut raw = Vec::with_capacity(10 + self.data.len());
        raw.extend_from_slice(&[self.cla, self.ins, self.p1, self.p2]);

        let nc = self.data.len();
        if nc == 0 {
            // Lc absent.
        } else if nc <= 255 {
            raw.push(nc as u8);
        } else if nc <= 65535 {
            raw.push(0u8);
            raw.extend_from_slice(&(nc as u16).to_be_bytes());
        } else {
            return None;
        }
        raw.extend_from_slice(self.data);

        if self.ne == 0 {
            // Le absent.
        } else if self.ne <= 256 {
            raw.push(self.ne as u8);
        } else if self.ne <= 65536 {
            if nc <= 255 {
                raw.push(0u8);
            }
            raw.extend_from_slice(&(self.ne as u16).to_be_bytes());
        }

        Some(raw.into_boxed_slice())
    }

    pub fn select(aid: &'a [u8]) -> Self {
        CommandApdu {
            cla: 0x00,
            ins: 0xa4,
            p1: 0x04,
            p2: 0x00,
            data: aid,
            ne: 0x100,
        }
    }

    pub fn get_processing_options(pdol_data: &'a [u8]) -> Self {
        CommandApdu {
            cla: 0x80,
            ins: 0xa8,
            p1: 0x00,
            p2: 0x00,
            data: pdol_data,
            ne: 0x100,
        }
    }

    pub fn read_record(sfi: u8, record: u8) -> CommandApdu<'static> {
        CommandApdu {
            cla: 0x00,
            ins: 0xb2,
            p1: record,
            p2: (sfi << 3) | 0x04,
            data: &[],
            ne: 0x100,
        }
    }

    pub fn generate_ac(p1: u8, cdol_data: &'a [u8]) -> Self {
        CommandApdu {
            cla: 0x80,
            ins: 0xae,
            p1,
            p2: 0x00,
            data: cdol_data,
            ne: 0x100,
        }
    }

    pub fn internal_authenticate(ddol_data: &'a [u8]) -> Self {
        CommandApdu {
            cla: 0x00,
            ins: 0x88,
            p1: 0x00,
            p2: 0x00,
            data: ddol_data,
            ne: 0x100,
        }
    }
}

/// A response APDU: data plus the two status-word bytes, already folded into
/// one `u16` (`SW1 << 8 | SW2`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseApdu {
    pub data: Vec<u8>,
    pub sw: u16,
}

impl ResponseApdu {
    pub fn is_success(&self) -> bool {
        self.sw == 0x9000
    }
}

impl fmt::Display for ResponseApdu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bytes, sw={:04x}", self.data.len(), self.sw)
    }
}

/// Drives one ISO/IEC 14443 card transceiver. Implemented externally (NFC
/// driver on Android, PC/SC in the CLI demo); the engine never assumes a
/// particular transport.
pub trait CardTransceiver {
    fn transceive(&mut self, command: &CommandApdu) -> Result<ResponseApdu, EngineError>;
}

/// Runs the command through GET RESPONSE (`61xx`) and `6Cxx` re-try
/// continuation handling, the way the teacher's `exchange()` does for a raw
/// `pcsc::Card`. Transports that already fold these into one call (most NFC
/// stacks) can implement `CardTransceiver::transceive` directly and ignore
/// this helper.
pub fn exchange_with_continuation(
    transceiver: &mut dyn CardTransceiver,
    command: &CommandApdu,
) -> Result<ResponseApdu, EngineError> {
    let mut response = transceiver.transceive(command)?;

    if response.sw >> 8 == 0x6c {
        let mut retry = *command;
        retry.ne = (response.sw & 0xff) as u32;
        response = transceiver.transceive(&retry)?;
    }

    while response.sw >> 8 == 0x61 {
        let remaining = (response.sw & 0xff) as u8;
        let get_response = CommandApdu {
            cla: 0x00,
            ins: 0xc0,
            p1: 0x00,
            p2: 0x00,
            data: &[],
            ne: remaining as u32,
        };
        let mut accumulated = response.data;
        let next = transceiver.transceive(&get_response)?;
        accumulated.extend_from_slice(&next.data);
        response = ResponseApdu {
            data: accumulated,
            sw: next.sw,
        };
    }

    Ok(response)
}

/// The Online Authorization Response collaborator returns (spec §6).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnlineAuthorizationResponse {
    pub approved: bool,
    pub authorization_code: Option<[u8; 6]>,
    pub arc: [u8; 2],
    pub arpc: Vec<u8>,
    pub scripts_pre_ac: Vec<Vec<u8>>,
    pub scripts_post_ac: Vec<Vec<u8>>,
    pub issuer_auth_data: Option<Vec<u8>>,
}

/// The merchant host HTTP client, an external collaborator (spec §1, §6).
pub trait OnlineAuthorizer {
    fn authorize(
        &mut self,
        request: &crate::kernel::auth_request::AuthorizationRequest,
    ) -> Result<OnlineAuthorizationResponse, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_encodes_lc_and_le() {
        let aid = [0xa0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10];
        let cmd = CommandApdu::select(&aid);
        let encoded = cmd.encode().unwrap();
        assert_eq!(&encoded[..4], &[0x00, 0xa4, 0x04, 0x00]);
        assert_eq!(encoded[4], aid.len() as u8);
        assert_eq!(&encoded[5..5 + aid.len()], &aid);
        assert_eq!(encoded[encoded.len() - 1], 0x00); // Le = 256
    }

    #[test]
    fn empty_data_omits_lc() {
        let cmd = CommandApdu::read_record(1, 1);
        let encoded = cmd.encode().unwrap();
        assert_eq!(encoded.len(), 5); // header + Le only
    }
}
