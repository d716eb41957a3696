//! Cardholder Verification Method Results (tag 9F34), 3 bytes: method code,
//! condition, result (spec §4.7 step 7).

use super::errors::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvmResults {
    pub method_code: u8,
    pub condition: u8,
    pub result: u8,
}

impl CvmResults {
    pub const RESULT_UNKNOWN: u8 = 0x00;
    pub const RESULT_FAILED: u8 = 0x01;
    pub const RESULT_SUCCESSFUL: u8 = 0x02;

    pub fn to_bytes(self) -> [u8; 3] {
        [self.method_code, self.condition, self.result]
    }

    pub fn parse(raw: &[u8]) -> Result<Self, DecodeError> {
        if raw.len() != 3 {
            return Err(DecodeError::WrongType(0x9f34, "3-byte CVM Results"));
        }
        Ok(CvmResults {
            method_code: raw[0],
            condition: raw[1],
            result: raw[2],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_bytes() {
        let cvm = CvmResults {
            method_code: 0x02,
            condition: 0x00,
            result: CvmResults::RESULT_SUCCESSFUL,
        };
        let bytes = cvm.to_bytes();
        assert_eq!(CvmResults::parse(&bytes).unwrap(), cvm);
    }
}
