//! Cryptogram Information Data (tag 9F27): bits 8-7 of the single byte
//! returned with GENERATE AC name the cryptogram type (spec §4.7 step 10).

use super::errors::DecodeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptogramType {
    Aac,
    Tc,
    Arqc,
    Aar,
}

pub fn decode_cid(raw: &[u8]) -> Result<(CryptogramType, u8), DecodeError> {
    let &byte = raw.first().ok_or(DecodeError::WrongType(0x9f27, "1-byte CID"))?;
    let cryptogram_type = match byte >> 6 {
        0b00 => CryptogramType::Aac,
        0b01 => CryptogramType::Tc,
        0b10 => CryptogramType::Arqc,
        0b11 => CryptogramType::Aar,
        _ => unreachable!(),
    };
    Ok((cryptogram_type, byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_all_four_types() {
        assert_eq!(decode_cid(&[0x00]).unwrap().0, CryptogramType::Aac);
        assert_eq!(decode_cid(&[0x40]).unwrap().0, CryptogramType::Tc);
        assert_eq!(decode_cid(&[0x80]).unwrap().0, CryptogramType::Arqc);
        assert_eq!(decode_cid(&[0xc0]).unwrap().0, CryptogramType::Aar);
    }
}
