//! American Express ExpressPay kernel divergences (spec §4.7): the
//! mandatory Enhanced Contactless Reader Capabilities qualifier and the
//! Magnetic Stripe Data (MSD) path that reads Track 2 straight out of the
//! GPO response instead of via READ RECORD. RID `A000000025`.

pub const RID: [u8; 5] = [0xa0, 0x00, 0x00, 0x00, 0x25];

pub const TAG_ENHANCED_CONTACTLESS_READER_CAPABILITIES: u32 = 0x9f6e;
pub const TAG_TRACK2_EQUIVALENT_DATA: u32 = 0x57;

mod ecrc_bits {
    pub const CONTACT_CHIP_SUPPORTED: u8 = 0x80;
    pub const CONTACTLESS_MAGSTRIPE_SUPPORTED: u8 = 0x40;
    pub const CONTACTLESS_EMV_SUPPORTED: u8 = 0x20;
    pub const ONLINE_PIN_SUPPORTED: u8 = 0x08;
    pub const SIGNATURE_SUPPORTED: u8 = 0x04;
    pub const ODA_FOR_ONLINE_AUTHORIZATIONS_SUPPORTED: u8 = 0x01;
}

/// Builds the 4-byte Enhanced Contactless Reader Capabilities; ExpressPay
/// requires this qualifier on every GPO, unlike the other kernels where
/// it is optional.
pub fn build_enhanced_contactless_reader_capabilities(
    contact_chip_supported: bool,
    contactless_magstripe_supported: bool,
    contactless_emv_supported: bool,
    online_pin_supported: bool,
    signature_supported: bool,
    oda_for_online_authorizations_supported: bool,
) -> [u8; 4] {
    let mut byte1 = 0u8;
    if contact_chip_supported {
        byte1 |= ecrc_bits::CONTACT_CHIP_SUPPORTED;
    }
    if contactless_magstripe_supported {
        byte1 |= ecrc_bits::CONTACTLESS_MAGSTRIPE_SUPPORTED;
    }
    if contactless_emv_supported {
        byte1 |= ecrc_bits::CONTACTLESS_EMV_SUPPORTED;
    }
    if online_pin_supported {
        byte1 |= ecrc_bits::ONLINE_PIN_SUPPORTED;
    }
    if signature_supported {
        byte1 |= ecrc_bits::SIGNATURE_SUPPORTED;
    }
    if oda_for_online_authorizations_supported {
        byte1 |= ecrc_bits::ODA_FOR_ONLINE_AUTHORIZATIONS_SUPPORTED;
    }
    [byte1, 0, 0, 0]
}

/// Extracts Track 2 equivalent data from the GPO response for the
/// Magnetic Stripe Data path, used when the card signals MSD rather than
/// full qVSDC-equivalent processing in its AIP.
pub fn track2_from_gpo(gpo_track2: Option<&[u8]>) -> Option<Vec<u8>> {
    gpo_track2.map(|t| t.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ecrc_combines_requested_bits() {
        let ecrc = build_enhanced_contactless_reader_capabilities(false, true, true, true, false, false);
        assert_eq!(
            ecrc[0],
            ecrc_bits::CONTACTLESS_MAGSTRIPE_SUPPORTED
                | ecrc_bits::CONTACTLESS_EMV_SUPPORTED
                | ecrc_bits::ONLINE_PIN_SUPPORTED
        );
        assert_eq!(&ecrc[1..], &[0, 0, 0]);
    }

    #[test]
    fn msd_track2_passthrough() {
        let track2 = [0x12, 0x34];
        assert_eq!(track2_from_gpo(Some(&track2)), Some(vec![0x12, 0x34]));
        assert_eq!(track2_from_gpo(None), None);
    }
}
