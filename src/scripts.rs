//! Issuer script processing (spec §4.7 step 11): the issuer host can
//! return zero or more script commands alongside the online authorization
//! decision, split into a pre-GENERATE-AC batch (tag `71`) executed before
//! the second GENERATE AC, and a post-AC batch (tag `72`) executed
//! afterwards regardless of outcome.
//!
//! A pre-AC script failure sets the "script processing failed" TVR bit and
//! forces the second GENERATE AC to request an AAC rather than a TC — the
//! kernel driver in [`crate::kernel`] owns that decision. A post-AC script
//! failure never aborts anything: by the time it runs, the transaction
//! outcome is already fixed.

use crate::error::EngineError;
use crate::io::{CardTransceiver, CommandApdu};
use crate::tlv::node::parse;
use crate::tlv::TlvNodeValue;

const ISSUER_SCRIPT_COMMAND: u32 = 0x86;

/// Status words the terminal treats as "script command accepted"; per
/// EMV Book 3 Annex A, a bare `9000` and the proprietary "accepted with
/// warning" range both count as success for continuation purposes.
fn is_accepted(sw: u16) -> bool {
    sw == 0x9000 || sw >> 8 == 0x61
}

/// Parses one issuer script template (the raw bytes of tag `71` or `72`,
/// already stripped of its outer tag/length by the caller) into its
/// constituent command APDUs and sends each to the card in order,
/// stopping at the first rejected command.
///
/// Returns `Ok(true)` if every command in the script was accepted,
/// `Ok(false)` if the card rejected one.
pub fn execute_script(
    transceiver: &mut dyn CardTransceiver,
    script_template: &[u8],
) -> Result<bool, EngineError> {
    let nodes = parse(script_template)?;
    for node in &nodes {
        if node.tag != ISSUER_SCRIPT_COMMAND {
            continue;
        }
        let raw = match &node.value {
            TlvNodeValue::Primitive(bytes) => bytes,
            TlvNodeValue::Constructed(_) => continue,
        };
        if raw.len() < 4 {
            return Err(EngineError::Protocol(
                "issuer script command shorter than a bare header".to_string(),
            ));
        }
        let (header, data) = raw.split_at(4);
        let command = CommandApdu {
            cla: header[0],
            ins: header[1],
            p1: header[2],
            p2: header[3],
            data,
            ne: 0,
        };
        let response = crate::io::exchange_with_continuation(transceiver, &command)?;
        if !is_accepted(response.sw) {
            return Ok(false);
        }
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::ResponseApdu;

    struct MockCard {
        responses: Vec<ResponseApdu>,
    }

    impl CardTransceiver for MockCard {
        fn transceive(&mut self, _command: &CommandApdu) -> Result<ResponseApdu, EngineError> {
            Ok(self.responses.remove(0))
        }
    }

    fn script_with_one_command(cla: u8, ins: u8, p1: u8, p2: u8, data: &[u8]) -> Vec<u8> {
        let mut command = vec![cla, ins, p1, p2];
        command.extend_from_slice(data);
        let mut template = vec![ISSUER_SCRIPT_COMMAND as u8, command.len() as u8];
        template.extend_from_slice(&command);
        template
    }

    #[test]
    fn accepted_command_returns_true() {
        let script = script_with_one_command(0x84, 0x24, 0x00, 0x00, &[0x01, 0x02]);
        let mut card = MockCard {
            responses: vec![ResponseApdu { data: vec![], sw: 0x9000 }],
        };
        assert!(execute_script(&mut card, &script).unwrap());
    }

    #[test]
    fn rejected_command_returns_false() {
        let script = script_with_one_command(0x84, 0x24, 0x00, 0x00, &[0x01, 0x02]);
        let mut card = MockCard {
            responses: vec![ResponseApdu { data: vec![], sw: 0x6985 }],
        };
        assert!(!execute_script(&mut card, &script).unwrap());
    }
}
