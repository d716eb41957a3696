//! Contactless application selection (spec §4.7 step 1): selecting the
//! Proximity Payment System Environment, reading its directory entries,
//! ordering them into a priority-sorted candidate list, and dispatching
//! each candidate's RID to the matching brand kernel.
//!
//! Grounded on the teacher's `pse.rs` `list_applications`, rewritten
//! against the PPSE name (`2PAY.SYS.DDF01`) instead of the contact PSE
//! (`1PAY.SYS.DDF01`) and against the new [`crate::tlv::node`] tree parser
//! instead of the teacher's typed `Value`/`Field` model.

use crate::error::EngineError;
use crate::io::{exchange_with_continuation, CardTransceiver, CommandApdu};
use crate::kernel::{
    amex, dpas, jcb, mastercard, unionpay, visa, AmexKernel, DpasKernel, JcbKernel, KernelOps,
    MastercardKernel, UnionPayKernel, VisaKernel,
};
use crate::tlv::node::{find_tag, parse, TlvNodeValue};

pub const PPSE_NAME: &[u8] = b"2PAY.SYS.DDF01";

const TAG_FCI_TEMPLATE: u32 = 0x6f;
const TAG_FCI_PROPRIETARY_TEMPLATE: u32 = 0xa5;
const TAG_FCI_ISSUER_DISCRETIONARY_DATA: u32 = 0xbf0c;
const TAG_APPLICATION_TEMPLATE: u32 = 0x61;
const TAG_AID: u32 = 0x4f;
const TAG_APPLICATION_LABEL: u32 = 0x50;
const TAG_APPLICATION_PRIORITY_INDICATOR: u32 = 0x87;
const TAG_KERNEL_IDENTIFIER: u32 = 0x9f2a;

/// One entry of the PPSE directory: an AID the card advertises plus
/// enough metadata to sort and dispatch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub aid: Vec<u8>,
    pub label: String,
    /// Lower values sort first; entries without a priority indicator sort
    /// after every entry that has one, in directory order.
    pub priority: Option<u8>,
    pub kernel_id: Option<Vec<u8>>,
}

/// Selects the PPSE directory file and returns its candidates, already
/// ordered per spec §4.7 step 1 (ascending priority, unprioritised
/// entries last, directory order as the tiebreak).
pub fn select_ppse(transceiver: &mut dyn CardTransceiver) -> Result<Vec<Candidate>, EngineError> {
    let select = CommandApdu::select(PPSE_NAME);
    let response = exchange_with_continuation(transceiver, &select)?;
    if !response.is_success() {
        return Err(EngineError::CardStatus(response.sw));
    }

    let nodes = parse(&response.data)?;
    let fci = find_tag(&nodes, TAG_FCI_TEMPLATE).ok_or_else(|| {
        EngineError::Protocol("PPSE SELECT response missing FCI template".to_string())
    })?;
    let children = fci
        .as_constructed()
        .ok_or_else(|| EngineError::Protocol("FCI template was primitive".to_string()))?;
    let proprietary = find_tag(children, TAG_FCI_PROPRIETARY_TEMPLATE)
        .and_then(|n| n.as_constructed())
        .unwrap_or(&[]);
    let issuer_discretionary = find_tag(proprietary, TAG_FCI_ISSUER_DISCRETIONARY_DATA)
        .and_then(|n| n.as_constructed())
        .unwrap_or(proprietary);

    let mut candidates = Vec::new();
    for node in issuer_discretionary {
        if node.tag != TAG_APPLICATION_TEMPLATE {
            continue;
        }
        let Some(fields) = node.as_constructed() else {
            continue;
        };
        candidates.push(parse_application_template(fields)?);
    }

    candidates.sort_by_key(|c| c.priority.unwrap_or(u8::MAX));
    Ok(candidates)
}

fn parse_application_template(fields: &[crate::tlv::node::BerTlv]) -> Result<Candidate, EngineError> {
    let mut aid = None;
    let mut label = None;
    let mut priority = None;
    let mut kernel_id = None;

    for field in fields {
        match (field.tag, &field.value) {
            (TAG_AID, TlvNodeValue::Primitive(b)) => aid = Some(b.clone()),
            (TAG_APPLICATION_LABEL, TlvNodeValue::Primitive(b)) => {
                label = Some(String::from_utf8_lossy(b).into_owned());
            }
            (TAG_APPLICATION_PRIORITY_INDICATOR, TlvNodeValue::Primitive(b)) => {
                priority = b.first().copied();
            }
            (TAG_KERNEL_IDENTIFIER, TlvNodeValue::Primitive(b)) => kernel_id = Some(b.clone()),
            _ => {}
        }
    }

    Ok(Candidate {
        aid: aid.ok_or_else(|| EngineError::Protocol("application template missing AID".to_string()))?,
        label: label.unwrap_or_default(),
        priority,
        kernel_id,
    })
}

/// Dispatches a candidate's AID to its brand kernel by matching its
/// Registered Application Provider Identifier (the AID's first 5 bytes)
/// against each kernel's RID.
pub fn kernel_for_aid(aid: &[u8]) -> Option<Box<dyn KernelOps>> {
    if aid.len() < 5 {
        return None;
    }
    let rid: [u8; 5] = aid[..5].try_into().ok()?;
    if rid == visa::RID {
        Some(Box::new(VisaKernel))
    } else if rid == mastercard::RID {
        Some(Box::new(MastercardKernel))
    } else if rid == amex::RID {
        Some(Box::new(AmexKernel))
    } else if rid == dpas::RID {
        Some(Box::new(DpasKernel))
    } else if rid == jcb::RID {
        Some(Box::new(JcbKernel))
    } else if rid == unionpay::RID {
        Some(Box::new(UnionPayKernel))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fci_with_two_applications() -> Vec<u8> {
        let app1 = [0x4f, 0x05, 0xa0, 0x00, 0x00, 0x00, 0x03, 0x87, 0x01, 0x02];
        let app2 = [0x4f, 0x05, 0xa0, 0x00, 0x00, 0x00, 0x04, 0x87, 0x01, 0x01];
        let template1 = [&[0x61, app1.len() as u8][..], &app1].concat();
        let template2 = [&[0x61, app2.len() as u8][..], &app2].concat();
        let discretionary = [template1, template2].concat();
        let proprietary = [&[0xbf, 0x0c, discretionary.len() as u8][..], &discretionary].concat();
        let fci_body = [&[0xa5, proprietary.len() as u8][..], &proprietary].concat();
        [&[0x6f, fci_body.len() as u8][..], &fci_body].concat()
    }

    #[test]
    fn candidates_sort_by_ascending_priority() {
        let nodes = parse(&fci_with_two_applications()).unwrap();
        let fci = find_tag(&nodes, TAG_FCI_TEMPLATE).unwrap();
        let children = fci.as_constructed().unwrap();
        let proprietary = find_tag(children, TAG_FCI_PROPRIETARY_TEMPLATE)
            .unwrap()
            .as_constructed()
            .unwrap();
        let discretionary = find_tag(proprietary, TAG_FCI_ISSUER_DISCRETIONARY_DATA)
            .unwrap()
            .as_constructed()
            .unwrap();
        let mut candidates = Vec::new();
        for node in discretionary {
            if node.tag == TAG_APPLICATION_TEMPLATE {
                candidates.push(parse_application_template(node.as_constructed().unwrap()).unwrap());
            }
        }
        candidates.sort_by_key(|c| c.priority.unwrap_or(u8::MAX));
        assert_eq!(candidates[0].aid, vec![0xa0, 0x00, 0x00, 0x00, 0x04]);
        assert_eq!(candidates[1].aid, vec![0xa0, 0x00, 0x00, 0x00, 0x03]);
    }

    #[test]
    fn kernel_lookup_matches_known_rids() {
        assert!(kernel_for_aid(&[0xa0, 0x00, 0x00, 0x00, 0x03, 0x10, 0x10]).is_some());
        assert!(kernel_for_aid(&[0xa0, 0x00, 0x00, 0x00, 0x99]).is_none());
    }
}
