//! Kernel outcomes (spec §4.6): the sealed set of terminal results a
//! brand kernel's state machine can reach.

use crate::kernel::auth_request::AuthorizationRequest;
use crate::tlv::store::TagStore;
use crate::tlv::tvr::Tvr;

/// Accumulated state carried out of the kernel regardless of how the
/// transaction ended, useful for logging and for resuming a torn
/// transaction.
#[derive(Debug, Clone, Default)]
pub struct TransactionData {
    pub card: TagStore,
    pub tvr: Tvr,
}

#[derive(Debug, Clone)]
pub enum KernelOutcome {
    Approved(TransactionData),
    Declined(TransactionData, String),
    OnlineRequest(Box<AuthorizationRequest>),
    EndApplication(String),
    TryAnotherInterface,
    TryAgain(String),
    SelectNext,
    TornTransaction(TransactionData),
}

impl KernelOutcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, KernelOutcome::TryAgain(_))
    }
}
