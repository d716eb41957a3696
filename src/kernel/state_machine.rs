//! The passive kernel state machine (spec §4.6), driven by each brand
//! kernel. Validates transitions against an allow-list, tracks the four
//! independent timeouts with sequence-number invalidation, and resolves
//! card-removal and cancellation semantics.

use std::time::{Duration, Instant};

use crate::kernel::outcome::{KernelOutcome, TransactionData};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum State {
    Idle,
    WaitingForCard,
    CardDetected,
    SelectingApplication,
    InitiatingApplication,
    ReadingApplicationData,
    OfflineDataAuthentication,
    ProcessingRestrictions,
    CardholderVerification,
    TerminalRiskManagement,
    TerminalActionAnalysis,
    GeneratingCryptogram,
    OnlineAuthorization,
    IssuerScriptProcessing,
    SecondGenerateAc,
    Complete,
    TerminalOutcome,
}

fn is_allowed(from: State, to: State) -> bool {
    use State::*;
    matches!(
        (from, to),
        (Idle, WaitingForCard)
            | (WaitingForCard, CardDetected)
            | (WaitingForCard, TerminalOutcome)
            | (CardDetected, SelectingApplication)
            | (CardDetected, TerminalOutcome)
            | (SelectingApplication, InitiatingApplication)
            | (SelectingApplication, TerminalOutcome)
            | (InitiatingApplication, ReadingApplicationData)
            | (InitiatingApplication, TerminalOutcome)
            | (ReadingApplicationData, OfflineDataAuthentication)
            | (ReadingApplicationData, TerminalOutcome)
            | (OfflineDataAuthentication, ProcessingRestrictions)
            | (OfflineDataAuthentication, TerminalOutcome)
            | (ProcessingRestrictions, CardholderVerification)
            | (ProcessingRestrictions, TerminalOutcome)
            | (CardholderVerification, TerminalRiskManagement)
            | (CardholderVerification, TerminalOutcome)
            | (TerminalRiskManagement, TerminalActionAnalysis)
            | (TerminalRiskManagement, TerminalOutcome)
            | (TerminalActionAnalysis, GeneratingCryptogram)
            | (TerminalActionAnalysis, TerminalOutcome)
            | (GeneratingCryptogram, Complete)
            | (GeneratingCryptogram, OnlineAuthorization)
            | (GeneratingCryptogram, TerminalOutcome)
            | (OnlineAuthorization, IssuerScriptProcessing)
            | (OnlineAuthorization, Complete)
            | (OnlineAuthorization, TerminalOutcome)
            | (IssuerScriptProcessing, SecondGenerateAc)
            | (IssuerScriptProcessing, Complete)
            | (IssuerScriptProcessing, TerminalOutcome)
            | (SecondGenerateAc, Complete)
            | (SecondGenerateAc, TerminalOutcome)
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IllegalTransition {
    pub from: State,
    pub to: State,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardRemovalEffect {
    TryAgain,
    TornTransaction,
    EndApplication,
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    WaitForCard,
    PerCommand,
    Overall,
    OnlineResponse,
}

/// A deadline with a sequence number so a timer fired after the command
/// it was guarding already completed is recognizably stale.
#[derive(Debug, Clone, Copy, Default)]
struct Timer {
    deadline: Option<Instant>,
    sequence: u64,
}

impl Timer {
    fn start(&mut self, duration: Duration) -> u64 {
        self.sequence += 1;
        self.deadline = Some(Instant::now() + duration);
        self.sequence
    }

    fn cancel(&mut self) {
        self.deadline = None;
        self.sequence += 1;
    }

    /// True only if `sequence` still matches the last `start` call and the
    /// deadline has passed; a stale sequence number is always discarded.
    fn has_fired(&self, sequence: u64) -> bool {
        sequence == self.sequence
            && self
                .deadline
                .map(|d| Instant::now() >= d)
                .unwrap_or(false)
    }
}

pub struct KernelStateMachine {
    state: State,
    wait_for_card: Timer,
    per_command: Timer,
    overall: Timer,
    online_response: Timer,
    generate_ac_in_flight: bool,
    any_cryptogram_received: bool,
    try_again_attempts: u32,
    max_try_again_attempts: u32,
    last_outcome: Option<KernelOutcome>,
}

impl KernelStateMachine {
    pub fn new(max_try_again_attempts: u32) -> Self {
        Self {
            state: State::Idle,
            wait_for_card: Timer::default(),
            per_command: Timer::default(),
            overall: Timer::default(),
            online_response: Timer::default(),
            generate_ac_in_flight: false,
            any_cryptogram_received: false,
            try_again_attempts: 0,
            max_try_again_attempts,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn transition(&mut self, to: State) -> Result<(), IllegalTransition> {
        if !is_allowed(self.state, to) {
            return Err(IllegalTransition {
                from: self.state,
                to,
            });
        }
        if to == State::GeneratingCryptogram || to == State::SecondGenerateAc {
            self.generate_ac_in_flight = true;
        }
        self.state = to;
        Ok(())
    }

    /// Call once the card has returned a cryptogram (AC/CID) for the
    /// current GENERATE AC in flight.
    pub fn record_cryptogram_received(&mut self) {
        self.generate_ac_in_flight = false;
        self.any_cryptogram_received = true;
    }

    pub fn start_timer(&mut self, kind: TimerKind, duration: Duration) -> u64 {
        self.timer_mut(kind).start(duration)
    }

    pub fn cancel_timer(&mut self, kind: TimerKind) {
        self.timer_mut(kind).cancel();
    }

    pub fn timer_fired(&self, kind: TimerKind, sequence: u64) -> bool {
        self.timer(kind).has_fired(sequence)
    }

    fn timer(&self, kind: TimerKind) -> &Timer {
        match kind {
            TimerKind::WaitForCard => &self.wait_for_card,
            TimerKind::PerCommand => &self.per_command,
            TimerKind::Overall => &self.overall,
            TimerKind::OnlineResponse => &self.online_response,
        }
    }

    fn timer_mut(&mut self, kind: TimerKind) -> &mut Timer {
        match kind {
            TimerKind::WaitForCard => &mut self.wait_for_card,
            TimerKind::PerCommand => &mut self.per_command,
            TimerKind::Overall => &mut self.overall,
            TimerKind::OnlineResponse => &mut self.online_response,
        }
    }

    /// Resolves card-removal semantics (spec §4.6): a GENERATE AC in
    /// flight, or removal during the online dialogue or second GENERATE
    /// AC, is always a torn transaction; removal before any cryptogram
    /// was requested is a retry up to the configured limit; removal
    /// after the (final) cryptogram was returned does not interrupt
    /// processing.
    pub fn on_card_removed(&mut self) -> CardRemovalEffect {
        if self.generate_ac_in_flight
            || matches!(self.state, State::OnlineAuthorization | State::SecondGenerateAc)
        {
            return CardRemovalEffect::TornTransaction;
        }
        if self.any_cryptogram_received {
            return CardRemovalEffect::Continue;
        }
        self.try_again_attempts += 1;
        if self.try_again_attempts > self.max_try_again_attempts {
            CardRemovalEffect::EndApplication
        } else {
            CardRemovalEffect::TryAgain
        }
    }

    /// Idempotent cancellation: cancels every timer; if a cryptogram was
    /// requested but not yet returned, yields `TornTransaction`, else
    /// `EndApplication`. A repeated call after reaching a terminal
    /// outcome returns that same outcome.
    pub fn abort(&mut self, reason: String) -> KernelOutcome {
        self.wait_for_card.cancel();
        self.per_command.cancel();
        self.overall.cancel();
        self.online_response.cancel();

        if let Some(outcome) = &self.last_outcome {
            return outcome.clone();
        }

        let outcome = if self.generate_ac_in_flight {
            KernelOutcome::TornTransaction(TransactionData::default())
        } else {
            KernelOutcome::EndApplication(reason)
        };
        self.state = State::TerminalOutcome;
        self.last_outcome = Some(outcome.clone());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_transition_succeeds() {
        let mut sm = KernelStateMachine::new(3);
        assert!(sm.transition(State::WaitingForCard).is_ok());
        assert!(sm.transition(State::CardDetected).is_ok());
    }

    #[test]
    fn disallowed_transition_is_rejected() {
        let mut sm = KernelStateMachine::new(3);
        let err = sm.transition(State::Complete).unwrap_err();
        assert_eq!(err.from, State::Idle);
        assert_eq!(err.to, State::Complete);
    }

    #[test]
    fn stale_timer_sequence_is_discarded() {
        let mut sm = KernelStateMachine::new(3);
        let seq = sm.start_timer(TimerKind::PerCommand, Duration::from_millis(0));
        sm.cancel_timer(TimerKind::PerCommand);
        assert!(!sm.timer_fired(TimerKind::PerCommand, seq));
    }

    #[test]
    fn removal_before_generate_ac_retries_then_ends() {
        let mut sm = KernelStateMachine::new(1);
        assert_eq!(sm.on_card_removed(), CardRemovalEffect::TryAgain);
        assert_eq!(sm.on_card_removed(), CardRemovalEffect::EndApplication);
    }

    #[test]
    fn removal_with_ac_in_flight_is_torn() {
        let mut sm = KernelStateMachine::new(3);
        sm.transition(State::WaitingForCard).unwrap();
        sm.transition(State::CardDetected).unwrap();
        sm.transition(State::SelectingApplication).unwrap();
        sm.transition(State::InitiatingApplication).unwrap();
        sm.transition(State::ReadingApplicationData).unwrap();
        sm.transition(State::OfflineDataAuthentication).unwrap();
        sm.transition(State::ProcessingRestrictions).unwrap();
        sm.transition(State::CardholderVerification).unwrap();
        sm.transition(State::TerminalRiskManagement).unwrap();
        sm.transition(State::TerminalActionAnalysis).unwrap();
        sm.transition(State::GeneratingCryptogram).unwrap();
        assert_eq!(sm.on_card_removed(), CardRemovalEffect::TornTransaction);
    }

    #[test]
    fn removal_after_cryptogram_continues() {
        let mut sm = KernelStateMachine::new(3);
        sm.generate_ac_in_flight = true;
        sm.record_cryptogram_received();
        assert_eq!(sm.on_card_removed(), CardRemovalEffect::Continue);
    }

    #[test]
    fn abort_is_idempotent() {
        let mut sm = KernelStateMachine::new(3);
        let first = sm.abort("merchant cancel".to_string());
        let second = sm.abort("merchant cancel".to_string());
        assert!(matches!(first, KernelOutcome::EndApplication(_)));
        assert!(matches!(second, KernelOutcome::EndApplication(_)));
    }
}
