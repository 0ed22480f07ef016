//! Activation gate
//!
//! Counts registrations against the threshold. The registration that reaches
//! the threshold schedules activation `ACTIVATION_DELAY` blocks later and closes
//! registration for good.

use crate::config::ACTIVATION_DELAY;
use crate::errors::{EngineResult, ErrorCode};
use citymine_types::{BlockHeight, RewardCycle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationGate {
    threshold: u64,
    registered_count: u64,
    activation_block: Option<BlockHeight>,
}

impl ActivationGate {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            registered_count: 0,
            activation_block: None,
        }
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn registered_count(&self) -> u64 {
        self.registered_count
    }

    pub fn activation_block(&self) -> Option<BlockHeight> {
        self.activation_block
    }

    /// Fails once the threshold has been reached.
    pub fn check_registration_open(&self) -> EngineResult<()> {
        if self.registered_count >= self.threshold {
            return Err(ErrorCode::ActivationThresholdReached);
        }
        Ok(())
    }

    /// Count one registration made at `current`. Returns the activation block
    /// when this registration is the one that reaches the threshold.
    ///
    /// Callers check [`Self::check_registration_open`] first.
    pub fn record_registration(&mut self, current: BlockHeight) -> Option<BlockHeight> {
        self.registered_count += 1;
        if self.registered_count == self.threshold && self.activation_block.is_none() {
            let block = current.saturating_add(ACTIVATION_DELAY);
            self.activation_block = Some(block);
            return Some(block);
        }
        None
    }

    /// Whether the engine is live at `current`.
    pub fn is_active(&self, current: BlockHeight) -> bool {
        matches!(self.activation_block, Some(block) if current >= block)
    }

    /// Activation block, if the engine is live at `current`.
    pub fn require_activated(&self, current: BlockHeight) -> EngineResult<BlockHeight> {
        match self.activation_block {
            Some(block) if current >= block => Ok(block),
            _ => Err(ErrorCode::ContractNotActivated),
        }
    }

    /// Reward cycle containing `height`; `None` before activation.
    pub fn reward_cycle(&self, height: BlockHeight, cycle_length: u64) -> Option<RewardCycle> {
        let activation = self.activation_block?;
        let offset = height.checked_sub(activation)?;
        Some(offset / cycle_length.max(1))
    }

    /// First block of `cycle`; `None` before activation is scheduled.
    pub fn first_block_in_cycle(
        &self,
        cycle: RewardCycle,
        cycle_length: u64,
    ) -> Option<BlockHeight> {
        let activation = self.activation_block?;
        cycle
            .checked_mul(cycle_length)
            .and_then(|offset| activation.checked_add(offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_registration_schedules_activation() {
        let mut gate = ActivationGate::new(2);
        assert_eq!(gate.record_registration(10), None);
        assert_eq!(gate.activation_block(), None);

        assert_eq!(gate.record_registration(12), Some(12 + ACTIVATION_DELAY));
        assert_eq!(gate.activation_block(), Some(162));
        assert_eq!(
            gate.check_registration_open(),
            Err(ErrorCode::ActivationThresholdReached)
        );
    }

    #[test]
    fn activation_waits_for_the_delay() {
        let mut gate = ActivationGate::new(1);
        gate.record_registration(0);

        assert!(!gate.is_active(149));
        assert_eq!(
            gate.require_activated(149),
            Err(ErrorCode::ContractNotActivated)
        );
        assert!(gate.is_active(150));
        assert_eq!(gate.require_activated(150), Ok(150));
    }

    #[test]
    fn unscheduled_gate_is_inactive() {
        let gate = ActivationGate::new(5);
        assert_eq!(
            gate.require_activated(u64::MAX),
            Err(ErrorCode::ContractNotActivated)
        );
        assert_eq!(gate.reward_cycle(1_000, 10), None);
        assert_eq!(gate.first_block_in_cycle(0, 10), None);
    }

    #[test]
    fn reward_cycles_count_from_activation() {
        let mut gate = ActivationGate::new(1);
        gate.record_registration(0);

        assert_eq!(gate.reward_cycle(149, 100), None);
        assert_eq!(gate.reward_cycle(150, 100), Some(0));
        assert_eq!(gate.reward_cycle(249, 100), Some(0));
        assert_eq!(gate.reward_cycle(250, 100), Some(1));
        assert_eq!(gate.first_block_in_cycle(3, 100), Some(450));
    }
}
