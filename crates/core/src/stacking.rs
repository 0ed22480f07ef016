//! Staking ledger
//!
//! Stakes lock tokens for whole reward cycles starting with the cycle after
//! the one they were made in. Records are sparse and additive: a stacker with
//! no record in a cycle reads as zero.

use citymine_types::{NativeAmount, ParticipantId, RewardCycle, TokenAmount};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A participant's position in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StackerRecord {
    /// Tokens locked during the cycle.
    pub amount_stacked: TokenAmount,
    /// Tokens handed back when the cycle is claimed; non-zero only in the
    /// last cycle of a lock period.
    pub to_return: TokenAmount,
}

/// Totals for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CycleStats {
    pub total_stacked: TokenAmount,
    pub total_commitment_received: NativeAmount,
    pub claimed: BTreeSet<ParticipantId>,
}

/// Cycles touched by one stake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockWindow {
    pub first_cycle: RewardCycle,
    pub last_cycle: RewardCycle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakingLedger {
    stackers: BTreeMap<(ParticipantId, RewardCycle), StackerRecord>,
    cycles: BTreeMap<RewardCycle, CycleStats>,
}

impl StakingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock `amount` for `lock_period` cycles after `current_cycle`.
    pub fn record_stake(
        &mut self,
        participant: ParticipantId,
        current_cycle: RewardCycle,
        amount: TokenAmount,
        lock_period: u64,
    ) -> LockWindow {
        let first_cycle = current_cycle.saturating_add(1);
        let last_cycle = current_cycle.saturating_add(lock_period);

        for cycle in first_cycle..=last_cycle {
            let record = self.stackers.entry((participant, cycle)).or_default();
            record.amount_stacked = record.amount_stacked.saturating_add(amount);
            if cycle == last_cycle {
                record.to_return = record.to_return.saturating_add(amount);
            }
            let stats = self.cycles.entry(cycle).or_default();
            stats.total_stacked = stats.total_stacked.saturating_add(amount);
        }

        LockWindow {
            first_cycle,
            last_cycle,
        }
    }

    /// Add the stackers' share of a commitment to `cycle`.
    pub fn credit_commitment(&mut self, cycle: RewardCycle, amount: NativeAmount) {
        if amount == 0 {
            return;
        }
        let stats = self.cycles.entry(cycle).or_default();
        stats.total_commitment_received = stats.total_commitment_received.saturating_add(amount);
    }

    /// Whether anyone has tokens locked in `cycle`.
    pub fn is_active(&self, cycle: RewardCycle) -> bool {
        self.cycles
            .get(&cycle)
            .map(|s| s.total_stacked > 0)
            .unwrap_or(false)
    }

    pub fn stacker_or_default(&self, participant: ParticipantId, cycle: RewardCycle) -> StackerRecord {
        self.stackers
            .get(&(participant, cycle))
            .copied()
            .unwrap_or_default()
    }

    pub fn cycle_or_default(&self, cycle: RewardCycle) -> CycleStats {
        self.cycles.get(&cycle).cloned().unwrap_or_default()
    }

    pub fn has_claimed(&self, participant: ParticipantId, cycle: RewardCycle) -> bool {
        self.cycles
            .get(&cycle)
            .map(|s| s.claimed.contains(&participant))
            .unwrap_or(false)
    }

    /// Native currency owed to `participant` for `cycle`, ignoring claims.
    pub fn entitled_reward(&self, participant: ParticipantId, cycle: RewardCycle) -> NativeAmount {
        let Some(stats) = self.cycles.get(&cycle) else {
            return 0;
        };
        if stats.total_stacked == 0 {
            return 0;
        }
        let stacked = self.stacker_or_default(participant, cycle).amount_stacked;
        (stats.total_commitment_received as u128 * stacked as u128 / stats.total_stacked as u128)
            as NativeAmount
    }

    pub fn mark_claimed(&mut self, participant: ParticipantId, cycle: RewardCycle) -> bool {
        self.cycles
            .entry(cycle)
            .or_default()
            .claimed
            .insert(participant)
    }

    /// Sum of `to_return` over every cycle for `participant`.
    pub fn total_to_return(&self, participant: ParticipantId) -> TokenAmount {
        self.stackers
            .range((participant, 0)..=(participant, RewardCycle::MAX))
            .map(|(_, r)| r.to_return)
            .fold(0, TokenAmount::saturating_add)
    }
}
