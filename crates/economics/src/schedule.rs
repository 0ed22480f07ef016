//! Per-block issuance keyed to the offset from the activation block.

use crate::errors::EconomicsError;
use crate::params::ScheduleParams;
use citymine_types::{BlockHeight, TokenAmount};
use serde::{Deserialize, Serialize};

/// Which part of the schedule a block offset falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssuancePhase {
    /// Fixed bonus reward right after activation.
    Bonus,
    /// Halving epoch `n` (0 pays the base reward).
    Halving(u32),
    /// Every halving has been applied.
    Tail,
}

/// Detailed view of the issuance at one block offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuanceDetails {
    pub offset: u64,
    pub reward: TokenAmount,
    pub phase: IssuancePhase,
}

/// Phase of the schedule for a block offset.
pub fn issuance_phase(offset: u64, params: &ScheduleParams) -> IssuancePhase {
    if offset < params.bonus_period_length {
        return IssuancePhase::Bonus;
    }

    let interval = params.halving_interval.max(1);
    let epoch = offset / interval;
    if epoch >= params.halving_epochs as u64 {
        IssuancePhase::Tail
    } else {
        IssuancePhase::Halving(epoch as u32)
    }
}

/// Tokens minted to the winner of the block at `offset` blocks after activation.
pub fn coinbase_amount(offset: u64, params: &ScheduleParams) -> TokenAmount {
    match issuance_phase(offset, params) {
        IssuancePhase::Bonus => params.bonus_reward,
        IssuancePhase::Halving(epoch) => params.base_reward >> epoch,
        IssuancePhase::Tail => params.tail_reward(),
    }
}

/// Tokens minted for a mined block at absolute `height`, given the activation
/// block. Blocks before activation issue nothing.
pub fn coinbase_at_height(
    height: BlockHeight,
    activation_block: BlockHeight,
    params: &ScheduleParams,
) -> TokenAmount {
    match height.checked_sub(activation_block) {
        Some(offset) => coinbase_amount(offset, params),
        None => 0,
    }
}

/// Detailed issuance information for an offset.
pub fn issuance_details(offset: u64, params: &ScheduleParams) -> IssuanceDetails {
    IssuanceDetails {
        offset,
        reward: coinbase_amount(offset, params),
        phase: issuance_phase(offset, params),
    }
}

/// First offset at which the reward changes after `offset`, if any.
pub fn next_reward_change(offset: u64, params: &ScheduleParams) -> Option<u64> {
    let interval = params.halving_interval.max(1);
    match issuance_phase(offset, params) {
        IssuancePhase::Bonus => Some(params.bonus_period_length),
        IssuancePhase::Halving(epoch) => (epoch as u64 + 1).checked_mul(interval),
        IssuancePhase::Tail => None,
    }
}

/// Total issuance if every one of the first `blocks` blocks after activation
/// is claimed.
///
/// Summed per schedule segment rather than per block, so long horizons are
/// cheap.
pub fn project_total_issuance(
    blocks: u64,
    params: &ScheduleParams,
) -> Result<u128, EconomicsError> {
    let interval = params.halving_interval.max(1) as u128;
    let blocks = blocks as u128;
    let bonus_end = (params.bonus_period_length as u128).min(blocks);

    let mut total = bonus_end * params.bonus_reward as u128;

    for epoch in 0..params.halving_epochs {
        let start = (epoch as u128 * interval).max(bonus_end);
        let end = ((epoch as u128 + 1) * interval).min(blocks);
        if end <= start {
            continue;
        }
        let segment = (end - start) * (params.base_reward >> epoch) as u128;
        total = total
            .checked_add(segment)
            .ok_or(EconomicsError::CalculationOverflow("halving segment"))?;
    }

    let tail_start = (params.halving_epochs as u128 * interval).max(bonus_end);
    if blocks > tail_start {
        let segment = (blocks - tail_start) * params.tail_reward() as u128;
        total = total
            .checked_add(segment)
            .ok_or(EconomicsError::CalculationOverflow("tail segment"))?;
    }

    Ok(total)
}
