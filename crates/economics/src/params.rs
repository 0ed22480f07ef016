//! Issuance schedule parameters

use crate::errors::EconomicsError;
use citymine_types::TokenAmount;
use serde::{Deserialize, Serialize};

/// Blocks after activation that pay the bonus reward.
pub const BONUS_PERIOD_LENGTH: u64 = 10_000;
/// Blocks between two halvings.
pub const TOKEN_HALVING_BLOCKS: u64 = 210_000;
/// Reward paid per block during the bonus period.
pub const BONUS_REWARD: TokenAmount = 250_000;
/// Reward paid per block in the first halving epoch.
pub const BASE_REWARD: TokenAmount = 100_000;
/// Number of halvings applied before the reward settles on its tail value.
pub const HALVING_EPOCHS: u32 = 5;

/// Parameters of the bonus/halving issuance schedule.
///
/// Offsets are measured in blocks from the activation block. With the defaults
/// the per-block reward is 250 000 during the bonus period, then 100 000,
/// 50 000, 25 000, 12 500, 6 250 and finally 3 125 forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleParams {
    /// Bonus period length in blocks
    pub bonus_period_length: u64,
    /// Halving interval in blocks
    pub halving_interval: u64,
    /// Reward during the bonus period
    pub bonus_reward: TokenAmount,
    /// Reward for the first halving epoch; later epochs halve it
    pub base_reward: TokenAmount,
    /// Halvings after which the reward stops decreasing
    pub halving_epochs: u32,
}

impl Default for ScheduleParams {
    fn default() -> Self {
        Self {
            bonus_period_length: BONUS_PERIOD_LENGTH,
            halving_interval: TOKEN_HALVING_BLOCKS,
            bonus_reward: BONUS_REWARD,
            base_reward: BASE_REWARD,
            halving_epochs: HALVING_EPOCHS,
        }
    }
}

impl ScheduleParams {
    /// Check the parameters describe a usable schedule.
    pub fn validate(&self) -> Result<(), EconomicsError> {
        if self.halving_interval == 0 {
            return Err(EconomicsError::InvalidParameter(
                "halving_interval must be positive",
            ));
        }
        if self.base_reward == 0 {
            return Err(EconomicsError::InvalidParameter(
                "base_reward must be positive",
            ));
        }
        if self.halving_epochs >= u64::BITS {
            return Err(EconomicsError::InvalidParameter(
                "halving_epochs must be below 64",
            ));
        }
        if self.bonus_period_length > self.halving_interval {
            return Err(EconomicsError::BonusExceedsHalving {
                bonus: self.bonus_period_length,
                interval: self.halving_interval,
            });
        }
        Ok(())
    }

    /// Reward paid once every halving has been applied.
    pub fn tail_reward(&self) -> TokenAmount {
        self.base_reward >> self.halving_epochs.min(u64::BITS - 1)
    }
}
