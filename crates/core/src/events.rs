//! Engine event log entries.

use citymine_types::{BlockHeight, NativeAmount, ParticipantId, Principal, RewardCycle, TokenAmount};
use serde::{Deserialize, Serialize};

/// One successful state change, appended in call order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    UserRegistered {
        participant: ParticipantId,
        principal: Principal,
        block: BlockHeight,
        memo: Option<String>,
    },
    ActivationScheduled {
        activation_block: BlockHeight,
        registered_count: u64,
    },
    TokensMined {
        participant: ParticipantId,
        principal: Principal,
        block: BlockHeight,
        commitment: NativeAmount,
        to_city: NativeAmount,
        to_stackers: NativeAmount,
        memo: Option<String>,
    },
    /// Summary of a `mine_many` batch.
    MinedMany {
        participant: ParticipantId,
        principal: Principal,
        first_block: BlockHeight,
        last_block: BlockHeight,
        total_commitment: NativeAmount,
    },
    MiningRewardClaimed {
        participant: ParticipantId,
        principal: Principal,
        block: BlockHeight,
        amount: TokenAmount,
    },
    TokensStacked {
        participant: ParticipantId,
        principal: Principal,
        amount: TokenAmount,
        first_cycle: RewardCycle,
        last_cycle: RewardCycle,
    },
    StackingRewardClaimed {
        participant: ParticipantId,
        principal: Principal,
        cycle: RewardCycle,
        native_reward: NativeAmount,
        tokens_returned: TokenAmount,
    },
}

impl EngineEvent {
    /// Tag used in the serialized form.
    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::UserRegistered { .. } => "user_registered",
            EngineEvent::ActivationScheduled { .. } => "activation_scheduled",
            EngineEvent::TokensMined { .. } => "tokens_mined",
            EngineEvent::MinedMany { .. } => "mined_many",
            EngineEvent::MiningRewardClaimed { .. } => "mining_reward_claimed",
            EngineEvent::TokensStacked { .. } => "tokens_stacked",
            EngineEvent::StackingRewardClaimed { .. } => "stacking_reward_claimed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_tag_matches_kind() {
        let event = EngineEvent::ActivationScheduled {
            activation_block: 151,
            registered_count: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], event.kind());
        assert_eq!(json["activation_block"], 151);

        let back: EngineEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
