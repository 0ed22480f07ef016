//! Mining engine
//!
//! Applies registration, mining, claiming and stacking calls against the
//! injected chain, randomness oracle and token ledger. Every entry point
//! checks all of its preconditions before the first write, moves funds before
//! touching internal state, and either fully commits or leaves everything as
//! it was.

use crate::activation::ActivationGate;
use crate::chain::{Chain, RandomnessOracle};
use crate::config::{ConfigError, EngineConfig};
use crate::errors::{EngineResult, ErrorCode};
use crate::events::EngineEvent;
use crate::mining::{split_commitment, CommitmentSplit, MinerEntry, MiningLedger, MiningStats};
use crate::registry::{Participant, Registry};
use crate::selector::select_winner;
use crate::stacking::{CycleStats, StackerRecord, StakingLedger};
use citymine_economics::coinbase_at_height;
use citymine_treasury::{LedgerError, NativeLedger, TokenLedger};
use citymine_types::{
    BlockHeight, NativeAmount, ParticipantId, Principal, RewardCycle, TokenAmount,
};
use tracing::{debug, info, warn};

/// Internal books of the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub registry: Registry,
    pub gate: ActivationGate,
    pub mining: MiningLedger,
    pub stacking: StakingLedger,
}

impl EngineState {
    pub fn new(activation_threshold: u64) -> Self {
        Self {
            registry: Registry::new(),
            gate: ActivationGate::new(activation_threshold),
            mining: MiningLedger::new(),
            stacking: StakingLedger::new(),
        }
    }
}

/// A mining claim that passed every check.
#[derive(Debug, Clone, Copy)]
struct MiningClaim {
    participant: ParticipantId,
    reward: TokenAmount,
}

/// Commitment-weighted mining lottery with cycle-based stacking rewards.
pub struct MiningEngine<C, R, T> {
    config: EngineConfig,
    chain: C,
    oracle: R,
    tokens: T,
    state: EngineState,
    events: Vec<EngineEvent>,
}

impl<C, R, T> MiningEngine<C, R, T>
where
    C: Chain,
    R: RandomnessOracle,
    T: TokenLedger,
{
    pub fn new(config: EngineConfig, chain: C, oracle: R, tokens: T) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            target: "engine",
            "Mining engine created: threshold={}, cycle_length={}, maturity={}, city_split={}%",
            config.activation_threshold,
            config.reward_cycle_length,
            config.maturity_window,
            config.city_split_pct
        );
        Ok(Self {
            state: EngineState::new(config.activation_threshold),
            config,
            chain,
            oracle,
            tokens,
            events: Vec::new(),
        })
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Register `caller`. The registration that reaches the threshold
    /// schedules activation.
    pub fn register_user(&mut self, caller: &Principal, memo: Option<&str>) -> EngineResult<bool> {
        let result = self.try_register(caller, memo);
        log_rejection("register_user", caller, &result);
        result
    }

    fn try_register(&mut self, caller: &Principal, memo: Option<&str>) -> EngineResult<bool> {
        let current = self.chain.block_height();
        if self.state.registry.id_of(caller).is_some() {
            return Err(ErrorCode::UserAlreadyRegistered);
        }
        self.state.gate.check_registration_open()?;

        let participant = self.state.registry.register(caller)?;
        let scheduled = self.state.gate.record_registration(current);

        info!(target: "registry", "Registered {} as {} at block {}", caller, participant, current);
        self.events.push(EngineEvent::UserRegistered {
            participant,
            principal: *caller,
            block: current,
            memo: memo.map(str::to_owned),
        });

        if let Some(activation_block) = scheduled {
            info!(
                target: "registry",
                "Activation threshold of {} reached; engine activates at block {}",
                self.state.gate.threshold(),
                activation_block
            );
            self.events.push(EngineEvent::ActivationScheduled {
                activation_block,
                registered_count: self.state.gate.registered_count(),
            });
        }
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Mining
    // -------------------------------------------------------------------------

    /// Commit `amount` of native currency to the current block.
    pub fn mine_tokens(
        &mut self,
        caller: &Principal,
        amount: NativeAmount,
        memo: Option<&str>,
    ) -> EngineResult<bool> {
        let result = self.try_mine(caller, amount, memo);
        log_rejection("mine_tokens", caller, &result);
        result
    }

    fn try_mine(
        &mut self,
        caller: &Principal,
        amount: NativeAmount,
        memo: Option<&str>,
    ) -> EngineResult<bool> {
        let current = self.chain.block_height();
        self.state.gate.require_activated(current)?;
        if amount == 0 {
            return Err(ErrorCode::InsufficientCommitment);
        }
        if self.chain.native_balance(caller) < amount {
            return Err(ErrorCode::InsufficientBalance);
        }
        if let Some(id) = self.state.registry.id_of(caller) {
            if self.state.mining.has_mined(current, id) {
                return Err(ErrorCode::UserAlreadyMined);
            }
        }

        let cycle = self.cycle_of(current)?;
        let split = self.split_for(amount, cycle);
        self.settle_commitment(caller, split.to_city, split.to_stackers)?;

        let participant = self.state.registry.get_or_create(caller);
        self.state.mining.commit(current, participant, split);
        self.state.stacking.credit_commitment(cycle, split.to_stackers);

        info!(
            target: "mining",
            "{} committed {} at block {} (city={}, stackers={})",
            participant,
            amount,
            current,
            split.to_city,
            split.to_stackers
        );
        self.events.push(EngineEvent::TokensMined {
            participant,
            principal: *caller,
            block: current,
            commitment: amount,
            to_city: split.to_city,
            to_stackers: split.to_stackers,
            memo: memo.map(str::to_owned),
        });
        Ok(true)
    }

    /// Commit `amounts[i]` to block `current + i`, all or nothing.
    pub fn mine_many(&mut self, caller: &Principal, amounts: &[NativeAmount]) -> EngineResult<bool> {
        let result = self.try_mine_many(caller, amounts);
        log_rejection("mine_many", caller, &result);
        result
    }

    fn try_mine_many(&mut self, caller: &Principal, amounts: &[NativeAmount]) -> EngineResult<bool> {
        let current = self.chain.block_height();
        self.state.gate.require_activated(current)?;
        if amounts.is_empty() || amounts.contains(&0) {
            return Err(ErrorCode::InsufficientCommitment);
        }
        let total = amounts
            .iter()
            .try_fold(0u64, |acc, a| acc.checked_add(*a))
            .ok_or(ErrorCode::InsufficientBalance)?;
        if self.chain.native_balance(caller) < total {
            return Err(ErrorCode::InsufficientBalance);
        }
        let last_block = current
            .checked_add(amounts.len() as u64 - 1)
            .ok_or(ErrorCode::InsufficientCommitment)?;

        let existing = self.state.registry.id_of(caller);
        let mut planned = Vec::with_capacity(amounts.len());
        let (mut to_city, mut to_stackers) = (0u64, 0u64);
        for (height, amount) in (current..=last_block).zip(amounts.iter().copied()) {
            if let Some(id) = existing {
                if self.state.mining.has_mined(height, id) {
                    return Err(ErrorCode::UserAlreadyMined);
                }
            }
            let cycle = self.cycle_of(height)?;
            let split = self.split_for(amount, cycle);
            to_city += split.to_city;
            to_stackers += split.to_stackers;
            planned.push((height, cycle, split));
        }

        self.settle_commitment(caller, to_city, to_stackers)?;

        let participant = self.state.registry.get_or_create(caller);
        for (height, cycle, split) in planned {
            self.state.mining.commit(height, participant, split);
            self.state.stacking.credit_commitment(cycle, split.to_stackers);
        }

        info!(
            target: "mining",
            "{} committed {} over blocks {}..={} (city={}, stackers={})",
            participant,
            total,
            current,
            last_block,
            to_city,
            to_stackers
        );
        self.events.push(EngineEvent::MinedMany {
            participant,
            principal: *caller,
            first_block: current,
            last_block,
            total_commitment: total,
        });
        Ok(true)
    }

    /// Mint the block reward for `height` to `caller` if it won that block.
    pub fn claim_mining_reward(&mut self, caller: &Principal, height: BlockHeight) -> EngineResult<bool> {
        let result = self.try_claim_mining(caller, height);
        log_rejection("claim_mining_reward", caller, &result);
        result
    }

    fn try_claim_mining(&mut self, caller: &Principal, height: BlockHeight) -> EngineResult<bool> {
        let claim = self.check_mining_claim(caller, height)?;

        if claim.reward > 0 {
            self.tokens
                .mint(caller, claim.reward)
                .map_err(|e| ledger_rejected("mint", e))?;
        }
        self.state.mining.mark_claimed(height, claim.participant);

        info!(
            target: "mining",
            "{} claimed {} tokens for block {}",
            claim.participant,
            claim.reward,
            height
        );
        self.events.push(EngineEvent::MiningRewardClaimed {
            participant: claim.participant,
            principal: *caller,
            block: height,
            amount: claim.reward,
        });
        Ok(true)
    }

    fn check_mining_claim(&self, caller: &Principal, height: BlockHeight) -> EngineResult<MiningClaim> {
        let current = self.chain.block_height();
        let activation = self.state.gate.require_activated(current)?;
        let participant = self
            .state
            .registry
            .id_of(caller)
            .ok_or(ErrorCode::UserIdNotFound)?;
        let record = self
            .state
            .mining
            .record(height)
            .filter(|r| r.total_commitment > 0)
            .ok_or(ErrorCode::NoMinersAtBlock)?;
        if record.entry_for(participant).is_none() {
            return Err(ErrorCode::UserDidNotMineInBlock);
        }
        if current < height.saturating_add(self.config.maturity_window) {
            return Err(ErrorCode::ClaimedBeforeMaturity);
        }
        if record.is_claimed() {
            return Err(ErrorCode::RewardAlreadyClaimed);
        }
        let seed = self.oracle.seed_for(height).ok_or(ErrorCode::NoVrfSeedFound)?;
        let winner = select_winner(record, &seed)?;
        if winner.participant != participant {
            return Err(ErrorCode::MinerDidNotWin);
        }
        Ok(MiningClaim {
            participant,
            reward: coinbase_at_height(height, activation, &self.config.schedule),
        })
    }

    // -------------------------------------------------------------------------
    // Stacking
    // -------------------------------------------------------------------------

    /// Lock `amount` tokens for the `lock_period` cycles after the current one.
    pub fn stack_tokens(
        &mut self,
        caller: &Principal,
        amount: TokenAmount,
        lock_period: u64,
    ) -> EngineResult<bool> {
        let result = self.try_stack(caller, amount, lock_period);
        log_rejection("stack_tokens", caller, &result);
        result
    }

    fn try_stack(&mut self, caller: &Principal, amount: TokenAmount, lock_period: u64) -> EngineResult<bool> {
        let current = self.chain.block_height();
        self.state.gate.require_activated(current)?;
        if amount == 0 || lock_period == 0 || lock_period > self.config.max_lock_cycles {
            return Err(ErrorCode::CannotStack);
        }
        if self.tokens.balance_of(caller) < amount {
            return Err(ErrorCode::InsufficientTokenBalance);
        }
        let current_cycle = self.cycle_of(current)?;

        self.tokens
            .transfer(caller, &self.config.stacking_pool, amount)
            .map_err(|e| ledger_rejected("stack transfer", e))?;

        let participant = self.state.registry.get_or_create(caller);
        let window = self
            .state
            .stacking
            .record_stake(participant, current_cycle, amount, lock_period);

        info!(
            target: "stacking",
            "{} stacked {} tokens for cycles {}..={}",
            participant,
            amount,
            window.first_cycle,
            window.last_cycle
        );
        self.events.push(EngineEvent::TokensStacked {
            participant,
            principal: *caller,
            amount,
            first_cycle: window.first_cycle,
            last_cycle: window.last_cycle,
        });
        Ok(true)
    }

    /// Pay out `caller`'s share of a completed cycle's commitments and return
    /// any tokens whose lock ends with that cycle.
    pub fn claim_stacking_reward(&mut self, caller: &Principal, cycle: RewardCycle) -> EngineResult<bool> {
        let result = self.try_claim_stacking(caller, cycle);
        log_rejection("claim_stacking_reward", caller, &result);
        result
    }

    fn try_claim_stacking(&mut self, caller: &Principal, cycle: RewardCycle) -> EngineResult<bool> {
        let current = self.chain.block_height();
        self.state.gate.require_activated(current)?;
        let participant = self
            .state
            .registry
            .id_of(caller)
            .ok_or(ErrorCode::UserIdNotFound)?;
        if self.cycle_of(current)? <= cycle {
            return Err(ErrorCode::RewardCycleNotCompleted);
        }

        let stacker = self.state.stacking.stacker_or_default(participant, cycle);
        if stacker.amount_stacked == 0 || self.state.stacking.has_claimed(participant, cycle) {
            return Err(ErrorCode::NothingToRedeem);
        }
        let reward = self.state.stacking.entitled_reward(participant, cycle);
        let to_return = stacker.to_return;
        if reward == 0 && to_return == 0 {
            return Err(ErrorCode::NothingToRedeem);
        }

        let pool = self.config.stacking_pool;
        if self.chain.native_balance(&pool) < reward || self.tokens.balance_of(&pool) < to_return {
            warn!(target: "stacking", "Stacking pool {} cannot cover cycle {} payout", pool, cycle);
            return Err(ErrorCode::LedgerRejected);
        }
        if to_return > 0 {
            self.tokens
                .transfer(&pool, caller, to_return)
                .map_err(|e| ledger_rejected("stacking return", e))?;
        }
        if reward > 0 {
            if let Err(e) = self.chain.native_transfer(&pool, caller, reward) {
                if to_return > 0 {
                    if let Err(undo) = self.tokens.transfer(caller, &pool, to_return) {
                        warn!(
                            target: "stacking",
                            "Failed to return {} tokens from {} to pool: {}",
                            to_return,
                            caller,
                            undo
                        );
                    }
                }
                return Err(ledger_rejected("stacking payout", e));
            }
        }
        self.state.stacking.mark_claimed(participant, cycle);

        info!(
            target: "stacking",
            "{} claimed cycle {}: {} native, {} tokens returned",
            participant,
            cycle,
            reward,
            to_return
        );
        self.events.push(EngineEvent::StackingRewardClaimed {
            participant,
            principal: *caller,
            cycle,
            native_reward: reward,
            tokens_returned: to_return,
        });
        Ok(true)
    }

    // -------------------------------------------------------------------------
    // Internal helpers
    // -------------------------------------------------------------------------

    fn cycle_of(&self, height: BlockHeight) -> EngineResult<RewardCycle> {
        self.state
            .gate
            .reward_cycle(height, self.config.reward_cycle_length)
            .ok_or(ErrorCode::ContractNotActivated)
    }

    fn split_for(&self, amount: NativeAmount, cycle: RewardCycle) -> CommitmentSplit {
        split_commitment(
            amount,
            self.config.city_split_pct,
            self.state.stacking.is_active(cycle),
        )
    }

    /// Move a commitment out of `caller`. Zero legs are skipped; if the pool
    /// leg fails the city leg is reversed.
    fn settle_commitment(
        &mut self,
        caller: &Principal,
        to_city: NativeAmount,
        to_stackers: NativeAmount,
    ) -> EngineResult<()> {
        let city = self.config.city_wallet;
        let pool = self.config.stacking_pool;
        if to_city > 0 {
            self.chain
                .native_transfer(caller, &city, to_city)
                .map_err(|e| ledger_rejected("city transfer", e))?;
        }
        if to_stackers > 0 {
            if let Err(e) = self.chain.native_transfer(caller, &pool, to_stackers) {
                if to_city > 0 {
                    if let Err(undo) = self.chain.native_transfer(&city, caller, to_city) {
                        warn!(
                            target: "mining",
                            "Failed to refund {} from city wallet to {}: {}",
                            to_city,
                            caller,
                            undo
                        );
                    }
                }
                return Err(ledger_rejected("pool transfer", e));
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Read accessors
    // -------------------------------------------------------------------------

    /// Whether the engine is live at the current block.
    pub fn activation_status(&self) -> bool {
        self.state.gate.is_active(self.chain.block_height())
    }

    pub fn activation_block(&self) -> Option<BlockHeight> {
        self.state.gate.activation_block()
    }

    pub fn activation_threshold(&self) -> u64 {
        self.state.gate.threshold()
    }

    pub fn registered_users_count(&self) -> u64 {
        self.state.gate.registered_count()
    }

    /// Highest participant id handed out, including implicit ids.
    pub fn users_nonce(&self) -> u64 {
        self.state.registry.nonce()
    }

    pub fn user_id(&self, principal: &Principal) -> Option<ParticipantId> {
        self.state.registry.id_of(principal)
    }

    pub fn user(&self, id: ParticipantId) -> Option<Participant> {
        self.state.registry.participant(id)
    }

    /// Block reward for a block mined at `height`; zero before activation.
    pub fn coinbase_amount(&self, height: BlockHeight) -> TokenAmount {
        match self.state.gate.activation_block() {
            Some(activation) => coinbase_at_height(height, activation, &self.config.schedule),
            None => 0,
        }
    }

    pub fn reward_cycle(&self, height: BlockHeight) -> Option<RewardCycle> {
        self.state
            .gate
            .reward_cycle(height, self.config.reward_cycle_length)
    }

    pub fn current_reward_cycle(&self) -> Option<RewardCycle> {
        self.reward_cycle(self.chain.block_height())
    }

    pub fn first_block_in_reward_cycle(&self, cycle: RewardCycle) -> Option<BlockHeight> {
        self.state
            .gate
            .first_block_in_cycle(cycle, self.config.reward_cycle_length)
    }

    pub fn mining_stats_at_block(&self, height: BlockHeight) -> MiningStats {
        self.state.mining.stats(height)
    }

    pub fn miner_at_block(&self, height: BlockHeight, id: ParticipantId) -> Option<MinerEntry> {
        self.state.mining.miner(height, id)
    }

    pub fn has_mined_at_block(&self, height: BlockHeight, id: ParticipantId) -> bool {
        self.state.mining.has_mined(height, id)
    }

    pub fn last_high_value_at_block(&self, height: BlockHeight) -> u64 {
        self.state.mining.last_high_value(height)
    }

    /// Claimant of `height`, once the reward has been claimed.
    pub fn block_winner_id(&self, height: BlockHeight) -> Option<ParticipantId> {
        self.state.mining.record(height).and_then(|r| r.claimed_by)
    }

    /// Whether `principal` wins `height` under the oracle's seed. Ignores
    /// maturity and earlier claims.
    pub fn is_block_winner(&self, principal: &Principal, height: BlockHeight) -> bool {
        let Some(id) = self.state.registry.id_of(principal) else {
            return false;
        };
        let Some(record) = self.state.mining.record(height) else {
            return false;
        };
        let Some(seed) = self.oracle.seed_for(height) else {
            return false;
        };
        match select_winner(record, &seed) {
            Ok(winner) => {
                debug!(target: "mining", "Block {} evaluates to {}", height, winner.participant);
                winner.participant == id
            }
            Err(_) => false,
        }
    }

    /// Whether [`Self::claim_mining_reward`] would succeed right now.
    pub fn can_claim_mining_reward(&self, principal: &Principal, height: BlockHeight) -> bool {
        self.check_mining_claim(principal, height).is_ok()
    }

    pub fn stacking_stats_at_cycle_or_default(&self, cycle: RewardCycle) -> CycleStats {
        self.state.stacking.cycle_or_default(cycle)
    }

    pub fn stacker_at_cycle_or_default(&self, cycle: RewardCycle, id: ParticipantId) -> StackerRecord {
        self.state.stacking.stacker_or_default(id, cycle)
    }

    pub fn stacking_active_at_cycle(&self, cycle: RewardCycle) -> bool {
        self.state.stacking.is_active(cycle)
    }

    /// Native currency `principal` would receive for `cycle`; zero once
    /// claimed.
    pub fn entitled_stacking_reward(&self, principal: &Principal, cycle: RewardCycle) -> NativeAmount {
        match self.state.registry.id_of(principal) {
            Some(id) if !self.state.stacking.has_claimed(id, cycle) => {
                self.state.stacking.entitled_reward(id, cycle)
            }
            _ => 0,
        }
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.events
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn chain_mut(&mut self) -> &mut C {
        &mut self.chain
    }

    pub fn oracle(&self) -> &R {
        &self.oracle
    }

    pub fn oracle_mut(&mut self) -> &mut R {
        &mut self.oracle
    }

    pub fn tokens(&self) -> &T {
        &self.tokens
    }

    pub fn tokens_mut(&mut self) -> &mut T {
        &mut self.tokens
    }
}

fn log_rejection<V>(operation: &str, caller: &Principal, result: &EngineResult<V>) {
    if let Err(err) = result {
        warn!(
            target: "engine",
            "{} rejected for {}: {} (code {})",
            operation,
            caller,
            err,
            err.code()
        );
    }
}

fn ledger_rejected(operation: &str, err: LedgerError) -> ErrorCode {
    warn!(target: "engine", "Ledger refused {}: {}", operation, err);
    ErrorCode::LedgerRejected
}
