//! Stacking and the cycle payout flow.

use citymine_core::prelude::*;

type Engine = MiningEngine<SimulatedChain, FixedSeedOracle, InMemoryTokenLedger>;

const CYCLE: u64 = 100;

struct Scenario {
    engine: Engine,
    activation: BlockHeight,
    city: Principal,
    pool: Principal,
}

fn scenario(stackers: &[(Principal, TokenAmount)]) -> Scenario {
    let config = EngineConfig {
        activation_threshold: 1,
        reward_cycle_length: CYCLE,
        maturity_window: 10,
        ..Default::default()
    };
    let (city, pool) = (config.city_wallet, config.stacking_pool);
    let mut engine = MiningEngine::new(
        config,
        SimulatedChain::new(0),
        FixedSeedOracle::new(),
        InMemoryTokenLedger::new(),
    )
    .unwrap();

    engine
        .register_user(&Principal::from_label("founder"), None)
        .unwrap();
    let activation = engine.activation_block().unwrap();
    engine.chain_mut().advance_to(activation);
    for (who, amount) in stackers {
        engine.tokens_mut().mint(who, *amount).unwrap();
    }

    Scenario {
        engine,
        activation,
        city,
        pool,
    }
}

impl Scenario {
    fn go_to_cycle(&mut self, cycle: RewardCycle) {
        let first = self.engine.first_block_in_reward_cycle(cycle).unwrap();
        self.engine.chain_mut().advance_to(first);
    }
}

#[test]
fn single_stacker_collects_the_pool_share() {
    let alice = Principal::from_label("alice");
    let bob = Principal::from_label("bob");
    let mut s = scenario(&[(alice, 500)]);

    s.engine.stack_tokens(&alice, 500, 1).unwrap();
    assert_eq!(s.engine.tokens().balance_of(&alice), 0);
    assert_eq!(s.engine.tokens().balance_of(&s.pool), 500);

    s.go_to_cycle(1);
    assert!(s.engine.stacking_active_at_cycle(1));
    s.engine.chain_mut().fund(&bob, 200).unwrap();
    s.engine.mine_tokens(&bob, 200, None).unwrap();

    assert_eq!(s.engine.chain().native_balance(&s.city), 60);
    assert_eq!(s.engine.chain().native_balance(&s.pool), 140);
    assert_eq!(
        s.engine
            .stacking_stats_at_cycle_or_default(1)
            .total_commitment_received,
        140
    );
    assert_eq!(s.engine.entitled_stacking_reward(&alice, 1), 140);

    assert_eq!(
        s.engine.claim_stacking_reward(&alice, 1),
        Err(ErrorCode::RewardCycleNotCompleted)
    );
    s.go_to_cycle(2);
    assert_eq!(s.engine.claim_stacking_reward(&alice, 1), Ok(true));

    assert_eq!(s.engine.chain().native_balance(&alice), 140);
    assert_eq!(s.engine.tokens().balance_of(&alice), 500);
    assert_eq!(s.engine.chain().native_balance(&s.pool), 0);
    assert_eq!(s.engine.tokens().balance_of(&s.pool), 0);
    assert_eq!(s.engine.entitled_stacking_reward(&alice, 1), 0);
    assert_eq!(
        s.engine.claim_stacking_reward(&alice, 1),
        Err(ErrorCode::NothingToRedeem)
    );
}

#[test]
fn stacking_in_the_current_cycle_does_not_split_it() {
    let alice = Principal::from_label("alice");
    let bob = Principal::from_label("bob");
    let mut s = scenario(&[(alice, 100)]);
    s.engine.chain_mut().fund(&bob, 100).unwrap();

    s.engine.stack_tokens(&alice, 100, 1).unwrap();
    s.engine.mine_tokens(&bob, 100, None).unwrap();

    assert_eq!(s.engine.reward_cycle(s.activation), Some(0));
    assert_eq!(s.engine.chain().native_balance(&s.city), 100);
    assert_eq!(s.engine.chain().native_balance(&s.pool), 0);
}

#[test]
fn rewards_are_shared_pro_rata() {
    let alice = Principal::from_label("alice");
    let carol = Principal::from_label("carol");
    let bob = Principal::from_label("bob");
    let mut s = scenario(&[(alice, 100), (carol, 200)]);

    s.engine.stack_tokens(&alice, 100, 2).unwrap();
    s.engine.stack_tokens(&carol, 200, 1).unwrap();

    s.go_to_cycle(1);
    s.engine.chain_mut().fund(&bob, 1_000).unwrap();
    s.engine.mine_tokens(&bob, 1_000, None).unwrap();
    // 700 to the pool, split 1:2
    s.go_to_cycle(2);

    assert_eq!(s.engine.entitled_stacking_reward(&alice, 1), 233);
    assert_eq!(s.engine.entitled_stacking_reward(&carol, 1), 466);

    s.engine.claim_stacking_reward(&carol, 1).unwrap();
    assert_eq!(s.engine.chain().native_balance(&carol), 466);
    assert_eq!(s.engine.tokens().balance_of(&carol), 200);

    // alice's lock runs one more cycle: reward now, principal later
    s.engine.claim_stacking_reward(&alice, 1).unwrap();
    assert_eq!(s.engine.chain().native_balance(&alice), 233);
    assert_eq!(s.engine.tokens().balance_of(&alice), 0);
    assert_eq!(s.engine.chain().native_balance(&s.pool), 1);

    let id = s.engine.user_id(&alice).unwrap();
    let record = s.engine.stacker_at_cycle_or_default(2, id);
    assert_eq!(record.amount_stacked, 100);
    assert_eq!(record.to_return, 100);

    assert_eq!(
        s.engine.claim_stacking_reward(&alice, 2),
        Err(ErrorCode::RewardCycleNotCompleted)
    );
    s.go_to_cycle(3);
    s.engine.claim_stacking_reward(&alice, 2).unwrap();
    assert_eq!(s.engine.tokens().balance_of(&alice), 100);
}

#[test]
fn mine_many_splits_per_block_cycle() {
    let alice = Principal::from_label("alice");
    let bob = Principal::from_label("bob");
    let mut s = scenario(&[(alice, 10)]);
    s.engine.stack_tokens(&alice, 10, 1).unwrap();

    // two blocks in cycle 0 (no stackers), two in cycle 1
    let first_of_cycle_1 = s.engine.first_block_in_reward_cycle(1).unwrap();
    s.engine.chain_mut().advance_to(first_of_cycle_1 - 2);
    s.engine.chain_mut().fund(&bob, 400).unwrap();
    s.engine.mine_many(&bob, &[100, 100, 100, 100]).unwrap();

    assert_eq!(s.engine.chain().native_balance(&s.city), 260);
    assert_eq!(s.engine.chain().native_balance(&s.pool), 140);
    assert_eq!(s.engine.chain().transfers().len(), 2);
    assert_eq!(
        s.engine
            .stacking_stats_at_cycle_or_default(1)
            .total_commitment_received,
        140
    );
    assert_eq!(
        s.engine
            .mining_stats_at_block(first_of_cycle_1)
            .amount_to_stackers,
        70
    );
}

#[test]
fn unknown_claimant_is_rejected() {
    let mut s = scenario(&[]);
    s.go_to_cycle(3);
    assert_eq!(
        s.engine
            .claim_stacking_reward(&Principal::from_label("stranger"), 1),
        Err(ErrorCode::UserIdNotFound)
    );
}
