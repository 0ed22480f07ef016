use citymine_core::prelude::*;
use citymine_core::EngineState;
use proptest::prelude::*;
use std::collections::HashMap;

// Property-based tests for the engine
// Random call sequences must keep every call all-or-nothing and the stacking
// books consistent

type Engine = MiningEngine<SimulatedChain, HashSeedOracle, InMemoryTokenLedger>;

const USERS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Register(usize),
    Mine(usize, u64),
    MineMany(usize, Vec<u64>),
    ClaimMining(usize, u64),
    Stack(usize, u64, u64),
    ClaimStacking(usize, u64),
    Advance(u64),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    let user = 0..USERS;
    prop_oneof![
        user.clone().prop_map(Op::Register),
        (user.clone(), 0u64..3_000).prop_map(|(u, a)| Op::Mine(u, a)),
        (user.clone(), prop::collection::vec(0u64..800, 0..5)).prop_map(|(u, a)| Op::MineMany(u, a)),
        (user.clone(), 0u64..20).prop_map(|(u, back)| Op::ClaimMining(u, back)),
        (user.clone(), 0u64..600, 0u64..5).prop_map(|(u, a, l)| Op::Stack(u, a, l)),
        (user, 0u64..8).prop_map(|(u, c)| Op::ClaimStacking(u, c)),
        (1u64..7).prop_map(Op::Advance),
    ]
}

fn users() -> Vec<Principal> {
    (0..USERS)
        .map(|i| Principal::from_label(&format!("prop-user-{i}")))
        .collect()
}

fn activated_engine(users: &[Principal]) -> Engine {
    let config = EngineConfig {
        activation_threshold: 2,
        reward_cycle_length: 5,
        maturity_window: 2,
        max_lock_cycles: 3,
        ..Default::default()
    };
    let mut engine = MiningEngine::new(
        config,
        SimulatedChain::new(0),
        HashSeedOracle::new("properties"),
        InMemoryTokenLedger::new(),
    )
    .unwrap();
    for user in users {
        engine.chain_mut().fund(user, 10_000).unwrap();
        engine.tokens_mut().mint(user, 1_000).unwrap();
    }
    engine.register_user(&users[0], None).unwrap();
    engine.register_user(&users[1], None).unwrap();
    let activation = engine.activation_block().unwrap();
    engine.chain_mut().advance_to(activation);
    engine
}

#[derive(Debug, PartialEq)]
struct Snapshot {
    state: EngineState,
    native: Vec<NativeAmount>,
    tokens: Vec<TokenAmount>,
    supply: TokenAmount,
    native_transfers: usize,
    events: usize,
}

fn snapshot(engine: &Engine, watched: &[Principal]) -> Snapshot {
    Snapshot {
        state: engine.state().clone(),
        native: watched.iter().map(|p| engine.chain().native_balance(p)).collect(),
        tokens: watched.iter().map(|p| engine.tokens().balance_of(p)).collect(),
        supply: engine.tokens().total_supply(),
        native_transfers: engine.chain().transfers().len(),
        events: engine.events().len(),
    }
}

fn apply(engine: &mut Engine, users: &[Principal], op: &Op) -> Option<EngineResult<bool>> {
    let result = match op {
        Op::Register(u) => engine.register_user(&users[*u], None),
        Op::Mine(u, amount) => engine.mine_tokens(&users[*u], *amount, None),
        Op::MineMany(u, amounts) => engine.mine_many(&users[*u], amounts),
        Op::ClaimMining(u, back) => {
            let height = engine.chain().block_height().saturating_sub(*back);
            engine.claim_mining_reward(&users[*u], height)
        }
        Op::Stack(u, amount, lock) => engine.stack_tokens(&users[*u], *amount, *lock),
        Op::ClaimStacking(u, cycle) => engine.claim_stacking_reward(&users[*u], *cycle),
        Op::Advance(blocks) => {
            engine.chain_mut().advance(*blocks);
            return None;
        }
    };
    Some(result)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn failed_calls_change_nothing(ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let users = users();
        let mut engine = activated_engine(&users);
        let mut watched = users.clone();
        watched.push(engine.config().city_wallet);
        watched.push(engine.config().stacking_pool);

        for op in &ops {
            let before = snapshot(&engine, &watched);
            if let Some(Err(err)) = apply(&mut engine, &users, op) {
                prop_assert_ne!(err, ErrorCode::LedgerRejected);
                prop_assert_eq!(snapshot(&engine, &watched), before);
            }
        }
    }

    #[test]
    fn stacked_tokens_are_returned_exactly_once(ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let users = users();
        let mut engine = activated_engine(&users);
        let mut stacked: HashMap<usize, TokenAmount> = HashMap::new();

        for op in &ops {
            if let (Op::Stack(u, amount, _), Some(Ok(_))) = (op, apply(&mut engine, &users, op)) {
                *stacked.entry(*u).or_default() += amount;
            }
        }

        for (u, user) in users.iter().enumerate() {
            let expected = stacked.get(&u).copied().unwrap_or(0);
            let returned = engine
                .user_id(user)
                .map(|id| engine.state().stacking.total_to_return(id))
                .unwrap_or(0);
            prop_assert_eq!(returned, expected);
        }
    }

    #[test]
    fn cycle_payouts_never_exceed_receipts(ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let users = users();
        let mut engine = activated_engine(&users);
        for op in &ops {
            apply(&mut engine, &users, op);
        }

        for cycle in 0..12u64 {
            let stats = engine.stacking_stats_at_cycle_or_default(cycle);
            let mut owed: NativeAmount = 0;
            let mut stacked: TokenAmount = 0;
            for user in &users {
                if let Some(id) = engine.user_id(user) {
                    owed += engine.state().stacking.entitled_reward(id, cycle);
                    stacked += engine.stacker_at_cycle_or_default(cycle, id).amount_stacked;
                }
            }
            prop_assert!(owed <= stats.total_commitment_received);
            prop_assert_eq!(stacked, stats.total_stacked);
        }
    }

    #[test]
    fn at_most_one_mint_per_block(ops in prop::collection::vec(arbitrary_op(), 1..80)) {
        let users = users();
        let mut engine = activated_engine(&users);
        let mut claimed: HashMap<BlockHeight, usize> = HashMap::new();

        for op in &ops {
            if let Op::ClaimMining(_, back) = op {
                let height = engine.chain().block_height().saturating_sub(*back);
                if let Some(Ok(_)) = apply(&mut engine, &users, op) {
                    *claimed.entry(height).or_default() += 1;
                }
            } else {
                apply(&mut engine, &users, op);
            }
        }

        prop_assert!(claimed.values().all(|n| *n == 1));
        let minted: TokenAmount = claimed
            .keys()
            .map(|height| engine.coinbase_amount(*height))
            .sum();
        prop_assert_eq!(engine.tokens().total_supply(), USERS as u64 * 1_000 + minted);
    }
}
