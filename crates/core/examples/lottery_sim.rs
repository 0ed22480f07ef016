//! Lottery simulation over the in-memory chain
//!
//! Registers a set of miners, activates the engine and plays a few reward
//! cycles: random commitments every block, winners claiming once blocks
//! mature, and winners stacking part of their tokens for the next cycles.
//!
//! ```text
//! RUST_LOG=mining=info cargo run -p citymine-core --example lottery_sim -- --cycles 2
//! ```

use anyhow::{Context, Result};
use citymine_core::prelude::*;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "lottery_sim", about = "Simulate the mining lottery and stacking cycles")]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of miners
    #[arg(long, default_value_t = 5)]
    miners: usize,

    /// Reward cycles to simulate after activation
    #[arg(long, default_value_t = 3)]
    cycles: u64,

    /// RNG seed for commitments
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Print the event log as JSON lines
    #[arg(long)]
    json: bool,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = EngineConfig::load(cli.config.as_deref())?;
    let maturity = config.maturity_window;
    let threshold = config.activation_threshold as usize;
    let miner_count = cli.miners.max(threshold);

    let miners: Vec<Principal> = (0..miner_count)
        .map(|i| Principal::from_label(&format!("miner-{i}")))
        .collect();

    let mut engine: SimulatedEngine = MiningEngine::new(
        config,
        SimulatedChain::new(1),
        HashSeedOracle::new("lottery-sim"),
        InMemoryTokenLedger::new(),
    )
    .context("invalid engine configuration")?;

    for miner in &miners {
        engine
            .chain_mut()
            .fund(miner, 1_000_000_000)
            .context("failed to fund miner")?;
    }
    for miner in miners.iter().take(threshold) {
        engine.register_user(miner, None)?;
    }
    let activation = engine
        .activation_block()
        .context("activation was not scheduled")?;
    engine.chain_mut().advance_to(activation);
    info!("Engine activates at block {}", activation);

    let end = engine
        .first_block_in_reward_cycle(cli.cycles)
        .context("cycle range overflows block heights")?;
    let mut rng = StdRng::seed_from_u64(cli.seed);

    while engine.chain().block_height() < end {
        let height = engine.chain().block_height();

        for miner in &miners {
            if rng.gen_bool(0.6) {
                let amount = rng.gen_range(1..=1_000);
                engine.mine_tokens(miner, amount, None).ok();
            }
        }

        if let Some(mined_at) = height.checked_sub(maturity) {
            for miner in &miners {
                if engine.can_claim_mining_reward(miner, mined_at) {
                    engine.claim_mining_reward(miner, mined_at)?;
                    let tokens = engine.tokens().balance_of(miner);
                    let lock = rng.gen_range(1..=3);
                    engine.stack_tokens(miner, tokens / 2, lock).ok();
                }
            }
        }

        let next = engine.chain_mut().advance(1);
        if engine.first_block_in_reward_cycle(engine.current_reward_cycle().unwrap_or(0)) == Some(next) {
            if let Some(finished) = engine.current_reward_cycle().and_then(|c| c.checked_sub(1)) {
                for miner in &miners {
                    engine.claim_stacking_reward(miner, finished).ok();
                }
            }
        }
    }

    if cli.json {
        for event in engine.events() {
            println!("{}", serde_json::to_string(event)?);
        }
    }

    let city = engine.config().city_wallet;
    let pool = engine.config().stacking_pool;
    println!("Simulated {} cycles from block {} to {}", cli.cycles, activation, end);
    println!("  tokens minted:   {}", engine.tokens().total_supply());
    println!("  city wallet:     {}", engine.chain().native_balance(&city));
    println!("  stacking pool:   {}", engine.chain().native_balance(&pool));
    for miner in &miners {
        println!(
            "  {:>4} native={:>12} tokens={:>10}",
            engine
                .user_id(miner)
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".into()),
            engine.chain().native_balance(miner),
            engine.tokens().balance_of(miner)
        );
    }
    Ok(())
}
