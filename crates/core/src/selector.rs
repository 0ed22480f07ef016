//! Winner selection
//!
//! The block seed is read as a big-endian 256-bit integer and reduced modulo
//! the block's total commitment. The miner whose sub-range contains the
//! result wins, so each miner's odds equal its share of the total.

use crate::errors::{EngineResult, ErrorCode};
use crate::mining::{MinerEntry, MiningRecord};
use citymine_types::{NativeAmount, Seed};
use num_bigint::BigUint;
use num_traits::ToPrimitive;
use tracing::debug;

/// `seed mod total`; `None` when nothing was committed.
pub fn winning_value(seed: &Seed, total: NativeAmount) -> Option<u64> {
    if total == 0 {
        return None;
    }
    let reduced = BigUint::from_bytes_be(seed) % BigUint::from(total);
    reduced.to_u64()
}

/// Entry whose sub-range contains `value`.
pub fn winner_for_value(entries: &[MinerEntry], value: u64) -> Option<&MinerEntry> {
    let index = entries.partition_point(|e| e.high_value <= value);
    entries.get(index).filter(|e| e.covers(value))
}

/// Winning entry of `record` under `seed`.
pub fn select_winner<'a>(record: &'a MiningRecord, seed: &Seed) -> EngineResult<&'a MinerEntry> {
    let value = winning_value(seed, record.total_commitment).ok_or(ErrorCode::NoMinersAtBlock)?;
    let winner = winner_for_value(&record.entries, value).ok_or(ErrorCode::NoMinersAtBlock)?;
    debug!(
        target: "mining",
        "Selected {} with value {} of {}",
        winner.participant,
        value,
        record.total_commitment
    );
    Ok(winner)
}
