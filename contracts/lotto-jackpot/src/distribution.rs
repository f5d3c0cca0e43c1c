//! The per-round payout math: how much of the pool is released and how the
//! release is split between the main prize, the secondary prize pool and the
//! participation reserve.
//!
//! The main prize fraction follows a stableswap-like invariant ("Hermes
//! curve") evaluated at the distribution amount, normalized into [0, 1] and
//! mapped into the configured main prize band. Larger participant counts
//! shift value from the main prize towards the secondary pool.

use cosmwasm_std::{Uint128, Uint256};

/// Fixed point scale for all fractions. 10_000 == 100%
pub const PERCENT_PRECISION: u64 = 10_000;

/// Bounds for the per-round release fraction
pub const MIN_DISTRIBUTION_BPS: u64 = 5_900;
pub const MAX_DISTRIBUTION_BPS: u64 = 7_900;
pub const DEFAULT_DISTRIBUTION_BPS: u64 = 6_900;

/// Bounds for the main prize fraction of the released amount
pub const MIN_MAIN_PRIZE_BPS: u64 = 7_000;
pub const MAX_MAIN_PRIZE_BPS: u64 = 9_500;

/// Share of the non-main remainder that goes to secondary prizes (the rest
/// is the participation reserve)
const SECONDARY_SHARE_BPS: u64 = 8_000;

/// Hermes curve amplification and exponent
const HERMES_D: u32 = 100;
const HERMES_N: u32 = 10;

/// Participant discount: 0.3% per participant above a threshold of 10,
/// capped at 30%
const PARTICIPANT_FACTOR_STEP_BPS: u64 = 30;
const PARTICIPANT_FACTOR_CAP_BPS: u64 = 3_000;
const PARTICIPANT_FACTOR_THRESHOLD: u32 = 10;

/// The derived split for one distribution. Recomputed from the current pool
/// size and participant count; never persisted.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Projection {
    pub distribution_amount: Uint128,
    pub main_prize_bps: u64,
    pub secondary_prize_bps: u64,
    pub participation_bps: u64,
}

/// Computes the projected split for the given pool, participant count and
/// release fraction. The three fractions always sum to exactly
/// `PERCENT_PRECISION`.
pub fn project(pool: Uint128, participants: u32, distribution_bps: u64) -> Projection {
    let distribution_amount = pool.multiply_ratio(distribution_bps, PERCENT_PRECISION);

    let normalized = hermes_normalized_bps(distribution_amount);
    let mut main = MIN_MAIN_PRIZE_BPS
        + normalized * (MAX_MAIN_PRIZE_BPS - MIN_MAIN_PRIZE_BPS) / PERCENT_PRECISION;

    if participants > PARTICIPANT_FACTOR_THRESHOLD {
        let factor =
            (participants as u64 * PARTICIPANT_FACTOR_STEP_BPS).min(PARTICIPANT_FACTOR_CAP_BPS);
        main = main * (PERCENT_PRECISION - factor) / PERCENT_PRECISION;
    }
    let main = main.clamp(MIN_MAIN_PRIZE_BPS, MAX_MAIN_PRIZE_BPS);

    let secondary = (PERCENT_PRECISION - main) * SECONDARY_SHARE_BPS / PERCENT_PRECISION;
    let participation = PERCENT_PRECISION - main - secondary;

    Projection {
        distribution_amount,
        main_prize_bps: main,
        secondary_prize_bps: secondary,
        participation_bps: participation,
    }
}

/// Evaluates the Hermes curve at `x` and normalizes the result into
/// basis points: `h(x) * 10000 / (x + h(x))`.
///
/// `h(x) = c1 - c2` with `c1 = cbrt(x^4 + D^(N+2) / (N^(N+1) * x))` and
/// `c2 = x^2 / (3 c1)`. For `x = 0` the value is 0. For amounts so large
/// that `x^4` no longer fits into 256 bits the curve is deep in its
/// asymptote where the normalized value is 1.
fn hermes_normalized_bps(x: Uint128) -> u64 {
    if x.is_zero() {
        return 0;
    }
    let x = Uint256::from(x);

    let x2 = x * x;
    let Ok(x4) = x2.checked_mul(x2) else {
        return PERCENT_PRECISION;
    };

    // D^(N+2) and N^(N+1) are compile-time-ish constants well within range
    let d_pow = Uint256::from(HERMES_D).pow(HERMES_N + 2);
    let n_pow = Uint256::from(HERMES_N).pow(HERMES_N + 1);
    let d_term = d_pow / (n_pow * x);

    let Ok(radicand) = x4.checked_add(d_term) else {
        return PERCENT_PRECISION;
    };
    let c1 = integer_cbrt(radicand);
    if c1.is_zero() {
        return 0;
    }
    let c2 = x2 / (Uint256::from(3u32) * c1);
    let h = c1.checked_sub(c2).unwrap_or_default();

    let normalized = h * Uint256::from(PERCENT_PRECISION) / (x + h);
    // h < x + h, so this always fits
    Uint128::try_from(normalized).map(|v| v.u128()).unwrap_or_default() as u64
}

/// Floor of the cube root via binary search. The result of any 256 bit
/// input fits into 86 bits.
fn integer_cbrt(value: Uint256) -> Uint256 {
    if value.is_zero() {
        return Uint256::zero();
    }
    let mut low = Uint256::one();
    let mut high = Uint256::one() << 86;
    while low < high {
        let mid = (low + high + Uint256::one()) >> 1;
        let cubed = mid
            .checked_mul(mid)
            .and_then(|sq| sq.checked_mul(mid))
            .ok();
        match cubed {
            Some(c) if c <= value => low = mid,
            _ => high = mid - Uint256::one(),
        }
    }
    low
}
