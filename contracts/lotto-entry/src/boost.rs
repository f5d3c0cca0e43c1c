//! The boost curve: a concave (cubic root) multiplier on the win probability
//! derived from a participant's share of the total locked voting power.
//! Early locking yields disproportionate benefit; returns diminish at
//! high share.

/// Fixed point scale for shares and multipliers. 10_000 == 1.0
pub const BOOST_PRECISION: u64 = 10_000;

/// The base multiplier must not punish users, so 1.0x is the floor.
pub const MIN_BASE_BOOST_BPS: u64 = 10_000;

/// Hard ceiling for the configurable max multiplier (5.0x).
pub const MAX_BOOST_CEILING_BPS: u64 = 50_000;

/// Cube root in `BOOST_PRECISION` fixed point, i.e.
/// `cubic_root(x) == BOOST_PRECISION * (x/BOOST_PRECISION)^(1/3)` rounded down.
///
/// `cubic_root(0) == 0` and `cubic_root(BOOST_PRECISION) == BOOST_PRECISION`
/// hold exactly; everything in between is accurate to the integer floor.
pub fn cubic_root(x: u64) -> u64 {
    // Shift into the cube of the target scale, then take the integer root.
    let value = (x as u128) * (BOOST_PRECISION as u128) * (BOOST_PRECISION as u128);
    integer_cbrt(value) as u64
}

/// Floor of the cube root of an integer, via Newton's method with a
/// final floor correction.
fn integer_cbrt(value: u128) -> u128 {
    if value == 0 {
        return 0;
    }
    // Initial guess: 2^ceil(bits/3) >= cbrt(value)
    let bits = 128 - value.leading_zeros();
    let mut x: u128 = 1u128 << bits.div_ceil(3);
    loop {
        let next = (2 * x + value / (x * x)) / 3;
        if next >= x {
            break;
        }
        x = next;
    }
    // Newton can stop one step above the floor
    while x * x * x > value {
        x -= 1;
    }
    x
}

/// Maps a voting power share (in `BOOST_PRECISION`, clamped to [0, 1.0])
/// to a probability multiplier in `[base_bps, max_bps]`.
pub fn calculate_boost(share_bps: u64, base_bps: u64, max_bps: u64) -> u64 {
    debug_assert!(base_bps <= max_bps);
    let share = share_bps.min(BOOST_PRECISION);
    let boosted = base_bps + (max_bps - base_bps) * cubic_root(share) / BOOST_PRECISION;
    boosted.clamp(base_bps, max_bps)
}
