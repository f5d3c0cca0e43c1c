use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Uint128};
use cw_storage_plus::{Item, Map};

use crate::distribution::DEFAULT_DISTRIBUTION_BPS;

#[cw_serde]
pub struct Config {
    pub manager: Addr,
    /// The randomness consumer allowed to resolve wins.
    /// As long as this is unset, noone can trigger a distribution.
    pub distributor: Option<Addr>,
    /// The lottery entry point allowed to register participants and to
    /// resolve fallback wins.
    pub lottery: Option<Addr>,
    /// Denom the jackpot is held and paid out in
    pub reward_denom: String,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// The active jackpot round. There is exactly one at any time; advancing
/// increments the index and carries the undistributed remainder forward.
#[cw_serde]
pub struct Round {
    /// Monotonic round index, starts at 0
    pub index: u64,
    /// The undistributed pool
    pub pool: Uint128,
    /// Number of participants registered in this round
    pub participants: u32,
    /// Fraction of the pool released per distribution
    pub distribution_bps: u64,
}

impl Round {
    pub fn genesis() -> Self {
        Round {
            index: 0,
            pool: Uint128::zero(),
            participants: 0,
            distribution_bps: DEFAULT_DISTRIBUTION_BPS,
        }
    }
}

pub const ROUND: Item<Round> = Item::new("round");

/// Participants registered per round, keyed by (round index, address).
/// "Clearing" the registry is advancing the round index.
pub const PARTICIPANTS: Map<(u64, &Addr), ()> = Map::new("participants");

/// Accumulated participation portions retained by the contract. Kept apart
/// from the round pool so that round continuity
/// (pool_after == pool_before - distribution_amount) holds exactly.
pub const PARTICIPATION_RESERVE: Item<Uint128> = Item::new("participation_reserve");
