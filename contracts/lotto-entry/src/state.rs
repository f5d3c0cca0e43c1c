use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct BoostConfig {
    /// Multiplier for users without locked voting power (>= 1.0x)
    pub base_bps: u64,
    /// Multiplier at 100% voting power share
    pub max_bps: u64,
}

#[cw_serde]
pub struct Config {
    pub manager: Addr,
    /// The swap/token layer contract allowed to report eligible swaps.
    /// As long as this is unset, noone can create entries.
    pub swap_trigger: Option<Addr>,
    /// The randomness consumer on this chain. As long as this is unset,
    /// qualifying swaps are stored as delayed entries.
    pub consumer: Option<Addr>,
    /// The voting escrow contract providing the voting power share.
    /// Unset means noone gets a boost.
    pub voting_escrow: Option<Addr>,
    /// The jackpot distributor used for chain-local settlement.
    pub jackpot: Option<Addr>,
    /// Denom of the wrapped native token the local jackpot is held in
    pub native_denom: String,
    /// Swaps below this amount do not create an entry
    pub min_swap_amount: Uint128,
    pub boost: BoostConfig,
    /// Seconds a delayed entry waits between retry attempts
    pub retry_delay: u64,
    /// Number of retries before a delayed entry is fallback-resolved
    /// or flagged for manual intervention
    pub max_retries: u32,
    /// Whether exhausted delayed entries are resolved with the local
    /// fallback randomness source. Requires `jackpot` to be set.
    pub fallback_enabled: bool,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// An entry that could not enter the randomness path when the swap happened.
#[cw_serde]
pub struct DelayedEntry {
    pub user: Addr,
    /// The swapped native amount the entry was earned with
    pub amount: Uint128,
    /// Point in time (block time) of the last registration/retry attempt
    pub registered_at: Timestamp,
    pub retry_count: u32,
}

/// A history of entries waiting for the randomness path.
/// This is a map from primary ID to the value.
pub const DELAYED_ENTRIES: Map<u64, DelayedEntry> = Map::new("delayed_entries");
/// The last used primary ID
pub const DELAYED_ENTRIES_LAST_ID: Item<u64> = Item::new("delayed_entries_id");

/// Funds accumulated for chain-local payouts, denominated in the
/// config's `native_denom`.
pub const JACKPOT_BALANCE: Item<Uint128> = Item::new("jackpot_balance");
