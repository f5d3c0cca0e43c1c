use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::Uint128;

use crate::state::{BoostConfig, Config, DelayedEntry};

#[cw_serde]
pub struct InstantiateMsg {
    pub manager: String,
    /// Denom of the wrapped native token on this chain
    pub native_denom: String,
    pub min_swap_amount: Uint128,
    /// Defaults to 1.0x base / 2.5x max when unset
    pub boost: Option<BoostConfig>,
    /// Seconds between delayed entry retry attempts. Defaults to one hour.
    pub retry_delay: Option<u64>,
    /// Defaults to 3
    pub max_retries: Option<u32>,
    pub fallback_enabled: bool,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Reported by the swap layer for every qualifying swap.
    /// Never errors for amounts below the minimum so that the swap itself
    /// cannot be reverted by the lottery.
    OnEligibleSwap { user: String, amount: Uint128 },
    /// Processes delayed entries that waited at least the retry delay.
    /// Permissionless.
    RetryDelayedEntries { limit: Option<u32> },
    /// Removes a delayed entry that exhausted its retries. Manual
    /// intervention path, manager only.
    AbandonDelayedEntry { id: u64 },
    /// Adds the sent funds to the chain-local jackpot balance.
    AddToJackpot {},
    /// Moves the accumulated local jackpot balance into the configured
    /// jackpot distributor. Manager only.
    ForwardJackpot {},
    /// Set the config
    SetConfig {
        manager: Option<String>,
        swap_trigger: Option<String>,
        consumer: Option<String>,
        voting_escrow: Option<String>,
        jackpot: Option<String>,
        min_swap_amount: Option<Uint128>,
        boost: Option<BoostConfig>,
        retry_delay: Option<u64>,
        max_retries: Option<u32>,
        fallback_enabled: Option<bool>,
    },
    /// Emergency recovery of stranded balances. Manager only.
    Withdraw {
        denom: String,
        amount: Option<Uint128>,
        address: String,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Get the config state
    #[returns(ConfigResponse)]
    Config {},
    #[returns(JackpotBalanceResponse)]
    JackpotBalance {},
    #[returns(DelayedEntryResponse)]
    DelayedEntry { id: u64 },
    #[returns(DelayedEntriesResponse)]
    DelayedEntries {
        /// The entry ID after which to start
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Simulates the boost multiplier for a voting power share
    #[returns(BoostResponse)]
    Boost { share_bps: u64 },
    /// Simulates the win probability for a swap amount and an optional
    /// voting power share
    #[returns(ProbabilityResponse)]
    Probability {
        amount: Uint128,
        share_bps: Option<u64>,
    },
}

// We define a custom struct for each query response
pub type ConfigResponse = Config;

#[cw_serde]
pub struct JackpotBalanceResponse {
    pub balance: Uint128,
}

#[cw_serde]
pub struct DelayedEntryResponse {
    pub entry: Option<DelayedEntry>,
}

#[cw_serde]
pub struct QueriedDelayedEntry {
    pub id: u64,
    pub entry: DelayedEntry,
}

#[cw_serde]
pub struct DelayedEntriesResponse {
    pub entries: Vec<QueriedDelayedEntry>,
}

#[cw_serde]
pub struct BoostResponse {
    pub multiplier_bps: u64,
}

#[cw_serde]
pub struct ProbabilityResponse {
    pub base_bps: u64,
    pub multiplier_bps: u64,
    pub effective_bps: u64,
}

/// Query interface this contract expects from the external voting escrow
/// contract. Only the output of the escrow accounting is consumed.
#[cw_serde]
pub enum VotingEscrowQueryMsg {
    VotingPowerShare { user: String },
}

#[cw_serde]
pub struct VotingPowerShareResponse {
    /// Locked amount / total locked supply in basis points
    pub share_bps: u64,
}
