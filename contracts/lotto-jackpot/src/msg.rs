use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, HexBinary, Uint128};

use crate::state::{Config, Round};

#[cw_serde]
pub struct InstantiateMsg {
    pub manager: String,
    /// Denom the jackpot is held and paid out in
    pub reward_denom: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Adds the sent funds to the undistributed pool. Permissionless.
    AddToJackpot {},
    /// Registers a participant for the current round. Idempotent.
    RegisterParticipant { user: String },
    /// Updates the per-round release fraction. Bounded to [59%, 79%].
    UpdateDistributionPercentage { percentage_bps: u64 },
    /// Releases the projected distribution amount: pays the main prize,
    /// splits the secondary pool by the given relative weights, retains
    /// the participation portion and advances the round.
    DistributeJackpot {
        main_winner: String,
        secondary_winners: Vec<String>,
        secondary_shares: Vec<u64>,
    },
    /// Called by the randomness consumer (or the entry point's fallback
    /// path) when an entry won. Secondary winners are drawn from the
    /// registered participants using the provided randomness.
    ResolveWin {
        winner: String,
        randomness: HexBinary,
    },
    /// Set the config
    SetConfig {
        manager: Option<String>,
        distributor: Option<String>,
        lottery: Option<String>,
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
    /// The active round
    #[returns(RoundResponse)]
    Round {},
    /// The projected split if a distribution happened now
    #[returns(ProjectionResponse)]
    Projection {},
    #[returns(ParticipantsResponse)]
    Participants {
        /// The address after which to start
        start_after: Option<String>,
        limit: Option<u32>,
    },
    #[returns(ParticipationReserveResponse)]
    ParticipationReserve {},
}

// We define a custom struct for each query response
pub type ConfigResponse = Config;

pub type RoundResponse = Round;

#[cw_serde]
pub struct ProjectionResponse {
    pub distribution_amount: Uint128,
    pub main_prize_bps: u64,
    pub secondary_prize_bps: u64,
    pub participation_bps: u64,
}

#[cw_serde]
pub struct ParticipantsResponse {
    pub participants: Vec<Addr>,
}

#[cw_serde]
pub struct ParticipationReserveResponse {
    pub reserve: Uint128,
}
