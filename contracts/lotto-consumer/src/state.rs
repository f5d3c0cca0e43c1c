use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Timestamp};
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    pub manager: Addr,
    /// The lottery entry point allowed to request randomness.
    /// As long as this is unset, noone can create requests.
    pub lottery: Option<Addr>,
    /// The jackpot distributor wins are settled against.
    pub jackpot: Option<Addr>,
    /// Seconds a request waits between retry attempts
    pub retry_delay: u64,
    /// Number of retries before a request is flagged for manual
    /// intervention
    pub max_retries: u32,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// The IBC channel to the oracle chain's requester contract, set once the
/// handshake completes.
pub const ORACLE_CHANNEL: Item<String> = Item::new("oracle_channel");

#[cw_serde]
pub enum RequestStatus {
    /// No request packet is currently in flight. The request waits for a
    /// channel or for a retry after a timeout.
    AwaitingRelay,
    /// A request packet was emitted and we wait for the delivery packet.
    AwaitingFulfillment,
}

/// A randomness request that was not fulfilled yet. Fulfilled requests are
/// removed, which makes duplicate deliveries no-ops.
#[cw_serde]
pub struct PendingRequest {
    pub user: Addr,
    /// Win threshold in basis points: the entry wins if the sampled value
    /// in [1, 10000] is less than or equal to this.
    pub win_threshold_bps: u64,
    pub created_at: Timestamp,
    /// Point in time (block time) of the last packet emission attempt
    pub last_attempt: Timestamp,
    pub retries: u32,
    pub status: RequestStatus,
}

/// A map from request ID to the pending request. IDs are never reused.
pub const REQUESTS: Map<u64, PendingRequest> = Map::new("requests");
/// The last used request ID
pub const REQUESTS_LAST_ID: Item<u64> = Item::new("requests_id");

/// Number of deliveries processed, for monitoring
pub const DELIVERIES_COUNT: Item<u64> = Item::new("deliveries_count");
