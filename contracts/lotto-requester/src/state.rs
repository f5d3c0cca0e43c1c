use cosmwasm_schema::cw_serde;
use cosmwasm_std::Addr;
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    pub manager: Addr,
    /// The off-chain randomness coordinator allowed to submit random words.
    /// As long as this is unset, noone can fulfill requests.
    pub coordinator: Option<Addr>,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// A queued randomness request waiting for the coordinator. Fulfilled jobs
/// are removed, so every job is delivered at most once.
#[cw_serde]
pub struct OracleJob {
    /// The consumer-assigned request ID, echoed back in the delivery
    pub request_id: u64,
    /// The channel the request came in on and the delivery goes out on
    pub channel: String,
}

/// A map from oracle request ID to the job
pub const JOBS: Map<u64, OracleJob> = Map::new("jobs");
/// The last used oracle request ID
pub const JOBS_LAST_ID: Item<u64> = Item::new("jobs_id");

/// Number of deliveries emitted, for monitoring
pub const DELIVERIES_COUNT: Item<u64> = Item::new("deliveries_count");
