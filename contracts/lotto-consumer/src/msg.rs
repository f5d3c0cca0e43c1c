use cosmwasm_schema::{cw_serde, QueryResponses};

use crate::state::{Config, PendingRequest};

#[cw_serde]
pub struct InstantiateMsg {
    pub manager: String,
    /// Seconds between request retry attempts. Defaults to one hour.
    pub retry_delay: Option<u64>,
    /// Defaults to 3
    pub max_retries: Option<u32>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Creates a randomness request for one lottery entry. Only the
    /// configured lottery contract can do this.
    RequestRandomness { user: String, win_threshold_bps: u64 },
    /// Re-emits the request packet for a request that timed out or was
    /// created before the channel existed. Permissionless, but rate
    /// limited by the configured retry delay.
    RetryRequest { request_id: u64 },
    /// Removes a request that exhausted its retries. Manual intervention
    /// path, manager only.
    AbandonRequest { request_id: u64 },
    /// Set the config
    SetConfig {
        manager: Option<String>,
        lottery: Option<String>,
        jackpot: Option<String>,
        retry_delay: Option<u64>,
        max_retries: Option<u32>,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Get the config state
    #[returns(ConfigResponse)]
    Config {},
    /// Get the queried channel to the oracle chain
    #[returns(OracleChannelResponse)]
    OracleChannel {},
    #[returns(RequestResponse)]
    Request { request_id: u64 },
    #[returns(RequestsResponse)]
    Requests {
        /// The request ID after which to start
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Lifetime request/delivery counters, for monitoring
    #[returns(StatsResponse)]
    Stats {},
}

// We define a custom struct for each query response
pub type ConfigResponse = Config;

#[cw_serde]
pub struct OracleChannelResponse {
    /// The channel ID if it was set
    pub channel: Option<String>,
}

#[cw_serde]
pub struct RequestResponse {
    pub request: Option<PendingRequest>,
}

#[cw_serde]
pub struct QueriedRequest {
    pub id: u64,
    pub request: PendingRequest,
}

#[cw_serde]
pub struct RequestsResponse {
    pub requests: Vec<QueriedRequest>,
}

#[cw_serde]
pub struct StatsResponse {
    /// Number of requests ever created. Request IDs are monotonic, so
    /// this equals the last allocated ID.
    pub requests: u64,
    /// Number of deliveries processed
    pub deliveries: u64,
}
