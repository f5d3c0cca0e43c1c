use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::HexBinary;

use crate::state::{Config, OracleJob};

#[cw_serde]
pub struct InstantiateMsg {
    pub manager: String,
    pub coordinator: Option<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Fulfills a queued request with verified random words. Only the
    /// configured coordinator can do this. Additional words beyond the
    /// first are accepted and ignored.
    SubmitRandomness {
        oracle_request_id: u64,
        random_words: Vec<HexBinary>,
    },
    /// Set the config
    SetConfig {
        manager: Option<String>,
        coordinator: Option<String>,
    },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Get the config state
    #[returns(ConfigResponse)]
    Config {},
    #[returns(JobResponse)]
    Job { oracle_request_id: u64 },
    #[returns(JobsResponse)]
    Jobs {
        /// The oracle request ID after which to start
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    /// Lifetime job/delivery counters, for monitoring
    #[returns(StatsResponse)]
    Stats {},
}

// We define a custom struct for each query response
pub type ConfigResponse = Config;

#[cw_serde]
pub struct JobResponse {
    pub job: Option<OracleJob>,
}

#[cw_serde]
pub struct QueriedJob {
    pub id: u64,
    pub job: OracleJob,
}

#[cw_serde]
pub struct JobsResponse {
    pub jobs: Vec<QueriedJob>,
}

#[cw_serde]
pub struct StatsResponse {
    /// Number of jobs ever queued. Oracle request IDs are monotonic, so
    /// this equals the last allocated ID.
    pub jobs: u64,
    /// Number of deliveries emitted
    pub deliveries: u64,
}
