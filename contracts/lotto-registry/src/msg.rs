use cosmwasm_schema::{cw_serde, QueryResponses};

use crate::state::{ChainInfo, Config};

#[cw_serde]
pub struct InstantiateMsg {
    pub manager: String,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Adds a new chain to the directory. Fails if the chain ID is taken.
    RegisterChain { chain_id: u32, info: ChainInfo },
    /// Replaces the info of an already registered chain.
    UpdateChain { chain_id: u32, info: ChainInfo },
    /// Set the config
    SetConfig { manager: Option<String> },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Get the config state
    #[returns(ConfigResponse)]
    Config {},
    /// Looks up a single chain. Missing chains are an explicit None,
    /// not an error.
    #[returns(ChainResponse)]
    Chain { chain_id: u32 },
    #[returns(ChainsResponse)]
    Chains {
        /// The chain ID after which to start
        start_after: Option<u32>,
        limit: Option<u32>,
    },
}

// We define a custom struct for each query response
pub type ConfigResponse = Config;

#[cw_serde]
pub struct ChainResponse {
    pub info: Option<ChainInfo>,
}

#[cw_serde]
pub struct QueriedChain {
    pub chain_id: u32,
    pub info: ChainInfo,
}

#[cw_serde]
pub struct ChainsResponse {
    pub chains: Vec<QueriedChain>,
}
