use cosmwasm_schema::cw_serde;
use cosmwasm_std::Addr;
use cw_storage_plus::{Item, Map};

#[cw_serde]
pub struct Config {
    /// Manager to register and update chain entries
    pub manager: Addr,
}

/// The directory entry for one supported chain. Addresses of remote chains
/// are kept as plain strings since they follow the remote chain's address
/// format and cannot be validated here.
#[cw_serde]
pub struct ChainInfo {
    /// Address of the wrapped native token on that chain
    pub native_wrapper: String,
    /// Address of the lottery entry point contract on that chain
    pub entry_point: String,
    /// Address of the randomness consumer serving that chain
    pub consumer: String,
    /// Address of the reward token paid out on that chain
    pub reward_token: String,
}

pub const CONFIG: Item<Config> = Item::new("config");

/// Chain ID -> ChainInfo. Entries are never deleted, only updated.
pub const CHAINS: Map<u32, ChainInfo> = Map::new("chains");
