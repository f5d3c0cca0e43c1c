#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    ensure_eq, to_json_binary, Deps, DepsMut, Empty, Env, MessageInfo, Order, QueryResponse,
    Response, StdResult,
};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::msg::{
    ChainResponse, ChainsResponse, ConfigResponse, ExecuteMsg, InstantiateMsg, QueriedChain,
    QueryMsg,
};
use crate::state::{ChainInfo, Config, CHAINS, CONFIG};

const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    cw2::set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    let manager = deps.api.addr_validate(&msg.manager)?;
    CONFIG.save(deps.storage, &Config { manager })?;
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: Empty) -> StdResult<Response> {
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::RegisterChain { chain_id, info: chain_info } => {
            execute_register_chain(deps, info, chain_id, chain_info)
        }
        ExecuteMsg::UpdateChain { chain_id, info: chain_info } => {
            execute_update_chain(deps, info, chain_id, chain_info)
        }
        ExecuteMsg::SetConfig { manager } => execute_set_config(deps, info, manager),
    }
}

fn ensure_manager(deps: Deps, info: &MessageInfo) -> Result<(), ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);
    Ok(())
}

/// A directory entry pointing at nothing breaks lookups at runtime,
/// so we reject empty fields at configuration time.
fn validate_chain_info(info: &ChainInfo) -> Result<(), ContractError> {
    if info.native_wrapper.is_empty() {
        return Err(ContractError::EmptyAddress {
            field: "native_wrapper",
        });
    }
    if info.entry_point.is_empty() {
        return Err(ContractError::EmptyAddress {
            field: "entry_point",
        });
    }
    if info.consumer.is_empty() {
        return Err(ContractError::EmptyAddress { field: "consumer" });
    }
    if info.reward_token.is_empty() {
        return Err(ContractError::EmptyAddress {
            field: "reward_token",
        });
    }
    Ok(())
}

fn execute_register_chain(
    deps: DepsMut,
    info: MessageInfo,
    chain_id: u32,
    chain_info: ChainInfo,
) -> Result<Response, ContractError> {
    ensure_manager(deps.as_ref(), &info)?;
    validate_chain_info(&chain_info)?;

    if CHAINS.has(deps.storage, chain_id) {
        return Err(ContractError::ChainAlreadyRegistered { chain_id });
    }
    CHAINS.save(deps.storage, chain_id, &chain_info)?;

    Ok(Response::new()
        .add_attribute("action", "register_chain")
        .add_attribute("chain_id", chain_id.to_string()))
}

fn execute_update_chain(
    deps: DepsMut,
    info: MessageInfo,
    chain_id: u32,
    chain_info: ChainInfo,
) -> Result<Response, ContractError> {
    ensure_manager(deps.as_ref(), &info)?;
    validate_chain_info(&chain_info)?;

    if !CHAINS.has(deps.storage, chain_id) {
        return Err(ContractError::ChainNotFound { chain_id });
    }
    CHAINS.save(deps.storage, chain_id, &chain_info)?;

    Ok(Response::new()
        .add_attribute("action", "update_chain")
        .add_attribute("chain_id", chain_id.to_string()))
}

fn execute_set_config(
    deps: DepsMut,
    info: MessageInfo,
    manager: Option<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    let manager = match manager {
        Some(ma) => deps.api.addr_validate(&ma)?,
        None => config.manager,
    };
    CONFIG.save(deps.storage, &Config { manager })?;

    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<QueryResponse> {
    let response = match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?)?,
        QueryMsg::Chain { chain_id } => to_json_binary(&query_chain(deps, chain_id)?)?,
        QueryMsg::Chains { start_after, limit } => {
            to_json_binary(&query_chains(deps, start_after, limit)?)?
        }
    };
    Ok(response)
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(config)
}

fn query_chain(deps: Deps, chain_id: u32) -> StdResult<ChainResponse> {
    let info = CHAINS.may_load(deps.storage, chain_id)?;
    Ok(ChainResponse { info })
}

// Queries limits
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

fn query_chains(
    deps: Deps,
    start_after: Option<u32>,
    limit: Option<u32>,
) -> StdResult<ChainsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    let chains: Vec<QueriedChain> = CHAINS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|res| res.map(|(chain_id, info)| QueriedChain { chain_id, info }))
        .collect::<StdResult<_>>()?;
    Ok(ChainsResponse { chains })
}
