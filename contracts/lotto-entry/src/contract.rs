#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    ensure_eq, to_json_binary, Addr, BankMsg, Coin, CosmosMsg, Deps, DepsMut, Empty, Env, Event,
    HexBinary, MessageInfo, Order, QueryResponse, Response, StdResult, Uint128, WasmMsg,
};
use cw_storage_plus::Bound;
use nois::int_in_range;
use sha2::{Digest, Sha256};

use crate::boost::{calculate_boost, MAX_BOOST_CEILING_BPS, MIN_BASE_BOOST_BPS};
use crate::error::ContractError;
use crate::msg::{
    BoostResponse, ConfigResponse, DelayedEntriesResponse, DelayedEntryResponse, ExecuteMsg,
    InstantiateMsg, JackpotBalanceResponse, ProbabilityResponse, QueriedDelayedEntry, QueryMsg,
    VotingEscrowQueryMsg, VotingPowerShareResponse,
};
use crate::probability::{base_probability_bps, effective_probability_bps};
use crate::state::{
    BoostConfig, Config, DelayedEntry, CONFIG, DELAYED_ENTRIES, DELAYED_ENTRIES_LAST_ID,
    JACKPOT_BALANCE,
};

const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_RETRY_DELAY: u64 = 3600;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BOOST: BoostConfig = BoostConfig {
    base_bps: 10_000,
    max_bps: 25_000,
};

/// The win sample is drawn uniformly from [1, WIN_SAMPLE_MAX].
const WIN_SAMPLE_MAX: u64 = 10_000;

/// Delayed entries processed per retry call
const MAX_RETRY_BATCH: u32 = 20;
const DEFAULT_RETRY_BATCH: u32 = 10;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    cw2::set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    let manager = deps.api.addr_validate(&msg.manager)?;
    let boost = msg.boost.unwrap_or(DEFAULT_BOOST);
    validate_boost(&boost)?;
    // The jackpot address can only be set after instantiation
    if msg.fallback_enabled {
        return Err(ContractError::FallbackWithoutJackpot);
    }
    let config = Config {
        manager,
        swap_trigger: None,
        consumer: None,
        voting_escrow: None,
        jackpot: None,
        native_denom: msg.native_denom,
        min_swap_amount: msg.min_swap_amount,
        boost,
        retry_delay: msg.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        max_retries: msg.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
        fallback_enabled: msg.fallback_enabled,
    };
    CONFIG.save(deps.storage, &config)?;
    JACKPOT_BALANCE.save(deps.storage, &Uint128::zero())?;
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: Empty) -> StdResult<Response> {
    Ok(Response::default())
}

fn validate_boost(boost: &BoostConfig) -> Result<(), ContractError> {
    if boost.base_bps < MIN_BASE_BOOST_BPS {
        return Err(ContractError::BaseBoostTooLow);
    }
    if boost.max_bps > MAX_BOOST_CEILING_BPS {
        return Err(ContractError::MaxBoostTooHigh);
    }
    if boost.max_bps < boost.base_bps {
        return Err(ContractError::BoostRangeInverted);
    }
    Ok(())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::OnEligibleSwap { user, amount } => {
            execute_on_eligible_swap(deps, env, info, user, amount)
        }
        ExecuteMsg::RetryDelayedEntries { limit } => {
            execute_retry_delayed_entries(deps, env, limit)
        }
        ExecuteMsg::AbandonDelayedEntry { id } => execute_abandon_delayed_entry(deps, info, id),
        ExecuteMsg::AddToJackpot {} => execute_add_to_jackpot(deps, info),
        ExecuteMsg::ForwardJackpot {} => execute_forward_jackpot(deps, info),
        ExecuteMsg::SetConfig {
            manager,
            swap_trigger,
            consumer,
            voting_escrow,
            jackpot,
            min_swap_amount,
            boost,
            retry_delay,
            max_retries,
            fallback_enabled,
        } => execute_set_config(
            deps,
            env,
            info,
            manager,
            swap_trigger,
            consumer,
            voting_escrow,
            jackpot,
            min_swap_amount,
            boost,
            retry_delay,
            max_retries,
            fallback_enabled,
        ),
        ExecuteMsg::Withdraw {
            denom,
            amount,
            address,
        } => execute_withdraw(deps, env, info, denom, amount, address),
    }
}

fn execute_on_eligible_swap(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    user: String,
    amount: Uint128,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let swap_trigger = config
        .swap_trigger
        .as_ref()
        .ok_or(ContractError::Unauthorized)?;
    ensure_eq!(&info.sender, swap_trigger, ContractError::Unauthorized);

    let user = deps.api.addr_validate(&user)?;

    // Small swaps are not an error. The swap transaction must never revert
    // because of the lottery.
    if amount < config.min_swap_amount {
        return Ok(Response::new()
            .add_attribute("action", "on_eligible_swap")
            .add_attribute("result", "below_minimum"));
    }

    let win_threshold_bps = win_threshold_bps(deps.as_ref(), &config, &user, amount);
    if win_threshold_bps == 0 {
        return Ok(Response::new()
            .add_attribute("action", "on_eligible_swap")
            .add_attribute("result", "zero_probability"));
    }

    let mut msgs = Vec::<CosmosMsg>::new();
    if let Some(jackpot) = &config.jackpot {
        msgs.push(register_participant_msg(jackpot, &user)?);
    }

    let result = match &config.consumer {
        Some(consumer) => {
            msgs.push(request_randomness_msg(consumer, &user, win_threshold_bps)?);
            "requested"
        }
        None => {
            let id = DELAYED_ENTRIES_LAST_ID.may_load(deps.storage)?.unwrap_or(0) + 1;
            DELAYED_ENTRIES_LAST_ID.save(deps.storage, &id)?;
            let entry = DelayedEntry {
                user: user.clone(),
                amount,
                registered_at: env.block.time,
                retry_count: 0,
            };
            DELAYED_ENTRIES.save(deps.storage, id, &entry)?;
            "delayed"
        }
    };

    Ok(Response::new()
        .add_messages(msgs)
        .add_attribute("action", "on_eligible_swap")
        .add_attribute("result", result)
        .add_attribute("user", user)
        .add_attribute("win_threshold_bps", win_threshold_bps.to_string()))
}

/// The effective win probability for this swap: base probability from the
/// amount, boosted by the user's voting power share.
///
/// The voting escrow query is best effort. An unset escrow, a broken escrow
/// contract or an interface mismatch all degrade to no boost instead of
/// blocking the entry.
fn win_threshold_bps(deps: Deps, config: &Config, user: &Addr, amount: Uint128) -> u64 {
    let share_bps = match &config.voting_escrow {
        Some(escrow) => deps
            .querier
            .query_wasm_smart::<VotingPowerShareResponse>(
                escrow,
                &VotingEscrowQueryMsg::VotingPowerShare {
                    user: user.to_string(),
                },
            )
            .map(|response| response.share_bps)
            .unwrap_or(0),
        None => 0,
    };
    let base = base_probability_bps(amount);
    let multiplier = calculate_boost(share_bps, config.boost.base_bps, config.boost.max_bps);
    effective_probability_bps(base, multiplier)
}

fn register_participant_msg(jackpot: &Addr, user: &Addr) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: jackpot.to_string(),
        msg: to_json_binary(&lotto_jackpot::msg::ExecuteMsg::RegisterParticipant {
            user: user.to_string(),
        })?,
        funds: vec![],
    }
    .into())
}

fn request_randomness_msg(consumer: &Addr, user: &Addr, win_threshold_bps: u64) -> StdResult<CosmosMsg> {
    Ok(WasmMsg::Execute {
        contract_addr: consumer.to_string(),
        msg: to_json_binary(&lotto_consumer::msg::ExecuteMsg::RequestRandomness {
            user: user.to_string(),
            win_threshold_bps,
        })?,
        funds: vec![],
    }
    .into())
}

fn execute_retry_delayed_entries(
    deps: DepsMut,
    env: Env,
    limit: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let limit = limit.unwrap_or(DEFAULT_RETRY_BATCH).min(MAX_RETRY_BATCH) as usize;

    // Lazy scan: stops as soon as `limit` due entries were found
    let due: Vec<(u64, DelayedEntry)> = DELAYED_ENTRIES
        .range(deps.storage, None, None, Order::Ascending)
        .filter(|item| match item {
            Ok((_, entry)) => {
                entry.registered_at.plus_seconds(config.retry_delay) <= env.block.time
            }
            Err(_) => true,
        })
        .take(limit)
        .collect::<StdResult<_>>()?;

    let mut msgs = Vec::<CosmosMsg>::new();
    let mut events = Vec::<Event>::new();
    let mut requested = 0u32;
    let mut resolved = 0u32;
    let mut deferred = 0u32;
    let mut needs_intervention = 0u32;
    for (id, mut entry) in due {
        if let Some(consumer) = &config.consumer {
            // The randomness path is available now, hand the entry over
            let threshold = win_threshold_bps(deps.as_ref(), &config, &entry.user, entry.amount);
            DELAYED_ENTRIES.remove(deps.storage, id);
            if threshold == 0 {
                // Cannot win under the current config, settle as lost
                events.push(
                    Event::new("entry-lost")
                        .add_attribute("delayed_entry_id", id.to_string())
                        .add_attribute("user", entry.user.to_string())
                        .add_attribute("win_threshold_bps", "0"),
                );
                resolved += 1;
                continue;
            }
            if let Some(jackpot) = &config.jackpot {
                msgs.push(register_participant_msg(jackpot, &entry.user)?);
            }
            msgs.push(request_randomness_msg(consumer, &entry.user, threshold)?);
            requested += 1;
        } else if entry.retry_count + 1 >= config.max_retries && config.fallback_enabled {
            let jackpot = config
                .jackpot
                .as_ref()
                .ok_or(ContractError::FallbackWithoutJackpot)?;
            DELAYED_ENTRIES.remove(deps.storage, id);
            let threshold = win_threshold_bps(deps.as_ref(), &config, &entry.user, entry.amount);
            let randomness = fallback_randomness(&env, id, &entry.user);
            let sample: u64 = int_in_range(randomness, 1, WIN_SAMPLE_MAX);
            let won = threshold > 0 && sample <= threshold;

            events.push(
                Event::new(if won { "entry-won" } else { "entry-lost" })
                    .add_attribute("delayed_entry_id", id.to_string())
                    .add_attribute("user", entry.user.to_string())
                    .add_attribute("sample", sample.to_string())
                    .add_attribute("win_threshold_bps", threshold.to_string())
                    .add_attribute("source_id", "fallback"),
            );
            if won {
                msgs.push(register_participant_msg(jackpot, &entry.user)?);
                msgs.push(
                    WasmMsg::Execute {
                        contract_addr: jackpot.to_string(),
                        msg: to_json_binary(&lotto_jackpot::msg::ExecuteMsg::ResolveWin {
                            winner: entry.user.to_string(),
                            randomness: HexBinary::from(randomness),
                        })?,
                        funds: vec![],
                    }
                    .into(),
                );
            }
            resolved += 1;
        } else if entry.retry_count >= config.max_retries {
            // Exhausted and no fallback configured. The entry stays stored
            // until the manager abandons it or a consumer is wired up.
            needs_intervention += 1;
        } else {
            entry.retry_count += 1;
            entry.registered_at = env.block.time;
            DELAYED_ENTRIES.save(deps.storage, id, &entry)?;
            deferred += 1;
        }
    }

    Ok(Response::new()
        .add_messages(msgs)
        .add_events(events)
        .add_attribute("action", "retry_delayed_entries")
        .add_attribute("requested", requested.to_string())
        .add_attribute("resolved", resolved.to_string())
        .add_attribute("deferred", deferred.to_string())
        .add_attribute("needs_intervention", needs_intervention.to_string()))
}

/// Deterministic pseudo randomness for the chain-local fallback path. This
/// is observable by block producers and therefore only acceptable because
/// the fallback resolves stuck entries that would otherwise be lost.
fn fallback_randomness(env: &Env, id: u64, user: &Addr) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(env.block.height.to_be_bytes());
    hasher.update(env.block.time.nanos().to_be_bytes());
    hasher.update(id.to_be_bytes());
    hasher.update(user.as_bytes());
    hasher.finalize().into()
}

fn execute_abandon_delayed_entry(
    deps: DepsMut,
    info: MessageInfo,
    id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    if !DELAYED_ENTRIES.has(deps.storage, id) {
        return Err(ContractError::DelayedEntryNotFound { id });
    }
    DELAYED_ENTRIES.remove(deps.storage, id);

    Ok(Response::new()
        .add_attribute("action", "abandon_delayed_entry")
        .add_attribute("id", id.to_string()))
}

fn execute_add_to_jackpot(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let amount = info
        .funds
        .iter()
        .find(|c| c.denom == config.native_denom)
        .map(|c| c.amount)
        .filter(|a| !a.is_zero())
        .ok_or(ContractError::MissingDenom {
            denom: config.native_denom.clone(),
        })?;

    let balance = JACKPOT_BALANCE.load(deps.storage)? + amount;
    JACKPOT_BALANCE.save(deps.storage, &balance)?;

    Ok(Response::new()
        .add_attribute("action", "add_to_jackpot")
        .add_attribute("amount", amount.to_string())
        .add_attribute("balance", balance.to_string()))
}

fn execute_forward_jackpot(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);
    let jackpot = config.jackpot.ok_or(ContractError::UnsetJackpot)?;

    let balance = JACKPOT_BALANCE.load(deps.storage)?;
    if balance.is_zero() {
        return Err(ContractError::EmptyJackpot);
    }
    JACKPOT_BALANCE.save(deps.storage, &Uint128::zero())?;

    let msg = WasmMsg::Execute {
        contract_addr: jackpot.to_string(),
        msg: to_json_binary(&lotto_jackpot::msg::ExecuteMsg::AddToJackpot {})?,
        funds: vec![Coin {
            denom: config.native_denom,
            amount: balance,
        }],
    };
    Ok(Response::new()
        .add_message(msg)
        .add_attribute("action", "forward_jackpot")
        .add_attribute("amount", balance.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn execute_set_config(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
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
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    let manager = match manager {
        Some(ma) => deps.api.addr_validate(&ma)?,
        None => config.manager,
    };
    let swap_trigger = match swap_trigger {
        Some(st) => Some(deps.api.addr_validate(&st)?),
        None => config.swap_trigger,
    };
    let consumer = match consumer {
        Some(co) => Some(deps.api.addr_validate(&co)?),
        None => config.consumer,
    };
    let voting_escrow = match voting_escrow {
        Some(ve) => Some(deps.api.addr_validate(&ve)?),
        None => config.voting_escrow,
    };
    let jackpot = match jackpot {
        Some(ja) => Some(deps.api.addr_validate(&ja)?),
        None => config.jackpot,
    };
    let boost = boost.unwrap_or(config.boost);
    validate_boost(&boost)?;

    for referenced in [&swap_trigger, &consumer, &voting_escrow, &jackpot]
        .into_iter()
        .flatten()
    {
        if referenced == env.contract.address {
            return Err(ContractError::SelfReference);
        }
    }

    let fallback_enabled = fallback_enabled.unwrap_or(config.fallback_enabled);
    if fallback_enabled && jackpot.is_none() {
        return Err(ContractError::FallbackWithoutJackpot);
    }

    let new_config = Config {
        manager,
        swap_trigger,
        consumer,
        voting_escrow,
        jackpot,
        native_denom: config.native_denom,
        min_swap_amount: min_swap_amount.unwrap_or(config.min_swap_amount),
        boost,
        retry_delay: retry_delay.unwrap_or(config.retry_delay),
        max_retries: max_retries.unwrap_or(config.max_retries),
        fallback_enabled,
    };
    CONFIG.save(deps.storage, &new_config)?;

    Ok(Response::default())
}

fn execute_withdraw(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    denom: String,
    amount: Option<Uint128>,
    address: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    let address = deps.api.addr_validate(&address)?;
    let amount: Coin = match amount {
        Some(amount) => Coin { denom, amount },
        None => deps.querier.query_balance(env.contract.address, denom)?,
    };

    let msg = BankMsg::Send {
        to_address: address.into(),
        amount: vec![amount.clone()],
    };
    Ok(Response::new()
        .add_message(msg)
        .add_attribute("action", "withdraw")
        .add_attribute("amount", amount.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<QueryResponse> {
    let response = match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?)?,
        QueryMsg::JackpotBalance {} => to_json_binary(&JackpotBalanceResponse {
            balance: JACKPOT_BALANCE.load(deps.storage)?,
        })?,
        QueryMsg::DelayedEntry { id } => to_json_binary(&DelayedEntryResponse {
            entry: DELAYED_ENTRIES.may_load(deps.storage, id)?,
        })?,
        QueryMsg::DelayedEntries { start_after, limit } => {
            to_json_binary(&query_delayed_entries(deps, start_after, limit)?)?
        }
        QueryMsg::Boost { share_bps } => to_json_binary(&query_boost(deps, share_bps)?)?,
        QueryMsg::Probability { amount, share_bps } => {
            to_json_binary(&query_probability(deps, amount, share_bps)?)?
        }
    };
    Ok(response)
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(config)
}

// Queries limits
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

fn query_delayed_entries(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<DelayedEntriesResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    let entries: Vec<QueriedDelayedEntry> = DELAYED_ENTRIES
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|result| result.map(|(id, entry)| QueriedDelayedEntry { id, entry }))
        .collect::<StdResult<_>>()?;
    Ok(DelayedEntriesResponse { entries })
}

fn query_boost(deps: Deps, share_bps: u64) -> StdResult<BoostResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(BoostResponse {
        multiplier_bps: calculate_boost(share_bps, config.boost.base_bps, config.boost.max_bps),
    })
}

fn query_probability(
    deps: Deps,
    amount: Uint128,
    share_bps: Option<u64>,
) -> StdResult<ProbabilityResponse> {
    let config = CONFIG.load(deps.storage)?;
    let base_bps = base_probability_bps(amount);
    let multiplier_bps = calculate_boost(
        share_bps.unwrap_or(0),
        config.boost.base_bps,
        config.boost.max_bps,
    );
    Ok(ProbabilityResponse {
        base_bps,
        multiplier_bps,
        effective_bps: effective_probability_bps(base_bps, multiplier_bps),
    })
}
