#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    ensure_eq, to_json_binary, Addr, BankMsg, Coin, Deps, DepsMut, Empty, Env, Event, HexBinary,
    MessageInfo, Order, QueryResponse, Response, StdResult, Uint128,
};
use cw_storage_plus::Bound;
use nois::{int_in_range, sub_randomness};

use crate::distribution::{project, MAX_DISTRIBUTION_BPS, MIN_DISTRIBUTION_BPS, PERCENT_PRECISION};
use crate::error::ContractError;
use crate::msg::{
    ConfigResponse, ExecuteMsg, InstantiateMsg, ParticipantsResponse,
    ParticipationReserveResponse, ProjectionResponse, QueryMsg, RoundResponse,
};
use crate::state::{Config, Round, CONFIG, PARTICIPANTS, PARTICIPATION_RESERVE, ROUND};

const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Upper bound for secondary winners drawn on a resolved win
const MAX_SECONDARY_WINNERS: usize = 5;
/// Number of registered participants considered when drawing secondary
/// winners. Bounds the gas usage of a single resolution.
const MAX_WINNER_CANDIDATES: usize = 100;

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    cw2::set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    let manager = deps.api.addr_validate(&msg.manager)?;
    let config = Config {
        manager,
        distributor: None,
        lottery: None,
        reward_denom: msg.reward_denom,
    };
    CONFIG.save(deps.storage, &config)?;
    ROUND.save(deps.storage, &Round::genesis())?;
    PARTICIPATION_RESERVE.save(deps.storage, &Uint128::zero())?;
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn migrate(_deps: DepsMut, _env: Env, _msg: Empty) -> StdResult<Response> {
    Ok(Response::default())
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::AddToJackpot {} => execute_add_to_jackpot(deps, info),
        ExecuteMsg::RegisterParticipant { user } => execute_register_participant(deps, info, user),
        ExecuteMsg::UpdateDistributionPercentage { percentage_bps } => {
            execute_update_distribution_percentage(deps, info, percentage_bps)
        }
        ExecuteMsg::DistributeJackpot {
            main_winner,
            secondary_winners,
            secondary_shares,
        } => execute_distribute_jackpot(deps, info, main_winner, secondary_winners, secondary_shares),
        ExecuteMsg::ResolveWin { winner, randomness } => {
            execute_resolve_win(deps, info, winner, randomness)
        }
        ExecuteMsg::SetConfig {
            manager,
            distributor,
            lottery,
        } => execute_set_config(deps, info, manager, distributor, lottery),
        ExecuteMsg::Withdraw {
            denom,
            amount,
            address,
        } => execute_withdraw(deps, env, info, denom, amount, address),
    }
}

fn execute_add_to_jackpot(deps: DepsMut, info: MessageInfo) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let amount = info
        .funds
        .iter()
        .find(|c| c.denom == config.reward_denom)
        .map(|c| c.amount)
        .filter(|a| !a.is_zero())
        .ok_or(ContractError::MissingDenom {
            denom: config.reward_denom.clone(),
        })?;

    let mut round = ROUND.load(deps.storage)?;
    round.pool += amount;
    ROUND.save(deps.storage, &round)?;

    Ok(Response::new()
        .add_attribute("action", "add_to_jackpot")
        .add_attribute("amount", amount.to_string())
        .add_attribute("pool", round.pool.to_string()))
}

fn execute_register_participant(
    deps: DepsMut,
    info: MessageInfo,
    user: String,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let authorized = info.sender == config.manager
        || Some(&info.sender) == config.distributor.as_ref()
        || Some(&info.sender) == config.lottery.as_ref();
    if !authorized {
        return Err(ContractError::Unauthorized);
    }

    let user = deps.api.addr_validate(&user)?;
    let mut round = ROUND.load(deps.storage)?;
    let known = PARTICIPANTS.has(deps.storage, (round.index, &user));
    if !known {
        PARTICIPANTS.save(deps.storage, (round.index, &user), &())?;
        round.participants += 1;
        ROUND.save(deps.storage, &round)?;
    }

    Ok(Response::new()
        .add_attribute("action", "register_participant")
        .add_attribute("user", user)
        .add_attribute("known", known.to_string()))
}

fn execute_update_distribution_percentage(
    deps: DepsMut,
    info: MessageInfo,
    percentage_bps: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    if percentage_bps < MIN_DISTRIBUTION_BPS {
        return Err(ContractError::PercentageTooLow);
    }
    if percentage_bps > MAX_DISTRIBUTION_BPS {
        return Err(ContractError::PercentageTooHigh);
    }

    let mut round = ROUND.load(deps.storage)?;
    round.distribution_bps = percentage_bps;
    ROUND.save(deps.storage, &round)?;

    Ok(Response::new()
        .add_attribute("action", "update_distribution_percentage")
        .add_event(
            Event::new("distribution-percentage-updated")
                .add_attribute("percentage_bps", percentage_bps.to_string()),
        ))
}

fn execute_distribute_jackpot(
    deps: DepsMut,
    info: MessageInfo,
    main_winner: String,
    secondary_winners: Vec<String>,
    secondary_shares: Vec<u64>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let authorized =
        info.sender == config.manager || Some(&info.sender) == config.distributor.as_ref();
    if !authorized {
        return Err(ContractError::Unauthorized);
    }

    if secondary_winners.len() != secondary_shares.len() {
        return Err(ContractError::MismatchedSecondaryWinners);
    }
    let main_winner = deps.api.addr_validate(&main_winner)?;
    let secondary: Vec<(Addr, u64)> = secondary_winners
        .into_iter()
        .zip(secondary_shares)
        .map(|(addr, share)| Ok((deps.api.addr_validate(&addr)?, share)))
        .collect::<Result<_, ContractError>>()?;

    distribute(deps, &config, main_winner, secondary)
}

fn execute_resolve_win(
    deps: DepsMut,
    info: MessageInfo,
    winner: String,
    randomness: HexBinary,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let authorized = Some(&info.sender) == config.distributor.as_ref()
        || Some(&info.sender) == config.lottery.as_ref();
    if !authorized {
        return Err(ContractError::Unauthorized);
    }

    let randomness: [u8; 32] = randomness
        .to_array()
        .map_err(|_| ContractError::InvalidRandomness)?;
    let winner = deps.api.addr_validate(&winner)?;

    // Draw secondary winners from the registered participants, excluding
    // the main winner.
    let round = ROUND.load(deps.storage)?;
    let mut candidates: Vec<Addr> = PARTICIPANTS
        .prefix(round.index)
        .keys(deps.storage, None, None, Order::Ascending)
        .take(MAX_WINNER_CANDIDATES)
        .collect::<StdResult<_>>()?;
    candidates.retain(|c| c != &winner);

    let mut provider = sub_randomness(randomness);
    let mut secondary = Vec::<(Addr, u64)>::new();
    while secondary.len() < MAX_SECONDARY_WINNERS && !candidates.is_empty() {
        let idx = int_in_range(provider.provide(), 0, candidates.len() as u32 - 1) as usize;
        secondary.push((candidates.swap_remove(idx), 1));
    }

    distribute(deps, &config, winner, secondary)
}

/// Applies one distribution: pays out the projected split, retains the
/// participation portion and advances the round. The request that led here
/// was already removed by the caller, so duplicate delivery cannot reach
/// this point twice.
fn distribute(
    deps: DepsMut,
    config: &Config,
    main_winner: Addr,
    secondary: Vec<(Addr, u64)>,
) -> Result<Response, ContractError> {
    let mut round = ROUND.load(deps.storage)?;
    let projection = project(round.pool, round.participants, round.distribution_bps);
    if projection.distribution_amount.is_zero() {
        return Err(ContractError::NothingToDistribute);
    }

    let total_shares: u128 = secondary.iter().map(|(_, share)| *share as u128).sum();
    if !secondary.is_empty() && total_shares == 0 {
        return Err(ContractError::ZeroSecondaryShares);
    }

    let main_amount = projection
        .distribution_amount
        .multiply_ratio(projection.main_prize_bps, PERCENT_PRECISION);
    let secondary_pool = projection
        .distribution_amount
        .multiply_ratio(projection.secondary_prize_bps, PERCENT_PRECISION);

    let mut msgs = Vec::<BankMsg>::new();
    msgs.push(BankMsg::Send {
        to_address: main_winner.to_string(),
        amount: vec![Coin {
            denom: config.reward_denom.clone(),
            amount: main_amount,
        }],
    });

    let mut secondary_paid = Uint128::zero();
    for (addr, share) in &secondary {
        let amount = secondary_pool.multiply_ratio(*share as u128, total_shares);
        if amount.is_zero() {
            continue;
        }
        secondary_paid += amount;
        msgs.push(BankMsg::Send {
            to_address: addr.to_string(),
            amount: vec![Coin {
                denom: config.reward_denom.clone(),
                amount,
            }],
        });
    }

    // The participation portion plus any rounding dust of the secondary
    // split stays in the contract as the reserve.
    let retained = projection.distribution_amount - main_amount - secondary_paid;
    PARTICIPATION_RESERVE.update::<_, ContractError>(deps.storage, |r| Ok(r + retained))?;

    round.pool -= projection.distribution_amount;
    round.index += 1;
    round.participants = 0;
    ROUND.save(deps.storage, &round)?;

    Ok(Response::new()
        .add_messages(msgs)
        .add_attribute("action", "distribute_jackpot")
        .add_event(
            Event::new("round-advanced")
                .add_attribute("round_index", round.index.to_string())
                .add_attribute("distribution_amount", projection.distribution_amount)
                .add_attribute("main_winner", main_winner)
                .add_attribute("main_amount", main_amount)
                .add_attribute("secondary_winners", secondary.len().to_string())
                .add_attribute("carry_forward", round.pool),
        ))
}

fn execute_set_config(
    deps: DepsMut,
    info: MessageInfo,
    manager: Option<String>,
    distributor: Option<String>,
    lottery: Option<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    let manager = match manager {
        Some(ma) => deps.api.addr_validate(&ma)?,
        None => config.manager,
    };
    let distributor = match distributor {
        Some(di) => Some(deps.api.addr_validate(&di)?),
        None => config.distributor,
    };
    let lottery = match lottery {
        Some(lo) => Some(deps.api.addr_validate(&lo)?),
        None => config.lottery,
    };

    let new_config = Config {
        manager,
        distributor,
        lottery,
        reward_denom: config.reward_denom,
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
        QueryMsg::Round {} => to_json_binary(&query_round(deps)?)?,
        QueryMsg::Projection {} => to_json_binary(&query_projection(deps)?)?,
        QueryMsg::Participants { start_after, limit } => {
            to_json_binary(&query_participants(deps, start_after, limit)?)?
        }
        QueryMsg::ParticipationReserve {} => to_json_binary(&ParticipationReserveResponse {
            reserve: PARTICIPATION_RESERVE.load(deps.storage)?,
        })?,
    };
    Ok(response)
}

fn query_config(deps: Deps) -> StdResult<ConfigResponse> {
    let config = CONFIG.load(deps.storage)?;
    Ok(config)
}

fn query_round(deps: Deps) -> StdResult<RoundResponse> {
    let round = ROUND.load(deps.storage)?;
    Ok(round)
}

fn query_projection(deps: Deps) -> StdResult<ProjectionResponse> {
    let round = ROUND.load(deps.storage)?;
    let projection = project(round.pool, round.participants, round.distribution_bps);
    Ok(ProjectionResponse {
        distribution_amount: projection.distribution_amount,
        main_prize_bps: projection.main_prize_bps,
        secondary_prize_bps: projection.secondary_prize_bps,
        participation_bps: projection.participation_bps,
    })
}

// Queries limits
const MAX_LIMIT: u32 = 30;
const DEFAULT_LIMIT: u32 = 10;

fn query_participants(
    deps: Deps,
    start_after: Option<String>,
    limit: Option<u32>,
) -> StdResult<ParticipantsResponse> {
    let round = ROUND.load(deps.storage)?;
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start_addr = start_after
        .map(|s| deps.api.addr_validate(&s))
        .transpose()?;
    let start = start_addr.as_ref().map(Bound::exclusive);
    let participants: Vec<Addr> = PARTICIPANTS
        .prefix(round.index)
        .keys(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .collect::<StdResult<_>>()?;
    Ok(ParticipantsResponse { participants })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::DEFAULT_DISTRIBUTION_BPS;
    use cosmwasm_std::testing::{
        message_info, mock_dependencies, mock_env, MockApi, MockQuerier, MockStorage,
    };
    use cosmwasm_std::{coins, from_json, CosmosMsg, OwnedDeps};
    use hex_literal::hex;

    const DENOM: &str = "uwrapped";

    const RANDOMNESS1: [u8; 32] =
        hex!("aabbccddaabbccddaabbccddaabbccddaabbccddaabbccddaabbccddaabbccdd");

    struct Instance {
        deps: OwnedDeps<MockStorage, MockApi, MockQuerier>,
        manager: Addr,
        distributor: Addr,
    }

    fn setup() -> Instance {
        let mut deps = mock_dependencies();
        let manager = deps.api.addr_make("manager");
        let distributor = deps.api.addr_make("distributor");
        let creator = deps.api.addr_make("creator");
        let msg = InstantiateMsg {
            manager: manager.to_string(),
            reward_denom: DENOM.to_string(),
        };
        instantiate(deps.as_mut(), mock_env(), message_info(&creator, &[]), msg).unwrap();

        let msg = ExecuteMsg::SetConfig {
            manager: None,
            distributor: Some(distributor.to_string()),
            lottery: None,
        };
        execute(deps.as_mut(), mock_env(), message_info(&manager, &[]), msg).unwrap();

        Instance {
            deps,
            manager,
            distributor,
        }
    }

    fn fund(instance: &mut Instance, amount: u128) {
        let funder = instance.deps.api.addr_make("funder");
        execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&funder, &coins(amount, DENOM)),
            ExecuteMsg::AddToJackpot {},
        )
        .unwrap();
    }

    fn round(deps: Deps) -> Round {
        from_json(query(deps, mock_env(), QueryMsg::Round {}).unwrap()).unwrap()
    }

    fn bank_sends(response: &Response) -> Vec<(String, Uint128)> {
        response
            .messages
            .iter()
            .filter_map(|sub| match &sub.msg {
                CosmosMsg::Bank(BankMsg::Send { to_address, amount }) => {
                    Some((to_address.clone(), amount[0].amount))
                }
                _ => None,
            })
            .collect()
    }

    #[test]
    fn instantiate_starts_at_round_zero() {
        let instance = setup();
        let round = round(instance.deps.as_ref());
        assert_eq!(round.index, 0);
        assert_eq!(round.pool, Uint128::zero());
        assert_eq!(round.distribution_bps, DEFAULT_DISTRIBUTION_BPS);
    }

    #[test]
    fn add_to_jackpot_requires_reward_denom() {
        let mut instance = setup();
        let funder = instance.deps.api.addr_make("funder");

        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&funder, &coins(500, "uother")),
            ExecuteMsg::AddToJackpot {},
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::MissingDenom { .. }));

        fund(&mut instance, 100_000);
        assert_eq!(round(instance.deps.as_ref()).pool, Uint128::new(100_000));
    }

    #[test]
    fn register_participant_is_idempotent() {
        let mut instance = setup();
        let user = instance.deps.api.addr_make("user1");

        for _ in 0..3 {
            let msg = ExecuteMsg::RegisterParticipant {
                user: user.to_string(),
            };
            execute(
                instance.deps.as_mut(),
                mock_env(),
                message_info(&instance.distributor, &[]),
                msg,
            )
            .unwrap();
        }
        assert_eq!(round(instance.deps.as_ref()).participants, 1);
    }

    #[test]
    fn register_participant_requires_authorization() {
        let mut instance = setup();
        let anon = instance.deps.api.addr_make("anon");
        let msg = ExecuteMsg::RegisterParticipant {
            user: anon.to_string(),
        };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&anon, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized));
    }

    #[test]
    fn update_distribution_percentage_enforces_bounds() {
        let mut instance = setup();

        for (bps, ok) in [
            (5_800u64, false),
            (5_900, true),
            (6_900, true),
            (7_900, true),
            (8_000, false),
        ] {
            let msg = ExecuteMsg::UpdateDistributionPercentage {
                percentage_bps: bps,
            };
            let res = execute(
                instance.deps.as_mut(),
                mock_env(),
                message_info(&instance.manager, &[]),
                msg,
            );
            assert_eq!(res.is_ok(), ok, "bps: {bps}");
        }

        // The last valid value is kept after rejected updates
        assert_eq!(round(instance.deps.as_ref()).distribution_bps, 7_900);
    }

    #[test]
    fn distribute_pays_main_winner_and_carries_remainder() {
        let mut instance = setup();
        fund(&mut instance, 100_000);
        let winner = instance.deps.api.addr_make("winner");

        let projection: ProjectionResponse =
            from_json(query(instance.deps.as_ref(), mock_env(), QueryMsg::Projection {}).unwrap())
                .unwrap();
        assert_eq!(projection.distribution_amount, Uint128::new(69_000));

        let msg = ExecuteMsg::DistributeJackpot {
            main_winner: winner.to_string(),
            secondary_winners: vec![],
            secondary_shares: vec![],
        };
        let res = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.manager, &[]),
            msg,
        )
        .unwrap();

        let sends = bank_sends(&res);
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].0, winner.to_string());
        assert_eq!(
            sends[0].1,
            Uint128::new(69_000).multiply_ratio(projection.main_prize_bps, 10_000u64)
        );

        // Round continuity: pool_after == pool_before - distribution_amount
        let round = round(instance.deps.as_ref());
        assert_eq!(round.index, 1);
        assert_eq!(round.pool, Uint128::new(31_000));

        // Everything not paid out of the released amount is reserved
        let reserve: ParticipationReserveResponse = from_json(
            query(
                instance.deps.as_ref(),
                mock_env(),
                QueryMsg::ParticipationReserve {},
            )
            .unwrap(),
        )
        .unwrap();
        assert_eq!(reserve.reserve, Uint128::new(69_000) - sends[0].1);
    }

    #[test]
    fn equal_secondary_shares_split_equally() {
        let mut instance = setup();
        fund(&mut instance, 100_000);
        let winner = instance.deps.api.addr_make("winner");
        let second1 = instance.deps.api.addr_make("second1");
        let second2 = instance.deps.api.addr_make("second2");

        let projection: ProjectionResponse =
            from_json(query(instance.deps.as_ref(), mock_env(), QueryMsg::Projection {}).unwrap())
                .unwrap();

        let msg = ExecuteMsg::DistributeJackpot {
            main_winner: winner.to_string(),
            secondary_winners: vec![second1.to_string(), second2.to_string()],
            secondary_shares: vec![5, 5],
        };
        let res = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.manager, &[]),
            msg,
        )
        .unwrap();

        let sends = bank_sends(&res);
        assert_eq!(sends.len(), 3);
        // Both secondary winners get the same amount
        assert_eq!(sends[1].1, sends[2].1);

        let secondary_pool = projection
            .distribution_amount
            .multiply_ratio(projection.secondary_prize_bps, 10_000u64);
        assert!(!secondary_pool.is_zero());
        // rounding tolerance of 1 per winner
        assert!(secondary_pool - sends[1].1 - sends[2].1 <= Uint128::new(2));
    }

    #[test]
    fn distribute_rejects_malformed_winner_arrays() {
        let mut instance = setup();
        fund(&mut instance, 100_000);
        let winner = instance.deps.api.addr_make("winner");
        let second1 = instance.deps.api.addr_make("second1");

        let msg = ExecuteMsg::DistributeJackpot {
            main_winner: winner.to_string(),
            secondary_winners: vec![second1.to_string()],
            secondary_shares: vec![1, 2],
        };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.manager, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::MismatchedSecondaryWinners));

        let msg = ExecuteMsg::DistributeJackpot {
            main_winner: winner.to_string(),
            secondary_winners: vec![second1.to_string()],
            secondary_shares: vec![0],
        };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.manager, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::ZeroSecondaryShares));
    }

    #[test]
    fn distribute_rejects_empty_pool() {
        let mut instance = setup();
        let winner = instance.deps.api.addr_make("winner");
        let msg = ExecuteMsg::DistributeJackpot {
            main_winner: winner.to_string(),
            secondary_winners: vec![],
            secondary_shares: vec![],
        };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.manager, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::NothingToDistribute));
    }

    #[test]
    fn resolve_win_draws_secondary_winners_from_participants() {
        let mut instance = setup();
        fund(&mut instance, 100_000);
        let winner = instance.deps.api.addr_make("winner");

        for i in 0..8 {
            let user = instance.deps.api.addr_make(&format!("user{i}"));
            let msg = ExecuteMsg::RegisterParticipant {
                user: user.to_string(),
            };
            execute(
                instance.deps.as_mut(),
                mock_env(),
                message_info(&instance.distributor, &[]),
                msg,
            )
            .unwrap();
        }

        let msg = ExecuteMsg::ResolveWin {
            winner: winner.to_string(),
            randomness: HexBinary::from(RANDOMNESS1),
        };
        let res = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.distributor, &[]),
            msg,
        )
        .unwrap();

        let sends = bank_sends(&res);
        // main winner + 5 drawn secondary winners
        assert_eq!(sends.len(), 6);
        assert_eq!(sends[0].0, winner.to_string());
        // drawn winners are distinct and never the main winner
        let mut drawn: Vec<&String> = res
            .messages
            .iter()
            .skip(1)
            .filter_map(|sub| match &sub.msg {
                CosmosMsg::Bank(BankMsg::Send { to_address, .. }) => Some(to_address),
                _ => None,
            })
            .collect();
        drawn.sort();
        let len_before = drawn.len();
        drawn.dedup();
        assert_eq!(drawn.len(), len_before);
        assert!(!drawn.contains(&&winner.to_string()));

        // Participant registry is cleared with the round advance
        assert_eq!(round(instance.deps.as_ref()).participants, 0);
    }

    #[test]
    fn resolve_win_requires_distributor_or_lottery() {
        let mut instance = setup();
        fund(&mut instance, 100_000);
        let winner = instance.deps.api.addr_make("winner");

        // Even the manager cannot resolve wins
        let msg = ExecuteMsg::ResolveWin {
            winner: winner.to_string(),
            randomness: HexBinary::from(RANDOMNESS1),
        };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.manager, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized));
    }

    #[test]
    fn resolve_win_rejects_short_randomness() {
        let mut instance = setup();
        fund(&mut instance, 100_000);
        let winner = instance.deps.api.addr_make("winner");

        let msg = ExecuteMsg::ResolveWin {
            winner: winner.to_string(),
            randomness: HexBinary::from_hex("aabbccdd").unwrap(),
        };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.distributor, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::InvalidRandomness));
    }
}
