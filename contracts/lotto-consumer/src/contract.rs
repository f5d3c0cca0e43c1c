#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    attr, ensure_eq, from_json, to_json_binary, Attribute, Deps, DepsMut, Empty, Env, Event,
    HexBinary, Ibc3ChannelOpenResponse, IbcBasicResponse, IbcChannelCloseMsg, IbcChannelConnectMsg,
    IbcChannelOpenMsg, IbcMsg, IbcPacketAckMsg, IbcPacketReceiveMsg, IbcPacketTimeoutMsg,
    IbcReceiveResponse, MessageInfo, Never, Order, QueryResponse, Response, StdAck, StdResult,
    WasmMsg,
};
use cw_storage_plus::Bound;
use nois::int_in_range;

use lotto_protocol::{
    check_order, check_version, DeliverRandomnessPacket, DeliverRandomnessPacketAck,
    RequestRandomnessPacket, RequestRandomnessPacketAck, REQUEST_RANDOMNESS_PACKET_LIFETIME,
};

use crate::error::ContractError;
use crate::msg::{
    ConfigResponse, ExecuteMsg, InstantiateMsg, OracleChannelResponse, QueriedRequest, QueryMsg,
    RequestResponse, RequestsResponse, StatsResponse,
};
use crate::state::{
    Config, PendingRequest, RequestStatus, CONFIG, DELIVERIES_COUNT, ORACLE_CHANNEL, REQUESTS,
    REQUESTS_LAST_ID,
};

const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

const DEFAULT_RETRY_DELAY: u64 = 3600;
const DEFAULT_MAX_RETRIES: u32 = 3;

/// The win sample is drawn uniformly from [1, WIN_SAMPLE_MAX].
const WIN_SAMPLE_MAX: u64 = 10_000;

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
        lottery: None,
        jackpot: None,
        retry_delay: msg.retry_delay.unwrap_or(DEFAULT_RETRY_DELAY),
        max_retries: msg.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
    };
    CONFIG.save(deps.storage, &config)?;
    DELIVERIES_COUNT.save(deps.storage, &0)?;
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
        ExecuteMsg::RequestRandomness {
            user,
            win_threshold_bps,
        } => execute_request_randomness(deps, env, info, user, win_threshold_bps),
        ExecuteMsg::RetryRequest { request_id } => execute_retry_request(deps, env, request_id),
        ExecuteMsg::AbandonRequest { request_id } => execute_abandon_request(deps, info, request_id),
        ExecuteMsg::SetConfig {
            manager,
            lottery,
            jackpot,
            retry_delay,
            max_retries,
        } => execute_set_config(deps, info, manager, lottery, jackpot, retry_delay, max_retries),
    }
}

fn execute_request_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    user: String,
    win_threshold_bps: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let lottery = config.lottery.ok_or(ContractError::UnsetLottery)?;
    ensure_eq!(info.sender, lottery, ContractError::Unauthorized);

    if win_threshold_bps == 0 || win_threshold_bps > WIN_SAMPLE_MAX {
        return Err(ContractError::InvalidWinThreshold);
    }
    let user = deps.api.addr_validate(&user)?;

    let request_id = REQUESTS_LAST_ID.may_load(deps.storage)?.unwrap_or(0) + 1;
    REQUESTS_LAST_ID.save(deps.storage, &request_id)?;

    let channel = ORACLE_CHANNEL.may_load(deps.storage)?;
    let status = match channel {
        Some(_) => RequestStatus::AwaitingFulfillment,
        None => RequestStatus::AwaitingRelay,
    };
    let request = PendingRequest {
        user,
        win_threshold_bps,
        created_at: env.block.time,
        last_attempt: env.block.time,
        retries: 0,
        status: status.clone(),
    };
    REQUESTS.save(deps.storage, request_id, &request)?;

    let mut res = Response::new()
        .add_attribute("action", "request_randomness")
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("win_threshold_bps", win_threshold_bps.to_string());
    if let Some(channel_id) = channel {
        res = res.add_message(request_packet_msg(&env, channel_id, request_id)?);
    } else {
        res = res.add_attribute("queued", "no channel");
    }
    Ok(res)
}

fn execute_retry_request(
    deps: DepsMut,
    env: Env,
    request_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let mut request = REQUESTS
        .may_load(deps.storage, request_id)?
        .ok_or(ContractError::RequestNotFound { request_id })?;

    // A request awaiting fulfillment is only retried once the delay passed,
    // so that a pending delivery is not raced by duplicate packets.
    if request.status == RequestStatus::AwaitingFulfillment
        && env.block.time < request.last_attempt.plus_seconds(config.retry_delay)
    {
        return Err(ContractError::RetryTooEarly { request_id });
    }
    if request.retries >= config.max_retries {
        return Err(ContractError::RetriesExhausted { request_id });
    }
    let channel_id = ORACLE_CHANNEL
        .may_load(deps.storage)?
        .ok_or(ContractError::UnsetChannel)?;

    request.retries += 1;
    request.last_attempt = env.block.time;
    request.status = RequestStatus::AwaitingFulfillment;
    REQUESTS.save(deps.storage, request_id, &request)?;

    Ok(Response::new()
        .add_message(request_packet_msg(&env, channel_id, request_id)?)
        .add_attribute("action", "retry_request")
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("retries", request.retries.to_string()))
}

fn execute_abandon_request(
    deps: DepsMut,
    info: MessageInfo,
    request_id: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    if !REQUESTS.has(deps.storage, request_id) {
        return Err(ContractError::RequestNotFound { request_id });
    }
    REQUESTS.remove(deps.storage, request_id);

    Ok(Response::new()
        .add_attribute("action", "abandon_request")
        .add_attribute("request_id", request_id.to_string()))
}

#[allow(clippy::too_many_arguments)]
fn execute_set_config(
    deps: DepsMut,
    info: MessageInfo,
    manager: Option<String>,
    lottery: Option<String>,
    jackpot: Option<String>,
    retry_delay: Option<u64>,
    max_retries: Option<u32>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    let manager = match manager {
        Some(ma) => deps.api.addr_validate(&ma)?,
        None => config.manager,
    };
    let lottery = match lottery {
        Some(lo) => Some(deps.api.addr_validate(&lo)?),
        None => config.lottery,
    };
    let jackpot = match jackpot {
        Some(ja) => Some(deps.api.addr_validate(&ja)?),
        None => config.jackpot,
    };
    let retry_delay = retry_delay.unwrap_or(config.retry_delay);
    let max_retries = max_retries.unwrap_or(config.max_retries);

    let new_config = Config {
        manager,
        lottery,
        jackpot,
        retry_delay,
        max_retries,
    };
    CONFIG.save(deps.storage, &new_config)?;

    Ok(Response::default())
}

fn request_packet_msg(env: &Env, channel_id: String, request_id: u64) -> StdResult<IbcMsg> {
    Ok(IbcMsg::SendPacket {
        channel_id,
        data: to_json_binary(&RequestRandomnessPacket { request_id })?,
        timeout: env
            .block
            .time
            .plus_seconds(REQUEST_RANDOMNESS_PACKET_LIFETIME)
            .into(),
    })
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<QueryResponse> {
    let response = match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?)?,
        QueryMsg::OracleChannel {} => to_json_binary(&OracleChannelResponse {
            channel: ORACLE_CHANNEL.may_load(deps.storage)?,
        })?,
        QueryMsg::Request { request_id } => to_json_binary(&RequestResponse {
            request: REQUESTS.may_load(deps.storage, request_id)?,
        })?,
        QueryMsg::Requests { start_after, limit } => {
            to_json_binary(&query_requests(deps, start_after, limit)?)?
        }
        QueryMsg::Stats {} => to_json_binary(&StatsResponse {
            requests: REQUESTS_LAST_ID.may_load(deps.storage)?.unwrap_or_default(),
            deliveries: DELIVERIES_COUNT.load(deps.storage)?,
        })?,
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

fn query_requests(
    deps: Deps,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<RequestsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    let requests: Vec<QueriedRequest> = REQUESTS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|result| result.map(|(id, request)| QueriedRequest { id, request }))
        .collect::<StdResult<_>>()?;
    Ok(RequestsResponse { requests })
}

#[cfg_attr(not(feature = "library"), entry_point)]
/// enforces ordering and versioing constraints
pub fn ibc_channel_open(
    _deps: DepsMut,
    _env: Env,
    msg: IbcChannelOpenMsg,
) -> Result<Option<Ibc3ChannelOpenResponse>, ContractError> {
    let channel = match msg {
        IbcChannelOpenMsg::OpenInit { channel } => channel,
        IbcChannelOpenMsg::OpenTry { .. } => return Err(ContractError::MustBeChainA),
    };

    check_order(&channel.order)?;
    check_version(&channel.version)?;

    Ok(None)
}

#[cfg_attr(not(feature = "library"), entry_point)]
/// Once established we store the channel ID to emit request packets into.
pub fn ibc_channel_connect(
    deps: DepsMut,
    _env: Env,
    msg: IbcChannelConnectMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let channel = match msg {
        IbcChannelConnectMsg::OpenAck {
            channel,
            counterparty_version: _,
        } => channel,
        IbcChannelConnectMsg::OpenConfirm { .. } => return Err(ContractError::MustBeChainA),
    };

    let channel_id = channel.endpoint.channel_id;

    if ORACLE_CHANNEL.may_load(deps.storage)?.is_some() {
        return Err(ContractError::ChannelAlreadySet);
    }

    ORACLE_CHANNEL.save(deps.storage, &channel_id)?;
    Ok(IbcBasicResponse::new()
        .add_attribute("action", "ibc_connect")
        .add_attribute("channel_id", channel_id))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_channel_close(
    deps: DepsMut,
    _env: Env,
    msg: IbcChannelCloseMsg,
) -> Result<IbcBasicResponse, ContractError> {
    match msg {
        // This side of the channel never initiates a close.
        // Transactions trying that should fail.
        IbcChannelCloseMsg::CloseInit { channel: _ } => Err(ContractError::ChannelMustNotBeClosed),
        // If the close is already done on the other chain we cannot
        // stop that anymore. We ensure this transactions succeeds to
        // allow the local channel's state to change to closed.
        //
        // By clearing the ORACLE_CHANNEL we allow a new channel to be established.
        IbcChannelCloseMsg::CloseConfirm { channel } => {
            ORACLE_CHANNEL.remove(deps.storage);
            Ok(IbcBasicResponse::new()
                .add_attribute("action", "ibc_close")
                .add_attribute("channel_id", channel.endpoint.channel_id))
        }
    }
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_packet_receive(
    deps: DepsMut,
    _env: Env,
    msg: IbcPacketReceiveMsg,
) -> Result<IbcReceiveResponse, Never> {
    // put this in a closure so we can convert all error responses into acknowledgements
    (|| {
        let IbcPacketReceiveMsg { packet, .. } = msg;
        let DeliverRandomnessPacket {
            request_id,
            randomness,
            source_id,
        } = from_json(&packet.data)?;
        receive_deliver_randomness(deps, request_id, randomness, source_id)
    })()
    .or_else(|e: ContractError| {
        // we try to capture all app-level errors and convert them into
        // acknowledgement packets that contain an error code.
        let acknowledgement = StdAck::error(format!("Error processing packet: {e}"));
        Ok(IbcReceiveResponse::new(acknowledgement)
            .add_event(Event::new("ibc").add_attribute("packet", "receive")))
    })
}

/// Resolves the win sample for the delivered randomness. The request is
/// removed before anything else happens, which makes a duplicate delivery
/// for the same request ID a no-op.
fn receive_deliver_randomness(
    deps: DepsMut,
    request_id: u64,
    randomness: HexBinary,
    source_id: String,
) -> Result<IbcReceiveResponse, ContractError> {
    let ack = StdAck::success(to_json_binary(&DeliverRandomnessPacketAck::default())?);

    let Some(request) = REQUESTS.may_load(deps.storage, request_id)? else {
        return Ok(IbcReceiveResponse::new(ack)
            .add_attribute("action", "deliver_randomness")
            .add_attribute("request_id", request_id.to_string())
            .add_attribute("outcome", "unknown request"));
    };
    REQUESTS.remove(deps.storage, request_id);

    let config = CONFIG.load(deps.storage)?;
    let randomness: [u8; 32] = randomness
        .to_array()
        .map_err(|_| ContractError::InvalidRandomness)?;

    DELIVERIES_COUNT.update::<_, ContractError>(deps.storage, |count| Ok(count + 1))?;

    let sample: u64 = int_in_range(randomness, 1, WIN_SAMPLE_MAX);
    let won = sample <= request.win_threshold_bps;

    let event = Event::new(if won { "entry-won" } else { "entry-lost" })
        .add_attribute("request_id", request_id.to_string())
        .add_attribute("user", request.user.to_string())
        .add_attribute("sample", sample.to_string())
        .add_attribute("win_threshold_bps", request.win_threshold_bps.to_string())
        .add_attribute("source_id", source_id);

    let mut res = IbcReceiveResponse::new(ack)
        .add_attribute("action", "deliver_randomness")
        .add_event(event);
    if won {
        if let Some(jackpot) = config.jackpot {
            res = res.add_message(WasmMsg::Execute {
                contract_addr: jackpot.into(),
                msg: to_json_binary(&lotto_jackpot::msg::ExecuteMsg::ResolveWin {
                    winner: request.user.into(),
                    randomness: HexBinary::from(randomness),
                })?,
                funds: vec![],
            });
        }
    }
    Ok(res)
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_packet_ack(
    _deps: DepsMut,
    _env: Env,
    msg: IbcPacketAckMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let mut attributes = Vec::<Attribute>::new();
    attributes.push(attr("action", "ack"));
    let ack: StdAck = from_json(&msg.acknowledgement.data)?;
    let is_error: bool;
    match ack {
        StdAck::Success(data) => {
            is_error = false;
            let response: RequestRandomnessPacketAck = from_json(data)?;
            match response {
                RequestRandomnessPacketAck::Queued { source_id } => {
                    attributes.push(attr("ack_type", "queued"));
                    attributes.push(attr("source_id", source_id));
                }
                _ => attributes.push(attr("ack_type", "other")),
            }
        }
        StdAck::Error(err) => {
            // The request packet failed on the oracle chain. The request
            // stays pending and can be retried once the delay passed.
            is_error = true;
            attributes.push(attr("error", err));
        }
    }
    attributes.push(attr("is_error", is_error.to_string()));
    Ok(IbcBasicResponse::new().add_attributes(attributes))
}

#[cfg_attr(not(feature = "library"), entry_point)]
/// A request packet that was never relayed. Flag the request for a retry.
pub fn ibc_packet_timeout(
    deps: DepsMut,
    _env: Env,
    msg: IbcPacketTimeoutMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let RequestRandomnessPacket { request_id } = from_json(&msg.packet.data)?;
    let mut attributes = vec![attr("action", "ibc_packet_timeout")];
    if let Some(mut request) = REQUESTS.may_load(deps.storage, request_id)? {
        request.status = RequestStatus::AwaitingRelay;
        REQUESTS.save(deps.storage, request_id, &request)?;
        attributes.push(attr("request_id", request_id.to_string()));
    }
    Ok(IbcBasicResponse::new().add_attributes(attributes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{
        message_info, mock_dependencies, mock_env, mock_ibc_channel_connect_ack,
        mock_ibc_channel_open_init, mock_ibc_channel_open_try, mock_ibc_packet_recv,
        mock_ibc_packet_timeout, MockApi, MockQuerier, MockStorage,
    };
    use cosmwasm_std::{from_json, Addr, CosmosMsg, OwnedDeps, Timestamp};
    use hex_literal::hex;
    use lotto_protocol::{APP_ORDER, BAD_APP_ORDER, IBC_APP_VERSION};

    const CHANNEL_ID: &str = "channel-12";

    const RANDOMNESS1: [u8; 32] =
        hex!("8b1441e1a3b440a53c486a4fc0236d19b07fb4e8e339dcf2b9e6ca6b9aa096b5");

    struct Instance {
        deps: OwnedDeps<MockStorage, MockApi, MockQuerier>,
        manager: Addr,
        lottery: Addr,
        jackpot: Addr,
    }

    fn setup() -> Instance {
        let mut deps = mock_dependencies();
        let manager = deps.api.addr_make("manager");
        let lottery = deps.api.addr_make("lottery");
        let jackpot = deps.api.addr_make("jackpot");
        let creator = deps.api.addr_make("creator");
        let msg = InstantiateMsg {
            manager: manager.to_string(),
            retry_delay: None,
            max_retries: None,
        };
        instantiate(deps.as_mut(), mock_env(), message_info(&creator, &[]), msg).unwrap();

        let msg = ExecuteMsg::SetConfig {
            manager: None,
            lottery: Some(lottery.to_string()),
            jackpot: Some(jackpot.to_string()),
            retry_delay: None,
            max_retries: None,
        };
        execute(deps.as_mut(), mock_env(), message_info(&manager, &[]), msg).unwrap();

        Instance {
            deps,
            manager,
            lottery,
            jackpot,
        }
    }

    fn connect(instance: &mut Instance) {
        let mut deps = instance.deps.as_mut();

        let init = mock_ibc_channel_open_init(CHANNEL_ID, APP_ORDER, IBC_APP_VERSION);
        ibc_channel_open(deps.branch(), mock_env(), init).unwrap();

        let ack = mock_ibc_channel_connect_ack(CHANNEL_ID, APP_ORDER, IBC_APP_VERSION);
        ibc_channel_connect(deps, mock_env(), ack).unwrap();
    }

    fn request(instance: &mut Instance, user: &Addr, win_threshold_bps: u64) -> Response {
        let msg = ExecuteMsg::RequestRandomness {
            user: user.to_string(),
            win_threshold_bps,
        };
        execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.lottery, &[]),
            msg,
        )
        .unwrap()
    }

    fn pending(instance: &Instance, request_id: u64) -> Option<PendingRequest> {
        let RequestResponse { request } = from_json(
            query(
                instance.deps.as_ref(),
                mock_env(),
                QueryMsg::Request { request_id },
            )
            .unwrap(),
        )
        .unwrap();
        request
    }

    #[test]
    fn ibc_channel_open_checks_version_and_order() {
        let mut instance = setup();
        let mut deps = instance.deps.as_mut();

        // All good
        let valid_handshake = mock_ibc_channel_open_init(CHANNEL_ID, APP_ORDER, IBC_APP_VERSION);
        ibc_channel_open(deps.branch(), mock_env(), valid_handshake).unwrap();

        // Wrong order
        let wrong_order = mock_ibc_channel_open_init(CHANNEL_ID, BAD_APP_ORDER, IBC_APP_VERSION);
        let res = ibc_channel_open(deps.branch(), mock_env(), wrong_order).unwrap_err();
        assert!(matches!(res, ContractError::ChannelError(..)));

        // Wrong version
        let wrong_version = mock_ibc_channel_open_init(CHANNEL_ID, APP_ORDER, "another version");
        let res = ibc_channel_open(deps.branch(), mock_env(), wrong_version).unwrap_err();
        assert!(matches!(res, ContractError::ChannelError(..)));

        // Passive side not supported
        let open_try = mock_ibc_channel_open_try(CHANNEL_ID, APP_ORDER, IBC_APP_VERSION);
        let res = ibc_channel_open(deps, mock_env(), open_try).unwrap_err();
        assert!(matches!(res, ContractError::MustBeChainA));
    }

    #[test]
    fn second_channel_is_rejected() {
        let mut instance = setup();
        connect(&mut instance);

        let ack = mock_ibc_channel_connect_ack("channel-13", APP_ORDER, IBC_APP_VERSION);
        let err = ibc_channel_connect(instance.deps.as_mut(), mock_env(), ack).unwrap_err();
        assert!(matches!(err, ContractError::ChannelAlreadySet));
    }

    #[test]
    fn request_randomness_requires_lottery_sender() {
        let mut instance = setup();
        connect(&mut instance);
        let anyone = instance.deps.api.addr_make("anyone");

        let msg = ExecuteMsg::RequestRandomness {
            user: anyone.to_string(),
            win_threshold_bps: 500,
        };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&anyone, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized));
    }

    #[test]
    fn request_randomness_validates_threshold() {
        let mut instance = setup();
        connect(&mut instance);
        let user = instance.deps.api.addr_make("user");

        for threshold in [0u64, 10_001, u64::MAX] {
            let msg = ExecuteMsg::RequestRandomness {
                user: user.to_string(),
                win_threshold_bps: threshold,
            };
            let err = execute(
                instance.deps.as_mut(),
                mock_env(),
                message_info(&instance.lottery, &[]),
                msg,
            )
            .unwrap_err();
            assert!(matches!(err, ContractError::InvalidWinThreshold));
        }
    }

    #[test]
    fn request_randomness_emits_packet_and_stores_request() {
        let mut instance = setup();
        connect(&mut instance);
        let user = instance.deps.api.addr_make("user");

        let res = request(&mut instance, &user, 750);
        assert_eq!(res.messages.len(), 1);
        let CosmosMsg::Ibc(IbcMsg::SendPacket {
            channel_id, data, ..
        }) = &res.messages[0].msg
        else {
            panic!("expected packet send");
        };
        assert_eq!(channel_id, CHANNEL_ID);
        let packet: RequestRandomnessPacket = from_json(data).unwrap();
        assert_eq!(packet.request_id, 1);

        let stored = pending(&instance, 1).unwrap();
        assert_eq!(stored.user, user);
        assert_eq!(stored.win_threshold_bps, 750);
        assert_eq!(stored.status, RequestStatus::AwaitingFulfillment);

        // IDs are strictly increasing
        request(&mut instance, &user, 750);
        assert!(pending(&instance, 2).is_some());
    }

    #[test]
    fn request_without_channel_awaits_relay() {
        let mut instance = setup();
        let user = instance.deps.api.addr_make("user");

        let res = request(&mut instance, &user, 750);
        assert!(res.messages.is_empty());
        let stored = pending(&instance, 1).unwrap();
        assert_eq!(stored.status, RequestStatus::AwaitingRelay);

        // Once the channel exists, a retry emits the packet
        connect(&mut instance);
        let msg = ExecuteMsg::RetryRequest { request_id: 1 };
        let res = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&user, &[]),
            msg,
        )
        .unwrap();
        assert_eq!(res.messages.len(), 1);
        let stored = pending(&instance, 1).unwrap();
        assert_eq!(stored.status, RequestStatus::AwaitingFulfillment);
        assert_eq!(stored.retries, 1);
    }

    #[test]
    fn retry_is_rate_limited_and_bounded() {
        let mut instance = setup();
        connect(&mut instance);
        let user = instance.deps.api.addr_make("user");
        request(&mut instance, &user, 750);

        // Too early while a packet is in flight
        let msg = ExecuteMsg::RetryRequest { request_id: 1 };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&user, &[]),
            msg,
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::RetryTooEarly { .. }));

        // After the delay, retries work until they are exhausted
        let mut env = mock_env();
        for attempt in 1..=3u32 {
            env.block.time = env.block.time.plus_seconds(3600 * attempt as u64 + 1);
            let msg = ExecuteMsg::RetryRequest { request_id: 1 };
            execute(
                instance.deps.as_mut(),
                env.clone(),
                message_info(&user, &[]),
                msg,
            )
            .unwrap();
        }
        env.block.time = env.block.time.plus_seconds(999_999);
        let msg = ExecuteMsg::RetryRequest { request_id: 1 };
        let err = execute(instance.deps.as_mut(), env, message_info(&user, &[]), msg).unwrap_err();
        assert!(matches!(err, ContractError::RetriesExhausted { .. }));

        // Manual intervention: only the manager can abandon
        let msg = ExecuteMsg::AbandonRequest { request_id: 1 };
        let err = execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&user, &[]),
            msg.clone(),
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Unauthorized));
        execute(
            instance.deps.as_mut(),
            mock_env(),
            message_info(&instance.manager, &[]),
            msg,
        )
        .unwrap();
        assert!(pending(&instance, 1).is_none());
    }

    #[test]
    fn delivery_resolves_win_against_jackpot() {
        let mut instance = setup();
        connect(&mut instance);
        let user = instance.deps.api.addr_make("user");
        // Threshold 10000 wins for every sample
        request(&mut instance, &user, 10_000);

        let packet = DeliverRandomnessPacket {
            request_id: 1,
            randomness: HexBinary::from(RANDOMNESS1),
            source_id: "vrf:1".to_string(),
        };
        let msg = mock_ibc_packet_recv(CHANNEL_ID, &packet).unwrap();
        let res = ibc_packet_receive(instance.deps.as_mut(), mock_env(), msg).unwrap();

        assert!(res.events.iter().any(|e| e.ty == "entry-won"));
        assert_eq!(res.messages.len(), 1);
        let CosmosMsg::Wasm(WasmMsg::Execute {
            contract_addr, msg, ..
        }) = &res.messages[0].msg
        else {
            panic!("expected jackpot resolution");
        };
        assert_eq!(contract_addr, instance.jackpot.as_str());
        let resolve: lotto_jackpot::msg::ExecuteMsg = from_json(msg).unwrap();
        assert!(matches!(
            resolve,
            lotto_jackpot::msg::ExecuteMsg::ResolveWin { .. }
        ));

        // The request is gone and the counters moved
        assert!(pending(&instance, 1).is_none());
        let stats: StatsResponse =
            from_json(query(instance.deps.as_ref(), mock_env(), QueryMsg::Stats {}).unwrap())
                .unwrap();
        assert_eq!(stats.requests, 1);
        assert_eq!(stats.deliveries, 1);
    }

    #[test]
    fn duplicate_delivery_is_a_no_op() {
        let mut instance = setup();
        connect(&mut instance);
        let user = instance.deps.api.addr_make("user");
        request(&mut instance, &user, 10_000);

        let packet = DeliverRandomnessPacket {
            request_id: 1,
            randomness: HexBinary::from(RANDOMNESS1),
            source_id: "vrf:1".to_string(),
        };
        let msg = mock_ibc_packet_recv(CHANNEL_ID, &packet).unwrap();
        ibc_packet_receive(instance.deps.as_mut(), mock_env(), msg.clone()).unwrap();

        // Same delivery again: success ack, no settlement message
        let res = ibc_packet_receive(instance.deps.as_mut(), mock_env(), msg).unwrap();
        assert!(res.messages.is_empty());
        let ack: StdAck = from_json(res.acknowledgement.as_ref().unwrap()).unwrap();
        assert!(matches!(ack, StdAck::Success(_)));
    }

    #[test]
    fn timeout_requeues_the_request() {
        let mut instance = setup();
        connect(&mut instance);
        let user = instance.deps.api.addr_make("user");
        request(&mut instance, &user, 750);

        let packet = RequestRandomnessPacket { request_id: 1 };
        let msg = mock_ibc_packet_timeout(CHANNEL_ID, &packet).unwrap();
        ibc_packet_timeout(instance.deps.as_mut(), mock_env(), msg).unwrap();

        let stored = pending(&instance, 1).unwrap();
        assert_eq!(stored.status, RequestStatus::AwaitingRelay);
    }

    #[test]
    fn requests_are_timestamped() {
        let mut instance = setup();
        connect(&mut instance);
        let user = instance.deps.api.addr_make("user");
        request(&mut instance, &user, 750);

        let stored = pending(&instance, 1).unwrap();
        assert_ne!(stored.created_at, Timestamp::from_nanos(0));
        assert_eq!(stored.created_at, stored.last_attempt);
    }
}
