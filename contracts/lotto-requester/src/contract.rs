#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    ensure_eq, from_json, to_json_binary, Deps, DepsMut, Empty, Env, Event, HexBinary,
    IbcBasicResponse, IbcChannelCloseMsg, IbcChannelConnectMsg, IbcChannelOpenMsg,
    IbcChannelOpenResponse, IbcMsg, IbcPacketAckMsg, IbcPacketReceiveMsg, IbcPacketTimeoutMsg,
    IbcReceiveResponse, Ibc3ChannelOpenResponse, MessageInfo, Never, Order, QueryResponse,
    Response, StdAck, StdResult,
};
use cw_storage_plus::Bound;

use lotto_protocol::{
    check_order, check_version, DeliverRandomnessPacket, RequestRandomnessPacket,
    RequestRandomnessPacketAck, DELIVER_RANDOMNESS_PACKET_LIFETIME, IBC_APP_VERSION,
};

use crate::error::ContractError;
use crate::msg::{
    ConfigResponse, ExecuteMsg, InstantiateMsg, JobResponse, JobsResponse, QueriedJob, QueryMsg,
    StatsResponse,
};
use crate::state::{Config, OracleJob, CONFIG, DELIVERIES_COUNT, JOBS, JOBS_LAST_ID};

const CONTRACT_NAME: &str = env!("CARGO_PKG_NAME");
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix of the source IDs this oracle hands out
const SOURCE_ID_PREFIX: &str = "vrf";

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    cw2::set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;
    let manager = deps.api.addr_validate(&msg.manager)?;
    let coordinator = msg
        .coordinator
        .map(|co| deps.api.addr_validate(&co))
        .transpose()?;
    CONFIG.save(
        deps.storage,
        &Config {
            manager,
            coordinator,
        },
    )?;
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
        ExecuteMsg::SubmitRandomness {
            oracle_request_id,
            random_words,
        } => execute_submit_randomness(deps, env, info, oracle_request_id, random_words),
        ExecuteMsg::SetConfig {
            manager,
            coordinator,
        } => execute_set_config(deps, info, manager, coordinator),
    }
}

fn execute_submit_randomness(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    oracle_request_id: u64,
    random_words: Vec<HexBinary>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let coordinator = config.coordinator.ok_or(ContractError::UnsetCoordinator)?;
    ensure_eq!(info.sender, coordinator, ContractError::Unauthorized);

    // Only the first word is used, but a multi-word fulfillment is not
    // an error.
    let randomness = random_words.first().ok_or(ContractError::NoRandomWords)?;
    if randomness.len() != 32 {
        return Err(ContractError::InvalidRandomness);
    }

    let job = JOBS
        .may_load(deps.storage, oracle_request_id)?
        .ok_or(ContractError::UnknownOracleRequest { oracle_request_id })?;
    // Removing the job before emitting the packet guarantees at most one
    // delivery per request.
    JOBS.remove(deps.storage, oracle_request_id);
    DELIVERIES_COUNT.update::<_, ContractError>(deps.storage, |count| Ok(count + 1))?;

    let packet = DeliverRandomnessPacket {
        request_id: job.request_id,
        randomness: randomness.clone(),
        source_id: source_id(oracle_request_id),
    };
    let msg = IbcMsg::SendPacket {
        channel_id: job.channel.clone(),
        data: to_json_binary(&packet)?,
        timeout: env
            .block
            .time
            .plus_seconds(DELIVER_RANDOMNESS_PACKET_LIFETIME)
            .into(),
    };

    Ok(Response::new()
        .add_message(msg)
        .add_attribute("action", "submit_randomness")
        .add_attribute("oracle_request_id", oracle_request_id.to_string())
        .add_attribute("request_id", job.request_id.to_string())
        .add_attribute("channel_id", job.channel))
}

fn execute_set_config(
    deps: DepsMut,
    info: MessageInfo,
    manager: Option<String>,
    coordinator: Option<String>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    ensure_eq!(info.sender, config.manager, ContractError::Unauthorized);

    let manager = match manager {
        Some(ma) => deps.api.addr_validate(&ma)?,
        None => config.manager,
    };
    let coordinator = match coordinator {
        Some(co) => Some(deps.api.addr_validate(&co)?),
        None => config.coordinator,
    };

    CONFIG.save(
        deps.storage,
        &Config {
            manager,
            coordinator,
        },
    )?;
    Ok(Response::default())
}

fn source_id(oracle_request_id: u64) -> String {
    format!("{SOURCE_ID_PREFIX}:{oracle_request_id}")
}

fn parse_source_id(source_id: &str) -> Option<u64> {
    source_id
        .strip_prefix(SOURCE_ID_PREFIX)?
        .strip_prefix(':')?
        .parse()
        .ok()
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, _env: Env, msg: QueryMsg) -> StdResult<QueryResponse> {
    let response = match msg {
        QueryMsg::Config {} => to_json_binary(&query_config(deps)?)?,
        QueryMsg::Job { oracle_request_id } => to_json_binary(&JobResponse {
            job: JOBS.may_load(deps.storage, oracle_request_id)?,
        })?,
        QueryMsg::Jobs { start_after, limit } => {
            to_json_binary(&query_jobs(deps, start_after, limit)?)?
        }
        QueryMsg::Stats {} => to_json_binary(&StatsResponse {
            jobs: JOBS_LAST_ID.may_load(deps.storage)?.unwrap_or_default(),
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

fn query_jobs(deps: Deps, start_after: Option<u64>, limit: Option<u32>) -> StdResult<JobsResponse> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    let jobs: Vec<QueriedJob> = JOBS
        .range(deps.storage, start, None, Order::Ascending)
        .take(limit)
        .map(|result| result.map(|(id, job)| QueriedJob { id, job }))
        .collect::<StdResult<_>>()?;
    Ok(JobsResponse { jobs })
}

#[cfg_attr(not(feature = "library"), entry_point)]
/// enforces ordering and versioing constraints
pub fn ibc_channel_open(
    _deps: DepsMut,
    _env: Env,
    msg: IbcChannelOpenMsg,
) -> Result<IbcChannelOpenResponse, ContractError> {
    let channel = msg.channel();

    check_order(&channel.order)?;
    // In ibcv3 we don't check the version string passed in the message
    // and only check the counterparty version.
    if let Some(counter_version) = msg.counterparty_version() {
        check_version(counter_version)?;
    }

    // We return the version we need (which could be different than the counterparty version)
    Ok(Some(Ibc3ChannelOpenResponse {
        version: IBC_APP_VERSION.to_string(),
    }))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_channel_connect(
    _deps: DepsMut,
    _env: Env,
    msg: IbcChannelConnectMsg,
) -> StdResult<IbcBasicResponse> {
    let channel = msg.channel();
    let chan_id = &channel.endpoint.channel_id;

    Ok(IbcBasicResponse::new()
        .add_attribute("action", "ibc_connect")
        .add_attribute("channel_id", chan_id)
        .add_event(Event::new("ibc").add_attribute("channel", "connect")))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_channel_close(
    _deps: DepsMut,
    _env: Env,
    msg: IbcChannelCloseMsg,
) -> Result<IbcBasicResponse, ContractError> {
    match msg {
        // This side of the channel never initiates a close.
        IbcChannelCloseMsg::CloseInit { channel: _ } => Err(ContractError::ChannelMustNotBeClosed),
        IbcChannelCloseMsg::CloseConfirm { channel } => Ok(IbcBasicResponse::new()
            .add_attribute("action", "ibc_close")
            .add_attribute("channel_id", channel.endpoint.channel_id)),
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
        let channel = packet.dest.channel_id;
        let RequestRandomnessPacket { request_id } = from_json(&packet.data)?;
        receive_request_randomness(deps, channel, request_id)
    })()
    .or_else(|e: ContractError| {
        // we try to capture all app-level errors and convert them into
        // acknowledgement packets that contain an error code.
        let acknowledgement = StdAck::error(format!("Error processing packet: {e}"));
        Ok(IbcReceiveResponse::new(acknowledgement)
            .add_event(Event::new("ibc").add_attribute("packet", "receive")))
    })
}

/// Queues a job for the coordinator and acks with the source ID the
/// randomness will carry.
fn receive_request_randomness(
    deps: DepsMut,
    channel: String,
    request_id: u64,
) -> Result<IbcReceiveResponse, ContractError> {
    let oracle_request_id = JOBS_LAST_ID.may_load(deps.storage)?.unwrap_or(0) + 1;
    JOBS_LAST_ID.save(deps.storage, &oracle_request_id)?;

    let job = OracleJob {
        request_id,
        channel: channel.clone(),
    };
    JOBS.save(deps.storage, oracle_request_id, &job)?;

    let source_id = source_id(oracle_request_id);
    let ack = StdAck::success(to_json_binary(&RequestRandomnessPacketAck::Queued {
        source_id: source_id.clone(),
    })?);
    Ok(IbcReceiveResponse::new(ack)
        .add_attribute("action", "receive_request_randomness")
        .add_event(
            Event::new("oracle-request")
                .add_attribute("oracle_request_id", oracle_request_id.to_string())
                .add_attribute("request_id", request_id.to_string())
                .add_attribute("channel_id", channel)
                .add_attribute("source_id", source_id),
        ))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn ibc_packet_ack(
    _deps: DepsMut,
    _env: Env,
    msg: IbcPacketAckMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let ack: StdAck = from_json(&msg.acknowledgement.data)?;
    let is_error = matches!(ack, StdAck::Error(_));
    Ok(IbcBasicResponse::new()
        .add_attribute("action", "ack")
        .add_attribute("is_error", is_error.to_string()))
}

#[cfg_attr(not(feature = "library"), entry_point)]
/// A delivery that was never relayed. The job is restored so the
/// coordinator can submit the randomness again.
pub fn ibc_packet_timeout(
    deps: DepsMut,
    _env: Env,
    msg: IbcPacketTimeoutMsg,
) -> Result<IbcBasicResponse, ContractError> {
    let DeliverRandomnessPacket {
        request_id,
        source_id,
        ..
    } = from_json(&msg.packet.data)?;
    let mut res = IbcBasicResponse::new().add_attribute("action", "ibc_packet_timeout");
    if let Some(oracle_request_id) = parse_source_id(&source_id) {
        let job = OracleJob {
            request_id,
            channel: msg.packet.src.channel_id,
        };
        JOBS.save(deps.storage, oracle_request_id, &job)?;
        res = res.add_attribute("requeued", oracle_request_id.to_string());
    }
    Ok(res)
}
