use thiserror::Error;

use cosmwasm_std::StdError;
use lotto_protocol::ChannelError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    ChannelError(#[from] ChannelError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Win threshold must be in (0, 10000]")]
    InvalidWinThreshold,

    #[error("The oracle channel is not set")]
    UnsetChannel,

    #[error("The oracle channel is already set. Open a new channel is not allowed.")]
    ChannelAlreadySet,

    #[error("The lottery contract is not set")]
    UnsetLottery,

    #[error("Channel must not be closed")]
    ChannelMustNotBeClosed,

    #[error("This contract must be the IBC handshake initiator")]
    MustBeChainA,

    #[error("Request {request_id} not found")]
    RequestNotFound { request_id: u64 },

    #[error("Request {request_id} is not due for a retry yet")]
    RetryTooEarly { request_id: u64 },

    #[error("Request {request_id} exhausted its retries")]
    RetriesExhausted { request_id: u64 },

    #[error("Randomness must be 32 bytes")]
    InvalidRandomness,
}
