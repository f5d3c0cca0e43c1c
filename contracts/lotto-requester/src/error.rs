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

    #[error("The coordinator address is not set")]
    UnsetCoordinator,

    #[error("Oracle request {oracle_request_id} not found")]
    UnknownOracleRequest { oracle_request_id: u64 },

    #[error("At least one random word must be submitted")]
    NoRandomWords,

    #[error("Randomness must be 32 bytes")]
    InvalidRandomness,

    #[error("Channel must not be closed")]
    ChannelMustNotBeClosed,
}
