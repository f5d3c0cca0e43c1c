use thiserror::Error;

use cosmwasm_std::StdError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Base boost must be at least 1.0x (10000 bps)")]
    BaseBoostTooLow,

    #[error("Max boost exceeds the hard ceiling")]
    MaxBoostTooHigh,

    #[error("Max boost must not be below base boost")]
    BoostRangeInverted,

    #[error("Fallback resolution requires a configured jackpot contract")]
    FallbackWithoutJackpot,

    #[error("Config must not point the contract at itself")]
    SelfReference,

    #[error("No funds in denom '{denom}' sent")]
    MissingDenom { denom: String },

    #[error("Delayed entry {id} not found")]
    DelayedEntryNotFound { id: u64 },

    #[error("The jackpot contract is not set")]
    UnsetJackpot,

    #[error("Local jackpot is empty")]
    EmptyJackpot,
}
