use thiserror::Error;

use cosmwasm_std::StdError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Distribution percentage too low")]
    PercentageTooLow,

    #[error("Distribution percentage too high")]
    PercentageTooHigh,

    #[error("Secondary winners and shares length mismatch")]
    MismatchedSecondaryWinners,

    #[error("Secondary shares must not sum to zero")]
    ZeroSecondaryShares,

    #[error("Nothing to distribute")]
    NothingToDistribute,

    #[error("No funds in denom '{denom}' sent")]
    MissingDenom { denom: String },

    #[error("Randomness must be 32 bytes")]
    InvalidRandomness,
}
