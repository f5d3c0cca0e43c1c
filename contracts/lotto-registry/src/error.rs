use thiserror::Error;

use cosmwasm_std::StdError;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Chain {chain_id} is already registered")]
    ChainAlreadyRegistered { chain_id: u32 },

    #[error("Chain {chain_id} is not registered")]
    ChainNotFound { chain_id: u32 },

    #[error("Chain info field '{field}' must not be empty")]
    EmptyAddress { field: &'static str },
}
