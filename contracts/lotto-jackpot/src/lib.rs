pub mod contract;
pub mod distribution;
pub mod error;
pub mod msg;
pub mod state;
