pub mod boost;
pub mod contract;
pub mod error;
pub mod msg;
pub mod probability;
pub mod state;
