mod checks;
mod ibc_msg;

use cosmwasm_std::IbcOrder;

pub use checks::{check_order, check_version, ChannelError};
pub use ibc_msg::{
    DeliverRandomnessPacket, DeliverRandomnessPacketAck, RequestRandomnessPacket,
    RequestRandomnessPacketAck,
};

pub const IBC_APP_VERSION: &str = "lotto-v1";
pub const APP_ORDER: IbcOrder = IbcOrder::Unordered;
// we use this for tests to ensure it is rejected
pub const BAD_APP_ORDER: IbcOrder = IbcOrder::Ordered;

// A request that is not relayed within the lifetime triggers the timeout
// handler on the consumer, which re-queues the request for a bounded number
// of retries. In order to avoid unintended timeouts due to relayer downtime,
// we set the lifetime generously.
pub const REQUEST_RANDOMNESS_PACKET_LIFETIME: u64 = 100 * 24 * 3600; // seconds
pub const DELIVER_RANDOMNESS_PACKET_LIFETIME: u64 = 100 * 24 * 3600; // seconds
