use cosmwasm_schema::cw_serde;
use cosmwasm_std::HexBinary;

/// This is the message we send over the IBC channel from lotto-consumer to
/// lotto-requester.
#[cw_serde]
pub struct RequestRandomnessPacket {
    /// The ID the consumer assigned to this request. Strictly increasing per
    /// origin chain. The requester treats this as opaque and echoes it back.
    pub request_id: u64,
}

#[cw_serde]
#[non_exhaustive]
pub enum RequestRandomnessPacketAck {
    /// The request was stored on the oracle chain and awaits the
    /// external randomness coordinator.
    Queued {
        /// An oracle specific randomness source identifier, e.g. `vrf:<oracle request id>`
        source_id: String,
    },
}

/// This is the message we send over the IBC channel from lotto-requester back
/// to the originating lotto-consumer.
#[cw_serde]
pub struct DeliverRandomnessPacket {
    /// The consumer-assigned request ID this randomness belongs to.
    pub request_id: u64,
    /// 32 bytes of verified randomness.
    pub randomness: HexBinary,
    /// An oracle specific randomness source identifier, e.g. `vrf:<oracle request id>`
    pub source_id: String,
}

/// The ack the consumer must send when receiving a `DeliverRandomnessPacket`.
///
/// This is a lighweight structure as the requester does not do anything other
/// than simple logging of the delivery ack.
#[cw_serde]
#[derive(Default)]
pub struct DeliverRandomnessPacketAck {}
