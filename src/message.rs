//! Inter-task Messages
//!
//! Every task owns one inbound queue of fixed-size [`Message`] envelopes.
//! Packet bytes travel by value inside the envelope, so a sender never
//! shares a buffer with the receiver and nothing is allocated.

use crate::config::OGN_PKT_LEN;

/// One encoded OGN packet as handed to the radio
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct OgnPacket([u8; OGN_PKT_LEN]);

impl OgnPacket {
    /// All-zero packet
    pub const EMPTY: Self = Self([0; OGN_PKT_LEN]);

    /// Wrap encoded bytes
    #[must_use]
    pub const fn new(bytes: [u8; OGN_PKT_LEN]) -> Self {
        Self(bytes)
    }

    /// Packet bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; OGN_PKT_LEN] {
        &self.0
    }

    /// Mutable packet bytes
    pub fn as_mut_bytes(&mut self) -> &mut [u8; OGN_PKT_LEN] {
        &mut self.0
    }
}

impl core::fmt::Debug for OgnPacket {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "OgnPacket(")?;
        for byte in &self.0 {
            write!(f, "{byte:02X}")?;
        }
        write!(f, ")")
    }
}

/// Packet received by the radio, with link quality indicators
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReceivedPacket {
    /// Received signal strength in dBm
    pub rssi_dbm: f32,
    /// Link quality indicator
    pub lqi: u8,
    /// Preamble quality indicator
    pub pqi: u8,
    /// Sync word quality indicator
    pub sqi: u8,
    /// Decoded packet bytes
    pub data: [u8; OGN_PKT_LEN],
    /// Per-byte error mask from the FEC decoder
    pub err: [u8; OGN_PKT_LEN],
}

/// Task that produced a message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceId {
    /// High-precision timer (table scheduler)
    Hpt,
    /// Radio transceiver task
    Radio,
    /// Control task
    Control,
    /// Console task
    Console,
    /// GPS task
    Gps,
}

#[cfg(feature = "embedded")]
impl defmt::Format for SourceId {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Hpt => defmt::write!(f, "HPT"),
            Self::Radio => defmt::write!(f, "RADIO"),
            Self::Control => defmt::write!(f, "CTRL"),
            Self::Console => defmt::write!(f, "CONSOLE"),
            Self::Gps => defmt::write!(f, "GPS"),
        }
    }
}

/// Message opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MsgOpcode {
    /// Timer -> Control: build the next packet from the position fix
    HptPreparePacket,
    /// Timer -> Control: forward the cached packet to the radio
    HptCopyPacket,
    /// Control -> Radio: load packet into the TX buffer (or clear it)
    RadioCopyPacket,
    /// Any -> Radio: transmit the TX buffer now
    RadioTxPacket,
    /// Control -> Radio: start continuous-wave carrier
    RadioStartCw,
    /// Control -> Radio: start continuous receive
    RadioStartRx,
    /// Radio -> Control: a packet was received
    RadioPacketReady,
}

#[cfg(feature = "embedded")]
impl defmt::Format for MsgOpcode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::HptPreparePacket => defmt::write!(f, "HPT_PREPARE_PKT"),
            Self::HptCopyPacket => defmt::write!(f, "HPT_COPY_PKT"),
            Self::RadioCopyPacket => defmt::write!(f, "RADIO_COPY_PKT"),
            Self::RadioTxPacket => defmt::write!(f, "RADIO_TX_PKT"),
            Self::RadioStartCw => defmt::write!(f, "RADIO_START_CW"),
            Self::RadioStartRx => defmt::write!(f, "RADIO_START_RX"),
            Self::RadioPacketReady => defmt::write!(f, "RADIO_PKT_READY"),
        }
    }
}

/// Message payload: a value or data carried by value
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Payload {
    /// No data
    None,
    /// Plain integer argument
    Value(u32),
    /// Packet to transmit
    Packet(OgnPacket),
    /// Explicit "no packet ready": the receiver clears its buffer
    Clear,
    /// Packet received over the air
    Received(ReceivedPacket),
}

impl Payload {
    /// Length field value for this payload
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn len(&self) -> u8 {
        match self {
            Self::None | Self::Value(_) => 0,
            // Clear keeps the packet length so the radio wipes the whole buffer
            Self::Packet(_) | Self::Clear | Self::Received(_) => OGN_PKT_LEN as u8,
        }
    }

    /// Whether the payload carries no data
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }
}

/// Fixed-size inter-task message envelope
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Message {
    /// What the receiver should do
    pub opcode: MsgOpcode,
    /// Payload length in bytes
    pub length: u8,
    /// Payload
    pub payload: Payload,
    /// Sending task
    pub source: SourceId,
}

impl Message {
    /// Build a message, deriving the length from the payload
    #[must_use]
    pub const fn new(opcode: MsgOpcode, payload: Payload, source: SourceId) -> Self {
        Self {
            opcode,
            length: payload.len(),
            payload,
            source,
        }
    }

    /// Data-less message
    #[must_use]
    pub const fn command(opcode: MsgOpcode, source: SourceId) -> Self {
        Self::new(opcode, Payload::None, source)
    }

    /// Notification from the table scheduler to the Control task
    #[must_use]
    pub const fn from_hpt(opcode: MsgOpcode) -> Self {
        Self::command(opcode, SourceId::Hpt)
    }

    /// Received-packet notification from the radio
    #[must_use]
    pub const fn packet_ready(packet: ReceivedPacket) -> Self {
        Self::new(
            MsgOpcode::RadioPacketReady,
            Payload::Received(packet),
            SourceId::Radio,
        )
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Message {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Msg({} from {}, len={})", self.opcode, self.source, self.length);
    }
}
