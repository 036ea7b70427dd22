//! HPT Event Tables
//!
//! A table is an ordered list of time-stamped events inside the one-second
//! GPS cycle. Tables are validated once when built and never mutated while
//! the scheduler runs.

use heapless::Vec;

use crate::config::{CHANNEL_868_2, CHANNEL_868_4, LBT_WINDOW_MS, MAX_HPT_TABLE_LEN};
use crate::error::{TableError, TableResult};
use crate::types::TableVariant;

/// Table event opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HptOpcode {
    /// Park until the next PPS edge
    End,
    /// Restart the table from the beginning
    Restart,
    /// Drive the test GPIO high
    GpioUp,
    /// Drive the test GPIO low
    GpioDown,
    /// Ask Control to build the next packet
    PreparePacket,
    /// Ask Control to copy the cached packet to the radio
    CopyPacket,
    /// Retune the radio; `data` is the channel index
    SetChannel,
    /// Transmit with listen-before-talk; `data` is the window in ms
    TransmitLbt,
    /// Service the independent watchdog
    WatchdogReload,
    /// Code not known to this firmware (ignored)
    Unknown(u8),
}

impl HptOpcode {
    /// Decode a raw opcode byte
    #[must_use]
    pub const fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::End,
            2 => Self::Restart,
            3 => Self::GpioUp,
            4 => Self::GpioDown,
            5 => Self::PreparePacket,
            6 => Self::CopyPacket,
            7 => Self::SetChannel,
            8 => Self::TransmitLbt,
            9 => Self::WatchdogReload,
            other => Self::Unknown(other),
        }
    }

    /// Raw opcode byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::End => 1,
            Self::Restart => 2,
            Self::GpioUp => 3,
            Self::GpioDown => 4,
            Self::PreparePacket => 5,
            Self::CopyPacket => 6,
            Self::SetChannel => 7,
            Self::TransmitLbt => 8,
            Self::WatchdogReload => 9,
            Self::Unknown(raw) => raw,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for HptOpcode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::End => defmt::write!(f, "END"),
            Self::Restart => defmt::write!(f, "RESTART"),
            Self::GpioUp => defmt::write!(f, "GPIO_UP"),
            Self::GpioDown => defmt::write!(f, "GPIO_DOWN"),
            Self::PreparePacket => defmt::write!(f, "PREPARE_PKT"),
            Self::CopyPacket => defmt::write!(f, "COPY_PKT"),
            Self::SetChannel => defmt::write!(f, "SET_CHANNEL"),
            Self::TransmitLbt => defmt::write!(f, "TX_PKT_LBT"),
            Self::WatchdogReload => defmt::write!(f, "IWDG_RELOAD"),
            Self::Unknown(raw) => defmt::write!(f, "UNKNOWN({})", raw),
        }
    }
}

/// One scheduled event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    /// Offset from the start of the cycle
    pub offset_ms: u32,
    /// What to do
    pub opcode: HptOpcode,
    /// Opcode argument
    pub data: u32,
}

impl Event {
    /// Create an event
    #[must_use]
    pub const fn new(offset_ms: u32, opcode: HptOpcode, data: u32) -> Self {
        Self {
            offset_ms,
            opcode,
            data,
        }
    }

    /// Create an event without argument
    #[must_use]
    pub const fn at(offset_ms: u32, opcode: HptOpcode) -> Self {
        Self::new(offset_ms, opcode, 0)
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Event {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}ms {} ({})", self.offset_ms, self.opcode, self.data);
    }
}

/// Protocol cycle: copy, hop to 868.4, LBT slot, hop to 868.2, LBT slot,
/// watchdog, prepare next packet
const PROTOCOL_EVENTS: [Event; 8] = [
    Event::at(150, HptOpcode::CopyPacket),
    Event::new(300, HptOpcode::SetChannel, CHANNEL_868_4 as u32),
    Event::new(400, HptOpcode::TransmitLbt, LBT_WINDOW_MS),
    Event::new(800, HptOpcode::SetChannel, CHANNEL_868_2 as u32),
    Event::new(800, HptOpcode::TransmitLbt, LBT_WINDOW_MS),
    Event::at(925, HptOpcode::WatchdogReload),
    Event::at(950, HptOpcode::PreparePacket),
    Event::at(1000, HptOpcode::Restart),
];

/// Idle cycle, also used by the CW and RX test modes
const IDLE_EVENTS: [Event; 2] = [
    Event::at(925, HptOpcode::WatchdogReload),
    Event::at(1000, HptOpcode::Restart),
];

/// Idle cycle with the channel hop, used by the jammer
const IDLE_HOP_EVENTS: [Event; 4] = [
    Event::new(300, HptOpcode::SetChannel, CHANNEL_868_4 as u32),
    Event::new(800, HptOpcode::SetChannel, CHANNEL_868_2 as u32),
    Event::at(925, HptOpcode::WatchdogReload),
    Event::at(1000, HptOpcode::Restart),
];

/// Validated, immutable event table
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HptTable {
    events: Vec<Event, MAX_HPT_TABLE_LEN>,
}

impl HptTable {
    /// Validate and copy a list of events.
    ///
    /// # Errors
    ///
    /// Rejects an empty table, more than [`MAX_HPT_TABLE_LEN`] events,
    /// decreasing offsets, a table whose last event is not `Restart`, and a
    /// `Restart` at offset zero.
    pub fn new(events: &[Event]) -> TableResult<Self> {
        validate(events)?;
        Ok(Self::copy_of(events))
    }

    /// Built-in table for a variant
    #[must_use]
    pub fn for_variant(variant: TableVariant) -> Self {
        let events: &[Event] = match variant {
            TableVariant::Protocol => &PROTOCOL_EVENTS,
            TableVariant::Idle => &IDLE_EVENTS,
            TableVariant::IdleWithChannelHop => &IDLE_HOP_EVENTS,
        };
        debug_assert!(validate(events).is_ok());
        Self::copy_of(events)
    }

    fn copy_of(events: &[Event]) -> Self {
        let mut copy = Vec::new();
        for event in events.iter().take(MAX_HPT_TABLE_LEN) {
            // Capacity checked by the take() above
            let _ = copy.push(*event);
        }
        Self { events: copy }
    }

    /// Events in firing order
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Event at an index
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    /// Number of events
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Always false for a validated table
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Offset of the terminal `Restart`, i.e. the cycle length
    #[must_use]
    pub fn cycle_ms(&self) -> u32 {
        self.events.last().map_or(0, |e| e.offset_ms)
    }
}

fn validate(events: &[Event]) -> TableResult<()> {
    let Some(last) = events.last() else {
        return Err(TableError::Empty);
    };
    if events.len() > MAX_HPT_TABLE_LEN {
        return Err(TableError::TooLong { len: events.len() });
    }
    if let Some(index) = events
        .windows(2)
        .position(|pair| pair[1].offset_ms < pair[0].offset_ms)
    {
        return Err(TableError::OutOfOrder { index: index + 1 });
    }
    if last.opcode != HptOpcode::Restart {
        return Err(TableError::MissingRestart);
    }
    if events
        .iter()
        .any(|e| e.opcode == HptOpcode::Restart && e.offset_ms == 0)
    {
        return Err(TableError::ZeroCycle);
    }
    Ok(())
}
