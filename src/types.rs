//! Shared types used across the tracker firmware
//!
//! This module defines domain-specific types that enforce invariants
//! at compile time and provide type safety throughout the codebase.

/// Operating mode selected by the `OperMode` option
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OperMode {
    /// OGN protocol transmission (normal tracker operation)
    #[default]
    Protocol,
    /// Idle: radio quiet, watchdog serviced
    Idle,
    /// Continuous-wave carrier test
    ContinuousWave,
    /// Receive-only test, received packets dumped to console
    ReceiveOnly,
    /// Jammer test: random packets at a configurable ratio
    Jammer,
}

impl OperMode {
    /// Decode a stored option byte.
    ///
    /// Mode selection is total: anything outside the known set falls back to
    /// the protocol mode.
    #[must_use]
    pub const fn from_option(raw: u8) -> Self {
        match raw {
            1 => Self::Idle,
            2 => Self::ContinuousWave,
            3 => Self::ReceiveOnly,
            4 => Self::Jammer,
            _ => Self::Protocol,
        }
    }

    /// Option byte for this mode
    #[must_use]
    pub const fn as_option(self) -> u8 {
        match self {
            Self::Protocol => 0,
            Self::Idle => 1,
            Self::ContinuousWave => 2,
            Self::ReceiveOnly => 3,
            Self::Jammer => 4,
        }
    }

    /// HPT table variant driven by this mode
    #[must_use]
    pub const fn table_variant(self) -> TableVariant {
        match self {
            Self::Protocol => TableVariant::Protocol,
            Self::Idle | Self::ContinuousWave | Self::ReceiveOnly => TableVariant::Idle,
            Self::Jammer => TableVariant::IdleWithChannelHop,
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for OperMode {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Protocol => defmt::write!(f, "OGN"),
            Self::Idle => defmt::write!(f, "IDLE"),
            Self::ContinuousWave => defmt::write!(f, "CW"),
            Self::ReceiveOnly => defmt::write!(f, "RX"),
            Self::Jammer => defmt::write!(f, "JAMMER"),
        }
    }
}

/// HPT table layout
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TableVariant {
    /// Full protocol cycle: packet copy, two LBT slots, packet prepare
    Protocol,
    /// Watchdog service only
    Idle,
    /// Watchdog service plus the two-channel hop
    IdleWithChannelHop,
}

#[cfg(feature = "embedded")]
impl defmt::Format for TableVariant {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Protocol => defmt::write!(f, "Protocol"),
            Self::Idle => defmt::write!(f, "Idle"),
            Self::IdleWithChannelHop => defmt::write!(f, "IdleHop"),
        }
    }
}

/// Persistent option identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionId {
    /// Operating mode byte
    OperMode,
    /// Jammer transmit ratio in percent
    JamRatio,
    /// Non-zero disables the independent watchdog
    WatchdogDisable,
    /// Non-zero selects the external GPS antenna
    GpsAntenna,
}

/// Jammer transmit ratio (0-100 %)
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct JamRatio(u8);

impl JamRatio {
    /// Never transmit
    pub const NEVER: Self = Self(0);

    /// Transmit on every tick
    pub const ALWAYS: Self = Self(100);

    /// Create from a percentage, saturating at 100
    #[must_use]
    pub const fn from_percent(percent: u8) -> Self {
        if percent > 100 {
            Self(100)
        } else {
            Self(percent)
        }
    }

    /// Get the ratio as a percentage
    #[must_use]
    pub const fn as_percent(self) -> u8 {
        self.0
    }

    /// Decide one tick from a uniform draw in `0..100`
    #[must_use]
    pub const fn admits(self, draw: u8) -> bool {
        draw < self.0
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for JamRatio {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "{}%", self.0);
    }
}

/// GPS antenna in use
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AntennaSelect {
    /// On-board patch antenna
    #[default]
    Internal,
    /// External antenna via the antenna switch
    External,
}

impl AntennaSelect {
    /// Decode the `GpsAntenna` option byte
    #[must_use]
    pub const fn from_option(raw: u8) -> Self {
        if raw == 0 {
            Self::Internal
        } else {
            Self::External
        }
    }

    /// Level of the antenna switch line
    #[must_use]
    pub const fn switch_high(self) -> bool {
        matches!(self, Self::External)
    }
}

/// Indicator LED state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LedState {
    /// LED is off
    #[default]
    Off,
    /// LED is on
    On,
}

#[cfg(feature = "embedded")]
impl defmt::Format for LedState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Off => defmt::write!(f, "OFF"),
            Self::On => defmt::write!(f, "ON"),
        }
    }
}
