//! Option Store Access
//!
//! Persistent options are owned by an external store; the core only reads
//! single bytes through [`OptionStore`].

use crate::config::{DEFAULT_JAM_RATIO, DEFAULT_MODE};
use crate::types::{AntennaSelect, JamRatio, OperMode, OptionId};

/// Read access to persistent options
pub trait OptionStore {
    /// Get the stored byte for an option
    fn get(&self, id: OptionId) -> u8;

    /// Operating mode (unknown values fall back to protocol mode)
    fn oper_mode(&self) -> OperMode {
        OperMode::from_option(self.get(OptionId::OperMode))
    }

    /// Jammer transmit ratio
    fn jam_ratio(&self) -> JamRatio {
        JamRatio::from_percent(self.get(OptionId::JamRatio))
    }

    /// Whether the independent watchdog stays disabled
    fn watchdog_disabled(&self) -> bool {
        self.get(OptionId::WatchdogDisable) != 0
    }

    /// GPS antenna selection
    fn antenna(&self) -> AntennaSelect {
        AntennaSelect::from_option(self.get(OptionId::GpsAntenna))
    }
}

/// Fixed option values
///
/// Used when no persistent store is linked and by host tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StaticOptions {
    /// Raw mode byte
    pub oper_mode: u8,
    /// Jam ratio in percent
    pub jam_ratio: u8,
    /// Watchdog disable flag
    pub watchdog_disable: u8,
    /// GPS antenna flag
    pub gps_antenna: u8,
}

impl StaticOptions {
    /// Defaults for a freshly flashed tracker
    #[must_use]
    pub const fn new() -> Self {
        Self {
            oper_mode: DEFAULT_MODE.as_option(),
            jam_ratio: DEFAULT_JAM_RATIO,
            watchdog_disable: 0,
            gps_antenna: 0,
        }
    }

    /// Same options with another mode
    #[must_use]
    pub const fn with_mode(self, mode: OperMode) -> Self {
        Self {
            oper_mode: mode.as_option(),
            ..self
        }
    }

    /// Same options with a raw (possibly invalid) mode byte
    #[must_use]
    pub const fn with_raw_mode(self, raw: u8) -> Self {
        Self {
            oper_mode: raw,
            ..self
        }
    }

    /// Same options with another jam ratio
    #[must_use]
    pub const fn with_jam_ratio(self, percent: u8) -> Self {
        Self {
            jam_ratio: percent,
            ..self
        }
    }
}

impl Default for StaticOptions {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionStore for StaticOptions {
    fn get(&self, id: OptionId) -> u8 {
        match id {
            OptionId::OperMode => self.oper_mode,
            OptionId::JamRatio => self.jam_ratio,
            OptionId::WatchdogDisable => self.watchdog_disable,
            OptionId::GpsAntenna => self.gps_antenna,
        }
    }
}
