//! Power Management
//!
//! Power-button debounce, the reset-based shutdown sequence, watchdog
//! configuration and the status button indicator.
//!
//! The tracker cannot switch itself off while the independent watchdog is
//! armed, so shutdown persists a marker in the backup domain and resets.
//! Boot-time logic sees the marker and finishes the power-down.

use crate::config::{
    IWDG_LSI_HZ, IWDG_PRESCALER, IWDG_RELOAD, POWER_DOWN_DEBOUNCE_MS, SHUTDOWN_BACKUP_REGISTER,
    SHUTDOWN_MAGIC, SHUTDOWN_NOTICE, SHUTDOWN_SETTLE_MS, WAKE_POLARITY,
};
use crate::error::PowerError;
use crate::options::OptionStore;
use crate::types::LedState;
use crate::{log_info, log_warn};

/// Electrical level meaning "button held" on the wake line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WakePolarity {
    /// High level = held
    ActiveHigh,
    /// Low level = held
    ActiveLow,
}

impl WakePolarity {
    /// Whether a line level reads as asserted
    #[must_use]
    pub const fn is_asserted(self, line_high: bool) -> bool {
        match self {
            Self::ActiveHigh => line_high,
            Self::ActiveLow => !line_high,
        }
    }
}

/// Power sequencer state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PowerState {
    /// Running normally
    #[default]
    Idle,
    /// Wake edge seen, waiting for the debounce window to expire
    Debouncing {
        /// Time of the most recent wake edge
        since_ms: u32,
    },
    /// Shutdown sequence started; ends in a reset
    ShuttingDown,
}

#[cfg(feature = "embedded")]
impl defmt::Format for PowerState {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(f, "IDLE"),
            Self::Debouncing { since_ms } => defmt::write!(f, "DEBOUNCE({}ms)", since_ms),
            Self::ShuttingDown => defmt::write!(f, "SHUTDOWN"),
        }
    }
}

/// Outcome of a debounce check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PowerEvent {
    /// Nothing changed
    None,
    /// Window expired with the line released; back to idle
    Released,
    /// Window expired with the line held; run the shutdown sequence
    Shutdown,
}

/// Debounced power-button state machine
#[derive(Clone, Copy, Debug)]
pub struct PowerSequencer {
    state: PowerState,
    debounce_ms: u32,
    polarity: WakePolarity,
}

impl PowerSequencer {
    /// Create a sequencer with the board debounce window and polarity
    #[must_use]
    pub const fn new() -> Self {
        Self::with_window(POWER_DOWN_DEBOUNCE_MS, WAKE_POLARITY)
    }

    /// Create a sequencer with an explicit window and polarity
    #[must_use]
    pub const fn with_window(debounce_ms: u32, polarity: WakePolarity) -> Self {
        Self {
            state: PowerState::Idle,
            debounce_ms,
            polarity,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> PowerState {
        self.state
    }

    /// Wake-line edge at `now_ms`.
    ///
    /// Starts the debounce window, or restarts it from this edge when one is
    /// already running. Ignored once shutdown has begun.
    pub fn on_wake_edge(&mut self, now_ms: u32) {
        if self.state == PowerState::ShuttingDown {
            return;
        }
        self.state = PowerState::Debouncing { since_ms: now_ms };
    }

    /// Time left in the debounce window, if one is running
    #[must_use]
    pub fn remaining_ms(&self, now_ms: u32) -> Option<u32> {
        match self.state {
            PowerState::Debouncing { since_ms } => {
                Some(self.debounce_ms.saturating_sub(now_ms.wrapping_sub(since_ms)))
            }
            PowerState::Idle | PowerState::ShuttingDown => None,
        }
    }

    /// Check the debounce window at `now_ms` with the current line level
    pub fn poll(&mut self, now_ms: u32, line_high: bool) -> PowerEvent {
        match self.remaining_ms(now_ms) {
            Some(0) => {
                if self.polarity.is_asserted(line_high) {
                    self.state = PowerState::ShuttingDown;
                    PowerEvent::Shutdown
                } else {
                    self.state = PowerState::Idle;
                    PowerEvent::Released
                }
            }
            Some(_) | None => PowerEvent::None,
        }
    }
}

impl Default for PowerSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// One step of the shutdown sequence
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShutdownStep {
    /// Tell the user on the console
    NotifyConsole,
    /// Put the radio into its shutdown state
    RadioShutdown,
    /// Switch the GPS receiver off
    GpsOff,
    /// Release port GPIOs before the reset reconfigures them
    ReleaseGpio,
    /// Persist the shutdown marker in the backup domain
    PersistMarker,
    /// Let pending writes settle
    Settle,
    /// Force a full system reset
    Reset,
}

#[cfg(feature = "embedded")]
impl defmt::Format for ShutdownStep {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::NotifyConsole => defmt::write!(f, "NotifyConsole"),
            Self::RadioShutdown => defmt::write!(f, "RadioShutdown"),
            Self::GpsOff => defmt::write!(f, "GpsOff"),
            Self::ReleaseGpio => defmt::write!(f, "ReleaseGpio"),
            Self::PersistMarker => defmt::write!(f, "PersistMarker"),
            Self::Settle => defmt::write!(f, "Settle"),
            Self::Reset => defmt::write!(f, "Reset"),
        }
    }
}

/// Shutdown steps in execution order
pub const SHUTDOWN_SEQUENCE: [ShutdownStep; 7] = [
    ShutdownStep::NotifyConsole,
    ShutdownStep::RadioShutdown,
    ShutdownStep::GpsOff,
    ShutdownStep::ReleaseGpio,
    ShutdownStep::PersistMarker,
    ShutdownStep::Settle,
    ShutdownStep::Reset,
];

/// Board operations used by the shutdown sequence
pub trait ShutdownHooks {
    /// Send text to the console
    ///
    /// # Errors
    ///
    /// Fails when the console cannot take the text.
    fn notify_console(&mut self, text: &str) -> Result<(), PowerError>;

    /// Put the radio into shutdown
    ///
    /// # Errors
    ///
    /// Fails when the radio cannot be reached.
    fn radio_shutdown(&mut self) -> Result<(), PowerError>;

    /// Switch the GPS off
    ///
    /// # Errors
    ///
    /// Fails when the GPS cannot be reached.
    fn gps_off(&mut self) -> Result<(), PowerError>;

    /// Return owned GPIO lines to their reset state
    fn release_gpio(&mut self);

    /// Write a backup-domain register
    ///
    /// # Errors
    ///
    /// Fails when the backup domain rejects the write.
    fn write_backup(&mut self, register: u8, value: u32) -> Result<(), PowerError>;

    /// Busy-wait
    fn delay_ms(&mut self, ms: u32);

    /// Reset the system; does not return on hardware
    fn system_reset(&mut self);
}

/// Run the shutdown sequence.
///
/// Every step is best-effort: a failing step is logged and the sequence
/// moves on, so the reset is always reached. Returns the number of steps
/// that failed (only observable where the reset returns, i.e. in tests).
pub fn run_shutdown<H: ShutdownHooks>(hooks: &mut H) -> usize {
    log_info!("Power: shutdown sequence");
    let mut failures = 0;
    for step in SHUTDOWN_SEQUENCE {
        let result = match step {
            ShutdownStep::NotifyConsole => hooks.notify_console(SHUTDOWN_NOTICE),
            ShutdownStep::RadioShutdown => hooks.radio_shutdown(),
            ShutdownStep::GpsOff => hooks.gps_off(),
            ShutdownStep::ReleaseGpio => {
                hooks.release_gpio();
                Ok(())
            }
            ShutdownStep::PersistMarker => {
                hooks.write_backup(SHUTDOWN_BACKUP_REGISTER, SHUTDOWN_MAGIC)
            }
            ShutdownStep::Settle => {
                hooks.delay_ms(SHUTDOWN_SETTLE_MS);
                Ok(())
            }
            ShutdownStep::Reset => {
                hooks.system_reset();
                Ok(())
            }
        };
        if let Err(err) = result {
            log_warn!("Power: {} failed: {}", step, err);
            failures += 1;
        }
    }
    failures
}

/// Independent watchdog setup
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WatchdogConfig {
    /// Whether the watchdog gets started at all
    pub enabled: bool,
    /// Prescaler divider applied to the LSI clock
    pub prescaler: u32,
    /// Reload value
    pub reload: u16,
}

impl WatchdogConfig {
    /// Configuration from the `WatchdogDisable` option
    pub fn from_options<O: OptionStore>(options: &O) -> Self {
        Self {
            enabled: !options.watchdog_disabled(),
            prescaler: IWDG_PRESCALER,
            reload: IWDG_RELOAD,
        }
    }

    /// Time until an unserviced watchdog resets the system
    #[must_use]
    pub fn timeout_ms(&self) -> u32 {
        (u32::from(self.reload) + 1) * self.prescaler * 1000 / IWDG_LSI_HZ
    }

    /// Timeout in microseconds, as taken by the HAL watchdog driver
    #[must_use]
    pub fn timeout_us(&self) -> u32 {
        self.timeout_ms() * 1000
    }
}

/// RX indicator for a status button level (LED is active low)
#[must_use]
pub const fn status_led(line_high: bool) -> LedState {
    if line_high {
        LedState::Off
    } else {
        LedState::On
    }
}
