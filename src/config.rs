//! System configuration and hardware constants
//!
//! This module defines compile-time constants for the tracker hardware and
//! the control core. Timing, table limits, queue depths and pin mappings are
//! centralized here; run-time settings live in the option store.

use crate::power::WakePolarity;
use crate::types::OperMode;

/// Maximum number of events in one HPT table
pub const MAX_HPT_TABLE_LEN: usize = 16;

/// Length of one HPT cycle (one GPS second)
pub const HPT_CYCLE_MS: u32 = 1000;

/// Maximum actions returned from a single scheduler advance
pub const MAX_ACTIONS_PER_ADVANCE: usize = 32;

/// Listen-before-talk transmit window used by the protocol table
pub const LBT_WINDOW_MS: u32 = 380;

/// Depth of every task inbound queue
pub const TASK_QUEUE_DEPTH: usize = 10;

/// Depth of the console line queue
pub const CONSOLE_QUEUE_DEPTH: usize = 8;

/// Maximum characters in one console line
pub const CONSOLE_LINE_LEN: usize = 80;

/// OGN packet length on air (payload + FEC), in bytes
pub const OGN_PKT_LEN: usize = 26;

/// Radio warm-up delay before the mode start action
pub const RADIO_SETTLE_MS: u64 = 1000;

/// Jammer retry cadence
pub const JAMMER_RETRY_MS: u64 = 2;

/// Power button must stay asserted this long to power off
pub const POWER_DOWN_DEBOUNCE_MS: u32 = 1000;

/// Level of the wake line that means "button held"
pub const WAKE_POLARITY: WakePolarity = WakePolarity::ActiveHigh;

/// Delay between persisting the shutdown marker and the reset
pub const SHUTDOWN_SETTLE_MS: u32 = 500;

/// Backup register that carries the shutdown marker across reset
pub const SHUTDOWN_BACKUP_REGISTER: u8 = 1;

/// Shutdown marker value observed by boot-time power-up logic
pub const SHUTDOWN_MAGIC: u32 = 0x5348_444E;

/// Independent watchdog clock (LSI) in Hz
pub const IWDG_LSI_HZ: u32 = 40_000;

/// Independent watchdog prescaler divider
pub const IWDG_PRESCALER: u32 = 64;

/// Independent watchdog reload value (12-bit maximum)
pub const IWDG_RELOAD: u16 = 0x0FFF;

/// Default operating mode when the option store is blank
pub const DEFAULT_MODE: OperMode = OperMode::Protocol;

/// Default jammer transmit ratio in percent
pub const DEFAULT_JAM_RATIO: u8 = 50;

/// Radio channel index for 868.2 MHz
pub const CHANNEL_868_2: u8 = 2;

/// Radio channel index for 868.4 MHz
pub const CHANNEL_868_4: u8 = 4;

/// Text sent to the console when shutdown begins
pub const SHUTDOWN_NOTICE: &str = "Shutdown...\r\n";

/// Pin assignments for GPIO
pub mod pins {
    //! GPIO pin assignments matching the tracker schematic

    /// GPS PPS input (rising edge)
    pub const GPS_PPS: &str = "PC6";

    /// Power/wake button input
    pub const WAKEUP: &str = "PC13";

    /// Status button B1 (both edges)
    pub const BUTTON_B1: &str = "PC2";

    /// RX indicator LED (active low)
    pub const LED_RX: &str = "PB1";

    /// Tracker enable for peripherals without soft shutdown (active low)
    pub const TRK_EN: &str = "PC4";

    /// GPS external antenna switch
    pub const GPS_ANT_SW: &str = "PC8";

    /// Radio shutdown input (high = shutdown)
    pub const RADIO_SDN: &str = "PA10";

    /// GPS power enable
    pub const GPS_EN: &str = "PB2";

    /// Test GPIO driven by the `GpioUp`/`GpioDown` table opcodes
    pub const TEST_GPIO: &str = "PA5";
}

