//! Configuration and Constants Tests
//!
//! Tests to verify configuration values and option decoding are consistent.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test config_tests

use ogn_tracker::config::*;
use ogn_tracker::options::{OptionStore, StaticOptions};
use ogn_tracker::types::{AntennaSelect, JamRatio, OperMode, OptionId};

// =============================================================================
// Timing Constants
// =============================================================================

#[test]
fn cycle_is_one_gps_second() {
    assert_eq!(HPT_CYCLE_MS, 1000);
}

#[test]
fn lbt_window_fits_between_slots() {
    // First slot opens at 400 ms, second at 800 ms
    assert!(400 + LBT_WINDOW_MS <= 800);
    assert_eq!(LBT_WINDOW_MS, 380);
}

#[test]
fn timer_periods() {
    assert_eq!(RADIO_SETTLE_MS, 1000);
    assert_eq!(JAMMER_RETRY_MS, 2);
    assert_eq!(POWER_DOWN_DEBOUNCE_MS, 1000);
    assert_eq!(SHUTDOWN_SETTLE_MS, 500);
}

#[test]
fn queue_and_buffer_sizes() {
    assert_eq!(TASK_QUEUE_DEPTH, 10);
    assert_eq!(OGN_PKT_LEN, 26);
    // A hex dump of one packet plus CRLF fits a console line
    assert!(OGN_PKT_LEN * 2 + 2 <= CONSOLE_LINE_LEN);
    assert!(MAX_ACTIONS_PER_ADVANCE >= MAX_HPT_TABLE_LEN);
}

#[test]
fn watchdog_reload_fits_twelve_bits() {
    assert!(IWDG_RELOAD <= 0x0FFF);
}

#[test]
fn channel_indices() {
    assert_eq!(CHANNEL_868_2, 2);
    assert_eq!(CHANNEL_868_4, 4);
}

#[test]
fn pin_map() {
    assert_eq!(pins::GPS_PPS, "PC6");
    assert_eq!(pins::TRK_EN, "PC4");
    assert_eq!(pins::GPS_ANT_SW, "PC8");
}

// =============================================================================
// Options
// =============================================================================

#[test]
fn default_options() {
    let options = StaticOptions::default();
    assert_eq!(options.oper_mode(), DEFAULT_MODE);
    assert_eq!(options.jam_ratio().as_percent(), DEFAULT_JAM_RATIO);
    assert!(!options.watchdog_disabled());
    assert_eq!(options.antenna(), AntennaSelect::Internal);
}

#[test]
fn option_bytes_by_id() {
    let options = StaticOptions::new()
        .with_mode(OperMode::Jammer)
        .with_jam_ratio(30);
    assert_eq!(options.get(OptionId::OperMode), 4);
    assert_eq!(options.get(OptionId::JamRatio), 30);
}

#[test]
fn mode_byte_decoding_is_total() {
    assert_eq!(OperMode::from_option(0), OperMode::Protocol);
    assert_eq!(OperMode::from_option(1), OperMode::Idle);
    assert_eq!(OperMode::from_option(2), OperMode::ContinuousWave);
    assert_eq!(OperMode::from_option(3), OperMode::ReceiveOnly);
    assert_eq!(OperMode::from_option(4), OperMode::Jammer);
    assert_eq!(OperMode::from_option(5), OperMode::Protocol);
    assert_eq!(OperMode::from_option(0xFF), OperMode::Protocol);
}

#[test]
fn jam_ratio_bounds() {
    assert_eq!(JamRatio::from_percent(150), JamRatio::ALWAYS);
    assert!(!JamRatio::NEVER.admits(0));
    assert!(JamRatio::ALWAYS.admits(99));
    assert!(JamRatio::from_percent(50).admits(49));
    assert!(!JamRatio::from_percent(50).admits(50));
}

#[test]
fn external_antenna_drives_switch_high() {
    let options = StaticOptions {
        gps_antenna: 1,
        ..StaticOptions::new()
    };
    assert_eq!(options.antenna(), AntennaSelect::External);
    assert!(AntennaSelect::External.switch_high());
    assert!(!AntennaSelect::Internal.switch_high());
}
