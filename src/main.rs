//! OGN Tracker Main Application
//!
//! Entry point for the STM32G474-based tracker firmware.
//! Initializes hardware and spawns async tasks.

#![no_std]
#![no_main]

use defmt::{info, unwrap};
use embassy_executor::Spawner;
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Level, Output, Pull, Speed};
use embassy_stm32::rng::Rng;
use embassy_stm32::rtc::{Rtc, RtcConfig};
use embassy_stm32::{bind_interrupts, peripherals, rng};
use rand_core::{RngCore, SeedableRng};
use rand_wyrand::WyRand;
use {defmt_rtt as _, panic_probe as _};

use ogn_tracker::hal::gpio::{AntennaSwitch, RxLed, TestPin, TrackerEnable};
use ogn_tracker::hal::watchdog::Watchdog;
use ogn_tracker::prelude::*;
use ogn_tracker::tasks::{self, BoardShutdown, NoFix, PPS_LATCH};

// Bind interrupt handlers
bind_interrupts!(struct Irqs {
    RNG => rng::InterruptHandler<peripherals::RNG>;
});

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("OGN Tracker Firmware v{}", env!("CARGO_PKG_VERSION"));

    // RNG runs from HSI48
    let mut config = embassy_stm32::Config::default();
    config.rcc.hsi48 = Some(Default::default());
    config.rcc.mux.clk48sel = embassy_stm32::rcc::mux::Clk48sel::HSI48;
    let p = embassy_stm32::init(config);

    info!("Peripherals initialized");

    let options = StaticOptions::new();

    // Peripherals without a soft shutdown are powered through TRK_EN#
    let trk_en = TrackerEnable::enabled(Output::new(p.PC4, Level::High, Speed::Low));
    let antenna = AntennaSwitch::new(Output::new(p.PC8, Level::Low, Speed::Low), options.antenna());
    let radio_sdn = Output::new(p.PA10, Level::Low, Speed::Low);
    let gps_enable = Output::new(p.PB2, Level::High, Speed::Low);

    // Seed the software generators from the hardware RNG
    let mut hw_rng = Rng::new(p.RNG, Irqs);
    let control_rng = WyRand::seed_from_u64(hw_rng.next_u64());
    let hpt_rng = WyRand::seed_from_u64(hw_rng.next_u64());

    let watchdog = Watchdog::start(p.IWDG, WatchdogConfig::from_options(&options));
    let rtc = Rtc::new(p.RTC, RtcConfig::default());

    let control = ControlTask::new(&options, NoFix);
    let scheduler = HptScheduler::new(&PPS_LATCH, hpt_rng);
    let test_pin = TestPin::new(Output::new(p.PA5, Level::Low, Speed::VeryHigh));

    let pps = ExtiInput::new(p.PC6, p.EXTI6, Pull::None);
    let wake = ExtiInput::new(p.PC13, p.EXTI13, Pull::Down);
    let button = ExtiInput::new(p.PC2, p.EXTI2, Pull::Up);
    let led = RxLed::new(Output::new(p.PB1, Level::High, Speed::Low));

    let board = BoardShutdown::new(radio_sdn, gps_enable, rtc, trk_en, antenna);

    // Spawn tasks
    unwrap!(spawner.spawn(tasks::console_task()));
    unwrap!(spawner.spawn(tasks::radio_task()));
    unwrap!(spawner.spawn(tasks::hpt_task(scheduler, watchdog, test_pin)));
    unwrap!(spawner.spawn(tasks::control_task(control, control_rng)));
    unwrap!(spawner.spawn(tasks::pps_task(pps)));
    unwrap!(spawner.spawn(tasks::power_task(wake, board)));
    unwrap!(spawner.spawn(tasks::status_task(button, led)));

    info!("Tasks spawned, mode {}", options.oper_mode());
}
