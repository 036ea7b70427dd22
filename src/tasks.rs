//! Embassy Tasks
//!
//! Imperative shell around the functional core. Each task owns its state,
//! waits on queues, timers or EXTI edges, feeds the core and performs the
//! effects the core returns. Inter-task queues are static channels; sends
//! wait until there is room.

use embassy_futures::select::{select, Either};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::Output;
use embassy_stm32::rtc::Rtc;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use rand_wyrand::WyRand;

use crate::config::{CONSOLE_QUEUE_DEPTH, HPT_CYCLE_MS, RADIO_SETTLE_MS, TASK_QUEUE_DEPTH, WAKE_POLARITY};
use crate::control::{ConsoleLine, ControlTask, Effect, Effects, PacketBuilder};
use crate::error::PowerError;
use crate::hal::gpio::{AntennaSwitch, RxLed, TestPin, TrackerEnable};
use crate::hal::watchdog::Watchdog;
use crate::hpt::{Action, HptScheduler, HptTable, PpsLatch, TaskId};
use crate::message::{Message, OgnPacket};
use crate::power::{run_shutdown, status_led, PowerEvent, PowerSequencer, ShutdownHooks, WakePolarity};
use crate::{log_debug, log_error, log_info};

/// Control task inbound queue
pub static CONTROL_QUEUE: Channel<CriticalSectionRawMutex, Message, TASK_QUEUE_DEPTH> =
    Channel::new();

/// Radio task inbound queue
pub static RADIO_QUEUE: Channel<CriticalSectionRawMutex, Message, TASK_QUEUE_DEPTH> =
    Channel::new();

/// Console output lines
pub static CONSOLE_QUEUE: Channel<CriticalSectionRawMutex, ConsoleLine, CONSOLE_QUEUE_DEPTH> =
    Channel::new();

/// Radio channel requests from the table scheduler
pub static RADIO_CHANNEL: Signal<CriticalSectionRawMutex, u8> = Signal::new();

/// PPS resync latch shared by the PPS edge and the scheduler
pub static PPS_LATCH: PpsLatch = PpsLatch::new();

/// Wakes the HPT driver early on a PPS edge
static PPS_WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Active table, handed from Control to the HPT driver once
static TABLE_HANDOFF: Signal<CriticalSectionRawMutex, HptTable> = Signal::new();

/// Control task state on this target
pub type TrackerControl = ControlTask<NoFix>;

/// Packet builder used until a position source is linked: never has a fix
pub struct NoFix;

impl PacketBuilder for NoFix {
    fn prepare(&mut self) -> Option<OgnPacket> {
        None
    }
}

#[allow(clippy::cast_possible_truncation)]
fn now_ms() -> u32 {
    // Wrapping millisecond clock; the power sequencer uses wrapping arithmetic
    Instant::now().as_millis() as u32
}

// =============================================================================
// Control
// =============================================================================

/// Control task: hands the mode's table to the HPT driver, starts the mode
/// after the radio settled and then serves its queue and the jammer timer.
#[embassy_executor::task]
pub async fn control_task(mut control: TrackerControl, mut rng: WyRand) {
    TABLE_HANDOFF.signal(control.table());

    Timer::after_millis(RADIO_SETTLE_MS).await;
    let mut jammer_at = None;
    perform(control.start_mode(&mut rng), &mut jammer_at).await;

    loop {
        let event = match jammer_at {
            Some(at) => select(CONTROL_QUEUE.receive(), Timer::at(at)).await,
            None => Either::First(CONTROL_QUEUE.receive().await),
        };
        let effects = match event {
            Either::First(msg) => control.handle(&msg),
            Either::Second(()) => {
                jammer_at = None;
                control.jammer_tick(&mut rng)
            }
        };
        perform(effects, &mut jammer_at).await;
    }
}

async fn perform(effects: Effects, jammer_at: &mut Option<Instant>) {
    for effect in effects {
        match effect {
            Effect::ToRadio(msg) => RADIO_QUEUE.send(msg).await,
            Effect::ToConsole(line) => CONSOLE_QUEUE.send(line).await,
            Effect::ArmJammerTimer { period_ms } => {
                *jammer_at = Some(Instant::now() + Duration::from_millis(period_ms));
            }
        }
    }
}

// =============================================================================
// High-precision timer
// =============================================================================

/// HPT driver: sleeps until the next due event or a PPS edge, then advances
/// the scheduler by the elapsed wall time and performs its actions.
#[embassy_executor::task]
pub async fn hpt_task(
    mut scheduler: HptScheduler<'static, WyRand>,
    mut watchdog: Watchdog<'static>,
    mut test_pin: TestPin<'static>,
) {
    scheduler.load_table(TABLE_HANDOFF.wait().await);
    if let Err(err) = scheduler.start() {
        log_error!("HPT: start failed: {}", err);
        return;
    }

    let mut last = Instant::now();
    loop {
        let wait_ms = scheduler.until_next().unwrap_or(HPT_CYCLE_MS);
        let _ = select(Timer::after_millis(wait_ms.into()), PPS_WAKE.wait()).await;

        // Only whole milliseconds are consumed; the remainder stays in `last`
        let delta = u32::try_from((Instant::now() - last).as_millis()).unwrap_or(u32::MAX);
        last += Duration::from_millis(delta.into());

        for action in scheduler.advance(delta) {
            match action {
                Action::SetChannel(channel) => RADIO_CHANNEL.signal(channel),
                Action::ReloadWatchdog => watchdog.service(),
                Action::TestGpio(high) => test_pin.set(high),
                Action::Post { to: TaskId::Control, message } => CONTROL_QUEUE.send(message).await,
                Action::Post { to: TaskId::Radio, message } => RADIO_QUEUE.send(message).await,
            }
        }
    }
}

/// GPS PPS edge: latch a cycle restart and wake the HPT driver
#[embassy_executor::task]
pub async fn pps_task(mut pps: ExtiInput<'static>) {
    loop {
        pps.wait_for_rising_edge().await;
        if PPS_LATCH.restart_from_isr() {
            PPS_WAKE.signal(());
        }
    }
}

// =============================================================================
// Power and status
// =============================================================================

/// Board side of the shutdown sequence
pub struct BoardShutdown {
    radio_sdn: Output<'static>,
    gps_enable: Output<'static>,
    rtc: Rtc,
    lines: Option<(TrackerEnable<'static>, AntennaSwitch<'static>)>,
}

impl BoardShutdown {
    /// Collect the lines and backup domain the sequence needs
    #[must_use]
    pub fn new(
        radio_sdn: Output<'static>,
        gps_enable: Output<'static>,
        rtc: Rtc,
        trk_en: TrackerEnable<'static>,
        antenna: AntennaSwitch<'static>,
    ) -> Self {
        Self {
            radio_sdn,
            gps_enable,
            rtc,
            lines: Some((trk_en, antenna)),
        }
    }
}

impl ShutdownHooks for BoardShutdown {
    fn notify_console(&mut self, text: &str) -> Result<(), PowerError> {
        // The console task never runs again once shutdown blocks the executor
        console_write(text);
        Ok(())
    }

    fn radio_shutdown(&mut self) -> Result<(), PowerError> {
        self.radio_sdn.set_high();
        Ok(())
    }

    fn gps_off(&mut self) -> Result<(), PowerError> {
        self.gps_enable.set_low();
        Ok(())
    }

    fn release_gpio(&mut self) {
        // Dropping the drivers returns the pins to their reset state
        if let Some((mut trk_en, _antenna)) = self.lines.take() {
            trk_en.disable();
        }
    }

    fn write_backup(&mut self, register: u8, value: u32) -> Result<(), PowerError> {
        let register = usize::from(register);
        self.rtc
            .read_backup_register(register)
            .ok_or(PowerError::BackupWriteFailed)?;
        self.rtc.write_backup_register(register, value);
        Ok(())
    }

    fn delay_ms(&mut self, ms: u32) {
        embassy_time::block_for(Duration::from_millis(ms.into()));
    }

    fn system_reset(&mut self) {
        cortex_m::peripheral::SCB::sys_reset();
    }
}

async fn wait_for_assert(wake: &mut ExtiInput<'static>) {
    match WAKE_POLARITY {
        WakePolarity::ActiveHigh => wake.wait_for_rising_edge().await,
        WakePolarity::ActiveLow => wake.wait_for_falling_edge().await,
    }
}

/// Power button: debounce the wake line and run the shutdown sequence when
/// it is still held after the window
#[embassy_executor::task]
pub async fn power_task(mut wake: ExtiInput<'static>, mut board: BoardShutdown) {
    let mut sequencer = PowerSequencer::new();
    loop {
        match sequencer.remaining_ms(now_ms()) {
            None => {
                wait_for_assert(&mut wake).await;
                sequencer.on_wake_edge(now_ms());
            }
            Some(ms) => {
                match select(wait_for_assert(&mut wake), Timer::after_millis(ms.into())).await {
                    Either::First(()) => sequencer.on_wake_edge(now_ms()),
                    Either::Second(()) => {
                        if sequencer.poll(now_ms(), wake.is_high()) == PowerEvent::Shutdown {
                            let failures = run_shutdown(&mut board);
                            log_error!("Power: reset did not happen ({} failed steps)", failures);
                        }
                    }
                }
            }
        }
    }
}

/// Status button: mirror the button level on the RX LED
#[embassy_executor::task]
pub async fn status_task(mut button: ExtiInput<'static>, mut led: RxLed<'static>) {
    loop {
        led.set(status_led(button.is_high()));
        log_debug!("Status: LED {}", led.state());
        button.wait_for_any_edge().await;
    }
}

// =============================================================================
// Console and radio sinks
// =============================================================================

fn console_write(text: &str) {
    log_info!("{}", text.trim_end());
}

/// Console output: drains console lines to the RTT log
#[embassy_executor::task]
pub async fn console_task() {
    loop {
        let line = CONSOLE_QUEUE.receive().await;
        console_write(line.as_str());
    }
}

/// Radio queue sink until the transceiver driver is linked
#[embassy_executor::task]
pub async fn radio_task() {
    loop {
        match select(RADIO_QUEUE.receive(), RADIO_CHANNEL.wait()).await {
            Either::First(msg) => log_debug!("Radio: {}", msg),
            Either::Second(channel) => log_debug!("Radio: channel {}", channel),
        }
    }
}
