//! Independent Watchdog
//!
//! Thin wrapper over the IWDG driver. The timeout is derived from
//! [`WatchdogConfig`]; when the option store disables the watchdog the
//! peripheral is never unleashed and servicing is a no-op.

use embassy_stm32::peripherals::IWDG;
use embassy_stm32::wdg::IndependentWatchdog;

use crate::log_info;
use crate::power::WatchdogConfig;

/// Independent watchdog, possibly disabled
pub struct Watchdog<'d> {
    inner: Option<IndependentWatchdog<'d, IWDG>>,
}

impl<'d> Watchdog<'d> {
    /// Configure and start the watchdog unless disabled
    pub fn start(iwdg: IWDG, config: WatchdogConfig) -> Self {
        if !config.enabled {
            log_info!("IWDG: disabled by option");
            return Self { inner: None };
        }
        let mut wdg = IndependentWatchdog::new(iwdg, config.timeout_us());
        wdg.unleash();
        log_info!("IWDG: started, timeout {}ms", config.timeout_ms());
        Self { inner: Some(wdg) }
    }

    /// Reload the counter
    pub fn service(&mut self) {
        if let Some(wdg) = self.inner.as_mut() {
            wdg.pet();
        }
    }
}
