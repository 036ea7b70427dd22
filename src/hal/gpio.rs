//! GPIO Abstractions
//!
//! Type-safe wrappers for the tracker's board lines.
//! Provides semantic meaning to pins through the type system.

use embassy_stm32::gpio::Output;

use crate::types::{AntennaSelect, LedState};

/// RX indicator LED (active low)
pub struct RxLed<'d> {
    pin: Output<'d>,
    state: LedState,
}

impl<'d> RxLed<'d> {
    /// Create the LED driver and switch it off
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        let mut led = Self {
            pin,
            state: LedState::Off,
        };
        led.set(LedState::Off);
        led
    }

    /// Drive the LED to a state
    pub fn set(&mut self, state: LedState) {
        match state {
            LedState::On => self.pin.set_low(),
            LedState::Off => self.pin.set_high(),
        }
        self.state = state;
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> LedState {
        self.state
    }
}

/// Test line driven by the `GpioUp`/`GpioDown` table events
pub struct TestPin<'d> {
    pin: Output<'d>,
}

impl<'d> TestPin<'d> {
    /// Wrap the test output
    #[must_use]
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }

    /// Drive the line
    pub fn set(&mut self, high: bool) {
        if high {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}

/// `TRK_EN#` enable for peripherals without a soft shutdown (active low)
pub struct TrackerEnable<'d> {
    pin: Output<'d>,
}

impl<'d> TrackerEnable<'d> {
    /// Take the line and enable the peripherals
    #[must_use]
    pub fn enabled(pin: Output<'d>) -> Self {
        let mut line = Self { pin };
        line.enable();
        line
    }

    /// Power the peripherals
    pub fn enable(&mut self) {
        self.pin.set_low();
    }

    /// Cut peripheral power
    pub fn disable(&mut self) {
        self.pin.set_high();
    }
}

/// GPS antenna switch
pub struct AntennaSwitch<'d> {
    pin: Output<'d>,
}

impl<'d> AntennaSwitch<'d> {
    /// Take the switch line and select an antenna
    #[must_use]
    pub fn new(pin: Output<'d>, antenna: AntennaSelect) -> Self {
        let mut switch = Self { pin };
        switch.select(antenna);
        switch
    }

    /// Route the GPS to an antenna
    pub fn select(&mut self, antenna: AntennaSelect) {
        if antenna.switch_high() {
            self.pin.set_high();
        } else {
            self.pin.set_low();
        }
    }
}
