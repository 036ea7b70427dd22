//! Hardware Abstraction Layer
//!
//! Board-line and watchdog drivers over STM32G474 peripherals.
//! This module isolates hardware-specific code from the functional core.

pub mod gpio;
pub mod watchdog;
