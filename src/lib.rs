//! OGN Tracker Firmware Library
//!
//! This library provides the control core of an STM32G474-based OGN
//! tracker: a GPS-synchronized radio beacon that transmits position packets
//! in fixed slots of every GPS second.
//!
//! # Architecture
//!
//! The firmware is organized in layers:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      EMBASSY TASKS                           │
//! │  Control  │  HPT driver  │  PPS  │  Power  │  Status          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    FUNCTIONAL CORE                           │
//! │  HPT scheduler  │  Control FSM  │  Power sequencer           │
//! ├─────────────────────────────────────────────────────────────┤
//! │                       HAL LAYER                              │
//! │  GPIO lines  │  EXTI  │  IWDG  │  RTC backup  │  RNG          │
//! ├─────────────────────────────────────────────────────────────┤
//! │                    RTOS / SCHEDULER                          │
//! │           embassy-rs (async/await executor)                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **Functional core, imperative shell**: schedulers and state machines
//!   return actions; only the tasks touch queues and peripherals
//! - **Type-driven design**: tables are validated once at construction
//! - **No unsafe in application code**
//! - **Total policies**: unknown modes and opcodes fall back, never fail

#![cfg_attr(feature = "embedded", no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export dependencies needed by applications (only in embedded mode)
#[cfg(feature = "embedded")]
pub use embassy_executor;
#[cfg(feature = "embedded")]
pub use embassy_stm32;
#[cfg(feature = "embedded")]
pub use embassy_time;

/// Logging macros
pub mod logging;

/// System configuration and constants
pub mod config;

/// Shared types used across modules
pub mod types;

/// Error types
pub mod error;

/// Persistent option access
pub mod options;

/// Inter-task message envelope
pub mod message;

/// High-Precision Timer
///
/// Table-driven scheduling inside the GPS second.
pub mod hpt;

/// Control Task
///
/// Mode state machine, packet hand-off and console reports.
pub mod control;

/// Power Management
///
/// Power-button debounce, shutdown sequence, watchdog configuration.
pub mod power;

/// Hardware Abstraction Layer
///
/// Board lines and watchdog over STM32G474 peripherals.
#[cfg(feature = "embedded")]
pub mod hal;

/// Embassy tasks and static queues
#[cfg(feature = "embedded")]
pub mod tasks;

/// Prelude module for common imports
pub mod prelude {
    //! Convenient re-exports for common types and traits.

    pub use crate::config::*;
    pub use crate::types::*;

    pub use crate::control::{ControlTask, Effect, PacketBuilder};
    pub use crate::error::{PowerError, TableError};
    pub use crate::hpt::{Action, Event, HptOpcode, HptScheduler, HptTable, PpsLatch};
    pub use crate::message::{Message, MsgOpcode, OgnPacket, Payload, SourceId};
    pub use crate::options::{OptionStore, StaticOptions};
    pub use crate::power::{PowerEvent, PowerSequencer, WatchdogConfig};

    // Embassy
    #[cfg(feature = "embedded")]
    pub use embassy_time::{Duration, Instant, Timer};
}
