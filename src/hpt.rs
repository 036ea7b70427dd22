//! High-Precision Timer
//!
//! Table-driven scheduling of radio and housekeeping actions inside the
//! one-second GPS cycle, resynchronized on every PPS edge.

pub mod action;
pub mod scheduler;
pub mod table;

pub use action::{Action, TaskId};
pub use scheduler::{Actions, HptScheduler, PpsLatch};
pub use table::{Event, HptOpcode, HptTable};
