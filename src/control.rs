//! Control Task
//!
//! Mode state machine and message handlers of the tracker's Control task.

pub mod report;
pub mod task;

pub use report::ConsoleLine;
pub use task::{ControlTask, Effect, Effects, PacketBuilder};
