//! Event Actions
//!
//! Maps table opcodes to what the scheduler does with them. Each opcode has
//! one row in [`DISPATCH`]; adding an event kind means adding a variant and a
//! row, the scheduler loop itself stays untouched.

use super::table::{Event, HptOpcode};
use crate::message::{Message, MsgOpcode, SourceId};

/// Task that receives a posted message
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskId {
    /// Control task queue
    Control,
    /// Radio task queue
    Radio,
}

#[cfg(feature = "embedded")]
impl defmt::Format for TaskId {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Control => defmt::write!(f, "CTRL"),
            Self::Radio => defmt::write!(f, "RADIO"),
        }
    }
}

/// Side effect produced by the scheduler for its driver to perform
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Retune the radio to a channel index
    SetChannel(u8),
    /// Service the independent watchdog
    ReloadWatchdog,
    /// Drive the test GPIO (true = high)
    TestGpio(bool),
    /// Enqueue a message on a task queue
    Post {
        /// Destination queue
        to: TaskId,
        /// Message to enqueue
        message: Message,
    },
}

impl Action {
    /// Transmit command for the radio, issued when an LBT delay expires
    #[must_use]
    pub const fn transmit() -> Self {
        Self::Post {
            to: TaskId::Radio,
            message: Message::command(MsgOpcode::RadioTxPacket, SourceId::Hpt),
        }
    }

    const fn notify_control(opcode: MsgOpcode) -> Self {
        Self::Post {
            to: TaskId::Control,
            message: Message::from_hpt(opcode),
        }
    }
}

#[cfg(feature = "embedded")]
impl defmt::Format for Action {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::SetChannel(ch) => defmt::write!(f, "SetChannel({})", ch),
            Self::ReloadWatchdog => defmt::write!(f, "ReloadWatchdog"),
            Self::TestGpio(high) => defmt::write!(f, "TestGpio({})", high),
            Self::Post { to, message } => defmt::write!(f, "Post({}, {})", to, message),
        }
    }
}

/// How the scheduler reacts to one event
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Step {
    /// Emit an action right away
    Fire(Action),
    /// Arm a transmit at a random delay inside the window
    ArmTransmit {
        /// Window length in ms
        window_ms: u32,
    },
    /// Rewind to the start of the cycle
    Restart,
    /// Stop firing until the next PPS edge
    Park,
    /// Nothing to do
    Skip,
}

/// Opcode handler
pub type Handler = fn(&Event) -> Step;

/// Per-opcode dispatch table
pub const DISPATCH: [(HptOpcode, Handler); 9] = [
    (HptOpcode::End, park),
    (HptOpcode::Restart, restart),
    (HptOpcode::GpioUp, gpio_up),
    (HptOpcode::GpioDown, gpio_down),
    (HptOpcode::PreparePacket, prepare_packet),
    (HptOpcode::CopyPacket, copy_packet),
    (HptOpcode::SetChannel, set_channel),
    (HptOpcode::TransmitLbt, transmit_lbt),
    (HptOpcode::WatchdogReload, reload_watchdog),
];

fn park(_: &Event) -> Step {
    Step::Park
}

fn restart(_: &Event) -> Step {
    Step::Restart
}

fn gpio_up(_: &Event) -> Step {
    Step::Fire(Action::TestGpio(true))
}

fn gpio_down(_: &Event) -> Step {
    Step::Fire(Action::TestGpio(false))
}

fn prepare_packet(_: &Event) -> Step {
    Step::Fire(Action::notify_control(MsgOpcode::HptPreparePacket))
}

fn copy_packet(_: &Event) -> Step {
    Step::Fire(Action::notify_control(MsgOpcode::HptCopyPacket))
}

fn set_channel(event: &Event) -> Step {
    match u8::try_from(event.data) {
        Ok(channel) => Step::Fire(Action::SetChannel(channel)),
        Err(_) => Step::Skip,
    }
}

fn transmit_lbt(event: &Event) -> Step {
    Step::ArmTransmit {
        window_ms: event.data,
    }
}

fn reload_watchdog(_: &Event) -> Step {
    Step::Fire(Action::ReloadWatchdog)
}

/// Resolve an event through the dispatch table.
///
/// Opcodes without a row are a no-op.
#[must_use]
pub fn dispatch(event: &Event) -> Step {
    DISPATCH
        .iter()
        .find(|(opcode, _)| *opcode == event.opcode)
        .map_or(Step::Skip, |(_, handler)| handler(event))
}
