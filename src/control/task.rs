//! Control Task State Machine
//!
//! Owns the operating mode and the cached outbound packet. Every entry point
//! is a pure transition that returns the [`Effects`] the task shell must
//! perform; the shell owns the queues and the timers.

use heapless::Vec;
use rand_core::RngCore;

use super::report::{packet_report, ConsoleLine};
use crate::config::JAMMER_RETRY_MS;
use crate::hpt::HptTable;
use crate::message::{Message, MsgOpcode, OgnPacket, Payload, SourceId};
use crate::options::OptionStore;
use crate::types::{JamRatio, OperMode};
use crate::{log_debug, log_info};

/// Builds outbound packets from the current position fix
pub trait PacketBuilder {
    /// Encode the next packet, or `None` without a usable fix
    fn prepare(&mut self) -> Option<OgnPacket>;
}

/// Side effect requested by the Control task
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Enqueue on the radio queue
    ToRadio(Message),
    /// Enqueue a console line
    ToConsole(ConsoleLine),
    /// (Re)arm the one-shot jammer retry timer
    ArmJammerTimer {
        /// Delay until the next jammer tick
        period_ms: u64,
    },
}

/// Effects of one transition
pub type Effects = Vec<Effect, 4>;

/// Control task state
pub struct ControlTask<B: PacketBuilder> {
    mode: OperMode,
    jam_ratio: JamRatio,
    builder: B,
    tx_packet: Option<OgnPacket>,
}

impl<B: PacketBuilder> ControlTask<B> {
    /// Create the task from the persistent options
    pub fn new<O: OptionStore>(options: &O, builder: B) -> Self {
        let mode = options.oper_mode();
        log_info!("Control: mode {}", mode);
        Self {
            mode,
            jam_ratio: options.jam_ratio(),
            builder,
            tx_packet: None,
        }
    }

    /// Selected operating mode
    #[must_use]
    pub const fn mode(&self) -> OperMode {
        self.mode
    }

    /// Configured jammer ratio
    #[must_use]
    pub const fn jam_ratio(&self) -> JamRatio {
        self.jam_ratio
    }

    /// Packet waiting for the next copy event
    #[must_use]
    pub const fn cached_packet(&self) -> Option<&OgnPacket> {
        self.tx_packet.as_ref()
    }

    /// HPT table for the selected mode
    #[must_use]
    pub fn table(&self) -> HptTable {
        HptTable::for_variant(self.mode.table_variant())
    }

    /// Mode start action, run once the radio has settled
    pub fn start_mode<R: RngCore>(&mut self, rng: &mut R) -> Effects {
        let mut effects = Effects::new();
        match self.mode {
            OperMode::ContinuousWave => {
                let _ = effects.push(Effect::ToRadio(Message::command(
                    MsgOpcode::RadioStartCw,
                    SourceId::Control,
                )));
            }
            OperMode::ReceiveOnly => {
                let _ = effects.push(Effect::ToRadio(Message::command(
                    MsgOpcode::RadioStartRx,
                    SourceId::Control,
                )));
            }
            OperMode::Jammer => {
                let mut packet = OgnPacket::EMPTY;
                rng.fill_bytes(packet.as_mut_bytes());
                let _ = effects.push(Effect::ToRadio(Message::new(
                    MsgOpcode::RadioCopyPacket,
                    Payload::Packet(packet),
                    SourceId::Control,
                )));
                let _ = effects.push(Effect::ArmJammerTimer {
                    period_ms: JAMMER_RETRY_MS,
                });
            }
            OperMode::Protocol | OperMode::Idle => {}
        }
        effects
    }

    /// Dispatch one inbound message by its source
    pub fn handle(&mut self, msg: &Message) -> Effects {
        match msg.source {
            SourceId::Hpt => self.handle_hpt(msg),
            SourceId::Radio => self.handle_radio(msg),
            SourceId::Control | SourceId::Console | SourceId::Gps => Effects::new(),
        }
    }

    fn handle_hpt(&mut self, msg: &Message) -> Effects {
        let mut effects = Effects::new();
        match msg.opcode {
            MsgOpcode::HptPreparePacket => {
                self.tx_packet = self.builder.prepare();
                if self.tx_packet.is_none() {
                    log_debug!("Control: no packet prepared");
                }
            }
            MsgOpcode::HptCopyPacket => {
                let payload = self.tx_packet.take().map_or(Payload::Clear, Payload::Packet);
                let _ = effects.push(Effect::ToRadio(Message::new(
                    MsgOpcode::RadioCopyPacket,
                    payload,
                    SourceId::Control,
                )));
            }
            _ => {}
        }
        effects
    }

    fn handle_radio(&mut self, msg: &Message) -> Effects {
        let mut effects = Effects::new();
        if let (MsgOpcode::RadioPacketReady, Payload::Received(packet)) = (msg.opcode, &msg.payload) {
            for line in packet_report(packet) {
                let _ = effects.push(Effect::ToConsole(line));
            }
        }
        effects
    }

    /// Jammer retry timer expiry.
    ///
    /// Transmits with probability `jam_ratio` and always re-arms the timer.
    /// Outside jammer mode the timer is left disarmed.
    pub fn jammer_tick<R: RngCore>(&mut self, rng: &mut R) -> Effects {
        let mut effects = Effects::new();
        if self.mode != OperMode::Jammer {
            return effects;
        }
        #[allow(clippy::cast_possible_truncation)]
        let draw = (rng.next_u32() % 100) as u8;
        if self.jam_ratio.admits(draw) {
            let _ = effects.push(Effect::ToRadio(Message::command(
                MsgOpcode::RadioTxPacket,
                SourceId::Control,
            )));
        }
        let _ = effects.push(Effect::ArmJammerTimer {
            period_ms: JAMMER_RETRY_MS,
        });
        effects
    }
}
