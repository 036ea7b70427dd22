//! HPT Table Scheduler
//!
//! Walks the active table against elapsed time inside the GPS second and
//! turns due events into [`Action`]s for the driver task to perform.
//!
//! # Resynchronization
//!
//! The PPS interrupt never touches the scheduler directly. It raises the
//! [`PpsLatch`], and [`HptScheduler::advance`] consumes the latch on entry
//! and again before every event it is about to fire. A PPS edge therefore
//! always wins over a due event: elapsed time and table index are rewound
//! to zero and the event waits for its offset in the new cycle.
//!
//! # Listen-before-talk
//!
//! `TransmitLbt` arms one deferred transmit at a uniform random delay inside
//! the event's window. The delay runs on wall time, not cycle time, so a
//! window crossing the one-second boundary survives the restart.

use core::sync::atomic::{AtomicBool, Ordering};

use heapless::Vec;
use rand_core::RngCore;

use super::action::{dispatch, Action, Step};
use super::table::{Event, HptTable};
use crate::config::MAX_ACTIONS_PER_ADVANCE;
use crate::error::{TableError, TableResult};
use crate::{log_debug, log_trace};

/// Actions emitted by one [`HptScheduler::advance`] call
pub type Actions = Vec<Action, MAX_ACTIONS_PER_ADVANCE>;

/// Interrupt-safe resync request from the PPS edge
#[derive(Debug)]
pub struct PpsLatch {
    pending: AtomicBool,
    running: AtomicBool,
}

impl PpsLatch {
    /// Create a cleared latch
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            running: AtomicBool::new(false),
        }
    }

    /// Request a cycle restart from interrupt context.
    ///
    /// Returns true when a running scheduler has to be woken, i.e. the
    /// interrupt should request a context switch on exit.
    pub fn restart_from_isr(&self) -> bool {
        self.pending.store(true, Ordering::Release);
        self.running.load(Ordering::Acquire)
    }

    /// Whether a restart is waiting to be consumed
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::Release);
    }
}

impl Default for PpsLatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Table-driven event scheduler
pub struct HptScheduler<'a, R: RngCore> {
    latch: &'a PpsLatch,
    rng: R,
    table: Option<HptTable>,
    index: usize,
    elapsed_ms: u32,
    running: bool,
    parked: bool,
    /// Wall time left until the armed LBT transmit
    pending_tx_ms: Option<u32>,
    /// Time not consumed because the action buffer filled up
    carry_ms: u32,
}

impl<'a, R: RngCore> HptScheduler<'a, R> {
    /// Create an idle scheduler with no table
    pub fn new(latch: &'a PpsLatch, rng: R) -> Self {
        Self {
            latch,
            rng,
            table: None,
            index: 0,
            elapsed_ms: 0,
            running: false,
            parked: false,
            pending_tx_ms: None,
            carry_ms: 0,
        }
    }

    /// Replace the active table and rewind to its start
    pub fn load_table(&mut self, table: HptTable) {
        log_debug!("HPT: load table ({} events)", table.len());
        self.table = Some(table);
        self.rewind();
    }

    /// Validate raw events and load them.
    ///
    /// # Errors
    ///
    /// Returns the validation error; the previous table stays active.
    pub fn load_events(&mut self, events: &[Event]) -> TableResult<()> {
        let table = HptTable::new(events)?;
        self.load_table(table);
        Ok(())
    }

    /// Start advancing from the beginning of the table.
    ///
    /// A PPS edge latched while stopped is discarded; the cycle starts now.
    ///
    /// # Errors
    ///
    /// Returns [`TableError::Empty`] when no table has been loaded.
    pub fn start(&mut self) -> TableResult<()> {
        if self.table.is_none() {
            return Err(TableError::Empty);
        }
        self.rewind();
        self.latch.take();
        self.running = true;
        self.latch.set_running(true);
        Ok(())
    }

    /// Stop firing events; the table stays loaded
    pub fn stop(&mut self) {
        self.running = false;
        self.latch.set_running(false);
    }

    /// Rewind elapsed time and index to the start of the cycle
    pub fn restart(&mut self) {
        self.elapsed_ms = 0;
        self.index = 0;
        self.parked = false;
    }

    fn rewind(&mut self) {
        self.restart();
        self.pending_tx_ms = None;
        self.carry_ms = 0;
    }

    /// Move time forward by `delta_ms` and collect due actions.
    ///
    /// Events fire in table order; events sharing an offset fire in the order
    /// they were listed. A pending PPS restart is honored first. If the
    /// action buffer fills up, time stops at the next unfired event and the
    /// unused part of `delta_ms` is added to the following call.
    pub fn advance(&mut self, delta_ms: u32) -> Actions {
        let mut actions = Actions::new();
        if !self.running {
            return actions;
        }
        let delta_ms = delta_ms.saturating_add(core::mem::take(&mut self.carry_ms));

        if self.latch.take() {
            self.resync(delta_ms, &mut actions);
            return actions;
        }

        let mut budget = delta_ms;
        loop {
            let event_in = self.next_event_in();
            let tx_in = self.pending_tx_ms;

            let (wait, is_tx) = match (event_in, tx_in) {
                (None, None) => {
                    self.elapsed_ms = self.elapsed_ms.saturating_add(budget);
                    break;
                }
                (Some(e), None) => (e, false),
                (None, Some(t)) => (t, true),
                (Some(e), Some(t)) => {
                    if t < e {
                        (t, true)
                    } else {
                        (e, false)
                    }
                }
            };

            if wait > budget {
                self.consume(budget);
                break;
            }
            self.consume(wait);
            budget -= wait;

            if actions.is_full() {
                self.carry_ms = budget;
                break;
            }

            if is_tx {
                self.pending_tx_ms = None;
                log_trace!("HPT: LBT transmit at {}ms", self.elapsed_ms);
                let _ = actions.push(Action::transmit());
                continue;
            }

            if self.latch.take() {
                self.resync(budget, &mut actions);
                break;
            }
            self.fire_next(&mut actions);
        }
        actions
    }

    /// Time until the next event or armed transmit
    #[must_use]
    pub fn until_next(&self) -> Option<u32> {
        if !self.running {
            return None;
        }
        match (self.next_event_in(), self.pending_tx_ms) {
            (Some(e), Some(t)) => Some(e.min(t)),
            (e, t) => e.or(t),
        }
    }

    fn next_event_in(&self) -> Option<u32> {
        if self.parked {
            return None;
        }
        self.table
            .as_ref()
            .and_then(|table| table.get(self.index))
            .map(|event| event.offset_ms.saturating_sub(self.elapsed_ms))
    }

    fn consume(&mut self, ms: u32) {
        self.elapsed_ms = self.elapsed_ms.saturating_add(ms);
        if let Some(tx) = self.pending_tx_ms.as_mut() {
            *tx -= ms.min(*tx);
        }
    }

    /// Restart on a PPS edge observed now; the armed transmit keeps running
    /// on wall time.
    fn resync(&mut self, remaining_ms: u32, actions: &mut Actions) {
        log_trace!("HPT: PPS resync at {}ms", self.elapsed_ms);
        self.restart();
        if let Some(tx) = self.pending_tx_ms {
            if tx <= remaining_ms {
                self.pending_tx_ms = None;
                let _ = actions.push(Action::transmit());
            } else {
                self.pending_tx_ms = Some(tx - remaining_ms);
            }
        }
    }

    fn fire_next(&mut self, actions: &mut Actions) {
        let Some(event) = self.table.as_ref().and_then(|t| t.get(self.index)).copied() else {
            return;
        };
        self.index += 1;

        match dispatch(&event) {
            Step::Fire(action) => {
                let _ = actions.push(action);
            }
            Step::ArmTransmit { window_ms } => {
                let delay = if window_ms == 0 {
                    0
                } else {
                    self.rng.next_u32() % window_ms
                };
                self.pending_tx_ms = Some(delay);
            }
            Step::Restart => self.restart(),
            Step::Park => self.parked = true,
            Step::Skip => {}
        }
    }

    /// Active table
    #[must_use]
    pub fn table(&self) -> Option<&HptTable> {
        self.table.as_ref()
    }

    /// Elapsed time in the current cycle
    #[must_use]
    pub const fn elapsed_ms(&self) -> u32 {
        self.elapsed_ms
    }

    /// Index of the next event to fire
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Whether the scheduler is advancing
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Whether an `End` event parked the cycle
    #[must_use]
    pub const fn is_parked(&self) -> bool {
        self.parked
    }

    /// Wall time left until the armed LBT transmit
    #[must_use]
    pub const fn pending_transmit_ms(&self) -> Option<u32> {
        self.pending_tx_ms
    }
}
