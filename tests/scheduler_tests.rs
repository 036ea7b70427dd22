//! HPT Scheduler Tests
//!
//! Tests for event firing order, PPS resynchronization and the deferred
//! listen-before-talk transmit.
//! Run with: cargo test --target x86_64-unknown-linux-gnu --no-default-features --features std --test scheduler_tests

use ogn_tracker::error::TableError;
use ogn_tracker::hpt::{Action, Event, HptOpcode, HptScheduler, HptTable, PpsLatch, TaskId};
use ogn_tracker::message::{Message, MsgOpcode};
use ogn_tracker::types::TableVariant;
use rand_core::{RngCore, SeedableRng};
use rand_wyrand::WyRand;

/// Generator that always returns the same word
struct FixedRng(u32);

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        self.0
    }

    fn next_u64(&mut self) -> u64 {
        u64::from(self.0)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        dest.fill(0);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

fn running<R: RngCore>(latch: &PpsLatch, rng: R, variant: TableVariant) -> HptScheduler<'_, R> {
    let mut scheduler = HptScheduler::new(latch, rng);
    scheduler.load_table(HptTable::for_variant(variant));
    scheduler.start().expect("table loaded");
    scheduler
}

fn to_control(opcode: MsgOpcode) -> Action {
    Action::Post {
        to: TaskId::Control,
        message: Message::from_hpt(opcode),
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[test]
fn start_without_table_fails() {
    let latch = PpsLatch::new();
    let mut scheduler = HptScheduler::new(&latch, FixedRng(0));
    assert_eq!(scheduler.start(), Err(TableError::Empty));
    assert!(!scheduler.is_running());
}

#[test]
fn stopped_scheduler_fires_nothing() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(0), TableVariant::Idle);
    scheduler.stop();
    assert!(scheduler.advance(5000).is_empty());
    assert_eq!(scheduler.until_next(), None);
}

#[test]
fn invalid_events_keep_previous_table() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(0), TableVariant::Idle);
    let bad = [Event::at(500, HptOpcode::GpioUp)];

    assert_eq!(scheduler.load_events(&bad), Err(TableError::MissingRestart));
    assert_eq!(scheduler.table().map(HptTable::len), Some(2));
}

#[test]
fn until_next_reports_first_offset() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(0), TableVariant::Protocol);
    assert_eq!(scheduler.until_next(), Some(150));
    let _ = scheduler.advance(100);
    assert_eq!(scheduler.until_next(), Some(50));
}

// =============================================================================
// Event Order
// =============================================================================

#[test]
fn protocol_cycle_fires_in_order() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(100), TableVariant::Protocol);

    let actions = scheduler.advance(1000);
    assert_eq!(
        actions.as_slice(),
        &[
            to_control(MsgOpcode::HptCopyPacket),
            Action::SetChannel(4),
            Action::transmit(),
            Action::SetChannel(2),
            Action::transmit(),
            Action::ReloadWatchdog,
            to_control(MsgOpcode::HptPreparePacket),
        ]
    );
    assert_eq!(scheduler.elapsed_ms(), 0);
    assert_eq!(scheduler.index(), 0);
}

#[test]
fn small_steps_match_one_large_step() {
    let latch_a = PpsLatch::new();
    let latch_b = PpsLatch::new();
    let mut coarse = running(&latch_a, FixedRng(37), TableVariant::Protocol);
    let mut fine = running(&latch_b, FixedRng(37), TableVariant::Protocol);

    let expected: Vec<Action> = coarse.advance(2000).into_iter().collect();
    let mut collected = Vec::new();
    for _ in 0..2000 {
        collected.extend(fine.advance(1));
    }
    assert_eq!(collected, expected);
}

#[test]
fn restart_carries_remainder() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(0), TableVariant::Idle);

    let actions = scheduler.advance(1925);
    assert_eq!(actions.as_slice(), &[Action::ReloadWatchdog, Action::ReloadWatchdog]);
    assert_eq!(scheduler.elapsed_ms(), 925);
}

#[test]
fn full_action_buffer_keeps_unused_time() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(0), TableVariant::Idle);

    // One watchdog reload per cycle, more cycles than the buffer holds
    let first = scheduler.advance(40_000);
    assert!(first.is_full());
    let second = scheduler.advance(0);

    assert_eq!(first.len() + second.len(), 40);
    assert!(second.iter().all(|a| *a == Action::ReloadWatchdog));
    assert_eq!(scheduler.elapsed_ms(), 0);
    assert_eq!(scheduler.until_next(), Some(925));
}

#[test]
fn unknown_opcode_is_skipped() {
    let latch = PpsLatch::new();
    let mut scheduler = HptScheduler::new(&latch, FixedRng(0));
    scheduler
        .load_events(&[
            Event::at(10, HptOpcode::from_u8(0x7F)),
            Event::at(20, HptOpcode::GpioUp),
            Event::at(100, HptOpcode::Restart),
        ])
        .expect("valid table");
    scheduler.start().expect("table loaded");

    assert_eq!(scheduler.advance(50).as_slice(), &[Action::TestGpio(true)]);
}

#[test]
fn out_of_range_channel_is_skipped() {
    let latch = PpsLatch::new();
    let mut scheduler = HptScheduler::new(&latch, FixedRng(0));
    scheduler
        .load_events(&[
            Event::new(10, HptOpcode::SetChannel, 300),
            Event::new(20, HptOpcode::SetChannel, 3),
            Event::at(100, HptOpcode::Restart),
        ])
        .expect("valid table");
    scheduler.start().expect("table loaded");

    assert_eq!(scheduler.advance(50).as_slice(), &[Action::SetChannel(3)]);
}

#[test]
fn end_parks_until_pps() {
    let latch = PpsLatch::new();
    let mut scheduler = HptScheduler::new(&latch, FixedRng(0));
    scheduler
        .load_events(&[
            Event::at(10, HptOpcode::GpioUp),
            Event::at(20, HptOpcode::End),
            Event::at(30, HptOpcode::GpioDown),
            Event::at(1000, HptOpcode::Restart),
        ])
        .expect("valid table");
    scheduler.start().expect("table loaded");

    assert_eq!(scheduler.advance(3000).as_slice(), &[Action::TestGpio(true)]);
    assert!(scheduler.is_parked());
    assert_eq!(scheduler.until_next(), None);

    assert!(latch.restart_from_isr());
    assert!(scheduler.advance(0).is_empty());
    assert!(!scheduler.is_parked());
    assert_eq!(scheduler.advance(10).as_slice(), &[Action::TestGpio(true)]);
}

// =============================================================================
// PPS Resynchronization
// =============================================================================

#[test]
fn pps_before_start_needs_no_wakeup() {
    let latch = PpsLatch::new();
    assert!(!latch.restart_from_isr());
    assert!(latch.is_pending());
}

#[test]
fn edge_latched_before_start_is_discarded() {
    let latch = PpsLatch::new();
    let mut scheduler = HptScheduler::new(&latch, FixedRng(0));
    assert!(!latch.restart_from_isr());

    scheduler.load_table(HptTable::for_variant(TableVariant::Protocol));
    scheduler.start().expect("table loaded");
    assert!(!latch.is_pending());

    let actions = scheduler.advance(150);
    assert_eq!(actions.as_slice(), &[to_control(MsgOpcode::HptCopyPacket)]);
    assert_eq!(scheduler.elapsed_ms(), 150);
}

#[test]
fn pps_resets_before_next_event() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(0), TableVariant::Protocol);

    assert!(scheduler.advance(149).is_empty());
    assert!(latch.restart_from_isr());

    // The copy event at 150 would be due, the edge wins
    assert!(scheduler.advance(1).is_empty());
    assert_eq!(scheduler.elapsed_ms(), 0);
    assert_eq!(scheduler.index(), 0);
    assert!(!latch.is_pending());

    assert!(scheduler.advance(149).is_empty());
    assert_eq!(
        scheduler.advance(1).as_slice(),
        &[to_control(MsgOpcode::HptCopyPacket)]
    );
}

#[test]
fn pps_at_any_time_rewinds() {
    for t in (0..1000).step_by(37) {
        let latch = PpsLatch::new();
        let mut scheduler = running(&latch, FixedRng(0), TableVariant::Protocol);
        let _ = scheduler.advance(t);

        latch.restart_from_isr();
        let _ = scheduler.advance(0);
        assert_eq!(scheduler.elapsed_ms(), 0, "PPS at {t}ms");
        assert_eq!(scheduler.index(), 0, "PPS at {t}ms");
    }
}

#[test]
fn early_pps_skips_rest_of_cycle() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(0), TableVariant::Idle);

    let _ = scheduler.advance(900);
    latch.restart_from_isr();
    // Watchdog reload at 925 is not reached before the edge
    assert!(scheduler.advance(30).is_empty());
    assert_eq!(scheduler.elapsed_ms(), 0);
}

// =============================================================================
// Listen-before-talk
// =============================================================================

#[test]
fn lbt_transmit_fires_after_drawn_delay() {
    let latch = PpsLatch::new();
    let mut scheduler = HptScheduler::new(&latch, FixedRng(25));
    scheduler
        .load_events(&[
            Event::new(100, HptOpcode::TransmitLbt, 50),
            Event::at(1000, HptOpcode::Restart),
        ])
        .expect("valid table");
    scheduler.start().expect("table loaded");

    assert!(scheduler.advance(124).is_empty());
    assert_eq!(scheduler.pending_transmit_ms(), Some(1));
    assert_eq!(scheduler.advance(1).as_slice(), &[Action::transmit()]);
    assert_eq!(scheduler.pending_transmit_ms(), None);
}

#[test]
fn lbt_delay_stays_inside_window() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, WyRand::seed_from_u64(0x0C4E), TableVariant::Idle);
    scheduler
        .load_events(&[
            Event::new(100, HptOpcode::TransmitLbt, 50),
            Event::at(1000, HptOpcode::Restart),
        ])
        .expect("valid table");
    scheduler.start().expect("table loaded");

    let mut fired = 0;
    for _ in 0..200_000 {
        let actions = scheduler.advance(1);
        if actions.contains(&Action::transmit()) {
            let at = scheduler.elapsed_ms();
            assert!((100..150).contains(&at), "transmit at {at}ms");
            fired += 1;
        }
    }
    assert_eq!(fired, 200);
}

#[test]
fn lbt_window_crosses_cycle_boundary() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(379), TableVariant::Protocol);

    let actions = scheduler.advance(1000);
    assert_eq!(actions.iter().filter(|a| **a == Action::transmit()).count(), 1);
    assert_eq!(scheduler.pending_transmit_ms(), Some(179));

    let actions = scheduler.advance(179);
    assert_eq!(
        actions.as_slice(),
        &[to_control(MsgOpcode::HptCopyPacket), Action::transmit()]
    );
}

#[test]
fn lbt_transmit_survives_pps() {
    let latch = PpsLatch::new();
    let mut scheduler = running(&latch, FixedRng(300), TableVariant::Protocol);

    let _ = scheduler.advance(900);
    assert_eq!(scheduler.pending_transmit_ms(), Some(200));

    latch.restart_from_isr();
    assert!(scheduler.advance(50).is_empty());
    assert_eq!(scheduler.pending_transmit_ms(), Some(150));
    assert_eq!(scheduler.elapsed_ms(), 0);
}
