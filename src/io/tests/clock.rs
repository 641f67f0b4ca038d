use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crate::io::DeviceClock;

fn clock() -> DeviceClock {
    // 1 GHz host clock at 48 kHz: 20833.33 ticks per frame
    DeviceClock::new(48_000.0, 1e9, 4096)
}

#[test]
fn test_unanchored_clock() {
    let clock = clock();
    let ts = clock.zero_time_stamp(0);
    assert_eq!(ts.sample_time, 0.0);
    assert_eq!(ts.host_time, 0);
    assert_eq!(ts.seed, 1);
    assert_eq!(clock.period(), 4096);
}

#[test]
fn test_most_recent_period_boundary() {
    let clock = clock();
    clock.anchor(1_000);

    let ticks_per_period = 1e9 / 48_000.0 * 4096.0;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let now = 1_000 + (ticks_per_period * 2.5) as u64;
    let ts = clock.zero_time_stamp(now);

    assert_eq!(ts.sample_time, 8192.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let expected_host = 1_000 + (ticks_per_period * 2.0) as u64;
    assert_eq!(ts.host_time, expected_host);
}

#[test]
fn test_time_before_anchor_maps_to_anchor() {
    let clock = clock();
    clock.anchor(50_000);
    let ts = clock.zero_time_stamp(10);
    assert_eq!(ts.sample_time, 0.0);
    assert_eq!(ts.host_time, 50_000);
}

#[test]
fn test_seed_bumps_on_reanchor() {
    let clock = clock();
    assert_eq!(clock.seed(), 1);
    clock.anchor(0);
    assert_eq!(clock.seed(), 2);
    clock.set_rate(44_100.0, 1e9, 0);
    assert_eq!(clock.seed(), 3);
}

#[test]
fn test_rate_change_changes_period_length() {
    let clock = clock();
    clock.set_rate(96_000.0, 1e9, 0);

    // One period at 96 kHz is half as long as at 48 kHz
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let one_period = (1e9_f64 / 96_000.0 * 4096.0).ceil() as u64;
    let ts = clock.zero_time_stamp(one_period);
    assert_eq!(ts.sample_time, 4096.0);
}

#[test]
fn test_snapshot_is_consistent_under_writes() {
    let clock = Arc::new(clock());
    clock.anchor(clock.seed().wrapping_add(1) * 1_000);

    let done = Arc::new(AtomicBool::new(false));
    let reader = {
        let clock = Arc::clone(&clock);
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut reads = 0u64;
            while !done.load(Ordering::Acquire) || reads < 1_000 {
                // Time 0 is before every anchor, so host_time is the anchor
                let ts = clock.zero_time_stamp(0);
                assert_eq!(ts.host_time, ts.seed * 1_000);
                reads += 1;
            }
        })
    };

    for _ in 0..10_000 {
        clock.anchor((clock.seed() + 1) * 1_000);
    }
    done.store(true, Ordering::Release);
    reader.join().unwrap();
}

#[test]
fn test_reader_never_waits_on_open_write() {
    let clock = clock();
    clock.anchor(1_000);
    let before = clock.zero_time_stamp(0);
    assert_eq!(before.host_time, 1_000);
    assert_eq!(before.seed, 2);

    // Writer parked between storing the new anchor and publishing it
    let sequence = clock.begin_write(9_000, 1e9 / 48_000.0, true);
    let during = clock.zero_time_stamp(0);
    assert_eq!(during, before);

    clock.end_write(sequence);
    let after = clock.zero_time_stamp(0);
    assert_eq!(after.host_time, 9_000);
    assert_eq!(after.seed, 3);
}
