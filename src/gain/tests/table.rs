use std::sync::Arc;
use std::thread;

use crate::gain::{GainTable, InsertError, UNITY_GAIN};
use crate::types::ClientId;

fn table() -> GainTable {
    GainTable::new(8, 0.1, 2.0)
}

#[test]
fn test_unknown_client_is_unity() {
    let table = table();
    assert_eq!(table.current_gain(ClientId(42)), UNITY_GAIN);
    assert!(table.target_gain(ClientId(42)).is_none());
    assert!(!table.set_target(ClientId(42), 0.5));
}

#[test]
fn test_insert_and_remove() {
    let table = table();
    table.insert(ClientId(1), 1.0).unwrap();
    assert!(table.contains(ClientId(1)));
    assert_eq!(table.len(), 1);

    assert_eq!(table.insert(ClientId(1), 1.0), Err(InsertError::Exists));

    assert!(table.remove(ClientId(1)));
    assert!(!table.contains(ClientId(1)));
    assert!(table.is_empty());
    assert!(!table.remove(ClientId(1)));
}

#[test]
fn test_capacity_rounds_to_power_of_two() {
    let table = GainTable::new(5, 0.1, 2.0);
    assert_eq!(table.capacity(), 8);
}

#[test]
fn test_full_table() {
    let table = GainTable::new(4, 0.1, 2.0);
    for id in 0..4 {
        table.insert(ClientId(id), 1.0).unwrap();
    }
    assert_eq!(table.insert(ClientId(99), 1.0), Err(InsertError::Full));
}

#[test]
fn test_slots_reused_after_remove() {
    let table = GainTable::new(2, 0.1, 2.0);
    table.insert(ClientId(1), 1.0).unwrap();
    table.insert(ClientId(2), 1.0).unwrap();
    table.remove(ClientId(1));
    table.insert(ClientId(3), 0.25).unwrap();
    assert!(table.contains(ClientId(2)));
    assert!(table.contains(ClientId(3)));
    assert_eq!(table.current_gain(ClientId(3)), 0.25);
}

#[test]
fn test_clear_tombstones_only_when_empty() {
    let table = GainTable::new(4, 0.1, 2.0);
    table.insert(ClientId(1), 1.0).unwrap();
    table.insert(ClientId(2), 1.0).unwrap();
    table.remove(ClientId(1));
    table.clear_tombstones();
    // Entry behind the tombstone is still reachable
    assert!(table.contains(ClientId(2)));

    table.remove(ClientId(2));
    table.clear_tombstones();
    table.insert(ClientId(2), 1.0).unwrap();
    assert!(table.contains(ClientId(2)));
}

#[test]
fn test_target_is_clamped() {
    let table = table();
    table.insert(ClientId(1), 1.0).unwrap();

    table.set_target(ClientId(1), 5.0);
    assert_eq!(table.target_gain(ClientId(1)), Some(2.0));

    table.set_target(ClientId(1), -1.0);
    assert_eq!(table.target_gain(ClientId(1)), Some(0.0));
}

#[test]
fn test_set_target_does_not_jump_current() {
    let table = table();
    table.insert(ClientId(1), 1.0).unwrap();
    table.set_target(ClientId(1), 0.5);
    assert_eq!(table.current_gain(ClientId(1)), 1.0);
}

#[test]
fn test_advance_ramps_in_steps() {
    let table = table();
    table.insert(ClientId(1), 1.0).unwrap();
    table.set_target(ClientId(1), 0.5);

    let after_one = table.advance(ClientId(1), 1);
    assert!((after_one - 0.9).abs() < 1e-6);
    assert!((table.current_gain(ClientId(1)) - 0.9).abs() < 1e-6);

    let settled = table.advance(ClientId(1), 100);
    assert_eq!(settled, 0.5);
    assert_eq!(table.current_gain(ClientId(1)), 0.5);
}

#[test]
fn test_settle_skips_ramp() {
    let table = table();
    table.insert(ClientId(1), 1.0).unwrap();
    table.set_target(ClientId(1), 0.0);
    assert!(table.settle(ClientId(1)));
    assert_eq!(table.current_gain(ClientId(1)), 0.0);
}

#[test]
fn test_store_ramp_ignored_after_slot_reuse() {
    let table = GainTable::new(1, 0.1, 2.0);
    table.insert(ClientId(1), 1.0).unwrap();
    table.set_target(ClientId(1), 0.0);

    let mut ramp = table.load_ramp(ClientId(1)).unwrap();
    ramp.next_gain();

    table.remove(ClientId(1));
    table.insert(ClientId(2), 0.75).unwrap();
    table.store_ramp(&ramp);

    assert_eq!(table.current_gain(ClientId(2)), 0.75);
}

#[test]
fn test_active_flag() {
    let table = table();
    assert!(!table.set_active(ClientId(1), true));
    table.insert(ClientId(1), 1.0).unwrap();
    assert!(!table.is_active(ClientId(1)));
    table.set_active(ClientId(1), true);
    assert!(table.is_active(ClientId(1)));
    table.remove(ClientId(1));
    assert!(!table.is_active(ClientId(1)));
}

#[test]
fn test_concurrent_reader_sees_unity_or_set_values() {
    let table = Arc::new(GainTable::new(16, 0.01, 2.0));
    table.insert(ClientId(7), 1.0).unwrap();
    table.set_target(ClientId(7), 0.0);

    let reader = {
        let table = Arc::clone(&table);
        thread::spawn(move || {
            for _ in 0..10_000 {
                let gain = table.advance(ClientId(7), 4);
                assert!((0.0..=1.0).contains(&gain));
            }
        })
    };

    for i in 0..1_000 {
        #[allow(clippy::cast_precision_loss)]
        table.set_target(ClientId(7), (i % 10) as f32 / 10.0);
    }

    reader.join().unwrap();
}
