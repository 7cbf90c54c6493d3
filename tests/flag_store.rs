use pixel_macro::flags::Flag;
use pixel_macro::store::{FlagStore, WaitOutcome};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn double_set_mutates_exactly_once() {
    let store = FlagStore::new();
    assert!(store.set(Flag::OnGround, true));
    assert!(!store.set(Flag::OnGround, true));
    assert!(!store.set(Flag::OnGround, true));
    assert_eq!(store.generation(), 1);
    assert_eq!(store.metrics().writes, 1);
}

#[test]
fn concurrent_writers_of_different_bits_never_clobber() {
    let store = Arc::new(FlagStore::new());
    let mut joins = Vec::new();
    for flag in Flag::GAMEPLAY {
        let store = Arc::clone(&store);
        joins.push(thread::spawn(move || {
            store.set(flag, !flag.default_value());
        }));
    }
    for join in joins {
        join.join().unwrap();
    }
    for flag in Flag::GAMEPLAY {
        assert_eq!(store.get(flag), !flag.default_value(), "{flag}");
    }
    assert_eq!(store.generation(), Flag::GAMEPLAY.len() as u32);
}

#[test]
fn churning_two_bits_counts_every_edge() {
    let store = Arc::new(FlagStore::new());
    let mut joins = Vec::new();
    for flag in [Flag::OnGround, Flag::OnAir] {
        let store = Arc::clone(&store);
        joins.push(thread::spawn(move || {
            for i in 0..250 {
                store.set(flag, i % 2 == 0);
            }
        }));
    }
    for join in joins {
        join.join().unwrap();
    }
    // Each iteration flips its bit, so every set is a real edge.
    assert_eq!(store.generation(), 500);
}

#[test]
fn wait_wakes_on_mutation() {
    let store = Arc::new(FlagStore::new());
    let waiter = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.wait(Some(Duration::from_secs(5))))
    };
    thread::sleep(Duration::from_millis(50));
    store.set(Flag::Toss, true);
    assert_eq!(waiter.join().unwrap(), WaitOutcome::Notified);
}

#[test]
fn wait_times_out_when_nothing_changes() {
    let store = FlagStore::new();
    let start = Instant::now();
    assert_eq!(
        store.wait(Some(Duration::from_millis(50))),
        WaitOutcome::TimedOut
    );
    assert!(start.elapsed() >= Duration::from_millis(50));
}

#[test]
fn no_op_set_does_not_wake_waiters() {
    let store = Arc::new(FlagStore::new());
    let waiter = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.wait(Some(Duration::from_millis(200))))
    };
    thread::sleep(Duration::from_millis(50));
    // SkillToggle already defaults to true: no edge, no wakeup.
    store.set(Flag::SkillToggle, true);
    assert_eq!(waiter.join().unwrap(), WaitOutcome::TimedOut);
}

#[test]
fn bare_notify_does_not_end_the_wait() {
    let store = Arc::new(FlagStore::new());
    let waiter = {
        let store = Arc::clone(&store);
        thread::spawn(move || store.wait(Some(Duration::from_millis(200))))
    };
    thread::sleep(Duration::from_millis(50));
    // The generation has not moved, so the waiter re-checks and sleeps on.
    store.notify();
    assert_eq!(waiter.join().unwrap(), WaitOutcome::TimedOut);
}

#[tokio::test]
async fn wait_async_sees_a_mutation() {
    let store = Arc::new(FlagStore::new());
    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            store.set(Flag::BarArrow, true);
        })
    };
    let outcome = store.wait_async(Some(Duration::from_secs(5))).await;
    assert_eq!(outcome, WaitOutcome::Notified);
    writer.join().unwrap();
}

#[tokio::test]
async fn wait_async_times_out() {
    let store = Arc::new(FlagStore::new());
    let outcome = store.wait_async(Some(Duration::from_millis(50))).await;
    assert_eq!(outcome, WaitOutcome::TimedOut);
}

#[test]
fn metrics_count_reads_writes_waits_notifies() {
    let store = FlagStore::new();
    store.get(Flag::Active);
    store.get(Flag::Active);
    store.set(Flag::Active, true);
    store.wait(Some(Duration::from_millis(1)));
    let metrics = store.metrics();
    assert_eq!(metrics.reads, 2);
    assert_eq!(metrics.writes, 1);
    assert_eq!(metrics.waits, 1);
    // set() bumped the generation, which notifies.
    assert_eq!(metrics.notifies, 1);
}
