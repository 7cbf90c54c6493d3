use super::{still_running, WorkerHandle, WorkerMsg};
use crate::capability::{PixelSampler, Rgb};
use crate::flags::Flag;
use crate::store::FlagStore;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// One resolved entry of the gameplay predicate table: which pixel to sample,
/// what color means "true", and which other flags gate the sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchDescriptor {
    pub flag: Flag,
    pub point: (i32, i32),
    pub target: Rgb,
    pub tolerance: u8,
    pub conditions: Vec<(Flag, bool)>,
}

/// Spawn the gameplay watcher supervisor. It waits on the store for the
/// session flag and, while the flag is up, runs one sampling loop per watch
/// descriptor. When the session drops every sampling loop is stopped and the
/// gameplay flags return to their defaults.
pub fn spawn_pixel_watcher(
    sampler: Arc<dyn PixelSampler>,
    watches: Vec<WatchDescriptor>,
    poll: Duration,
) -> WorkerHandle {
    super::spawn_worker("pixels", move |store, control| {
        run_supervisor(&store, control, sampler, watches, poll);
    })
}

// Coarse supervisor wait; the store notifies on every flag change so the
// actual reaction to a session edge is immediate.
const SUPERVISE_WAIT: Duration = Duration::from_millis(100);

fn run_supervisor(
    store: &Arc<FlagStore>,
    control: &Receiver<WorkerMsg>,
    sampler: Arc<dyn PixelSampler>,
    watches: Vec<WatchDescriptor>,
    poll: Duration,
) {
    let mut active = false;
    let mut running: Vec<SamplingLoop> = Vec::new();

    loop {
        if !still_running(control) {
            break;
        }
        store.wait(Some(SUPERVISE_WAIT));
        let now_active = store.get(Flag::Active);
        if now_active == active {
            continue;
        }
        active = now_active;
        if active {
            tracing::info!("gameplay perception started ({} watchers)", watches.len());
            running = watches
                .iter()
                .map(|watch| SamplingLoop::start(store, &sampler, watch.clone(), poll))
                .collect();
        } else {
            tracing::info!("gameplay perception stopped");
            stop_all(&mut running);
            store.reset_gameplay();
        }
    }

    stop_all(&mut running);
    if active {
        store.reset_gameplay();
    }
}

struct SamplingLoop {
    flag: Flag,
    stop: Arc<AtomicBool>,
    join: JoinHandle<()>,
}

impl SamplingLoop {
    fn start(
        store: &Arc<FlagStore>,
        sampler: &Arc<dyn PixelSampler>,
        watch: WatchDescriptor,
        poll: Duration,
    ) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = watch.flag;
        let join = {
            let store = Arc::clone(store);
            let sampler = Arc::clone(sampler);
            let stop = Arc::clone(&stop);
            thread::spawn(move || {
                // A failed watcher stops alone and stays stopped until the
                // session flag flips again; the others keep sampling.
                if catch_unwind(AssertUnwindSafe(|| {
                    run_sampling(&store, sampler.as_ref(), &watch, poll, &stop)
                }))
                .is_err()
                {
                    tracing::error!("watcher '{flag}' panicked; watcher stopped");
                }
            })
        };
        Self { flag, stop, join }
    }

    fn stop(self) {
        self.stop.store(true, Ordering::Relaxed);
        if self.join.join().is_err() {
            tracing::error!("watcher '{}' panicked during stop", self.flag);
        }
    }
}

fn stop_all(running: &mut Vec<SamplingLoop>) {
    for loop_ in running.iter() {
        loop_.stop.store(true, Ordering::Relaxed);
    }
    for loop_ in running.drain(..) {
        loop_.stop();
    }
}

fn conditions_hold(store: &FlagStore, conditions: &[(Flag, bool)]) -> bool {
    conditions.iter().all(|(flag, value)| store.get(*flag) == *value)
}

fn run_sampling(
    store: &FlagStore,
    sampler: &dyn PixelSampler,
    watch: &WatchDescriptor,
    poll: Duration,
    stop: &AtomicBool,
) {
    let (x, y) = watch.point;
    let mut last_match: Option<bool> = None;

    while !stop.load(Ordering::Relaxed) {
        thread::sleep(poll);
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if !conditions_hold(store, &watch.conditions) {
            continue;
        }
        // A null sample is "no observation this tick".
        let Some(rgb) = sampler.sample(x, y) else {
            continue;
        };
        let matched = rgb.matches(watch.target, watch.tolerance);
        if last_match != Some(matched) {
            store.set(watch.flag, matched);
            tracing::debug!("watcher '{}' -> {matched}", watch.flag);
            last_match = Some(matched);
        }
    }
}
