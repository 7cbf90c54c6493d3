use super::{sleep_responsive, WorkerHandle, WorkerMsg};
use crate::capability::WindowProbe;
use crate::flags::Flag;
use crate::store::FlagStore;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

/// Spawn the session watcher: a slow poll of the foreground window that owns
/// the `active` flag. The target counts as active only while its title
/// matches exactly and the window is borderless fullscreen.
pub fn spawn_window_watcher(
    probe: Arc<dyn WindowProbe>,
    title: String,
    poll: Duration,
) -> WorkerHandle {
    super::spawn_worker("window", move |store, control| {
        run(&store, control, probe.as_ref(), &title, poll);
    })
}

fn run(
    store: &FlagStore,
    control: &Receiver<WorkerMsg>,
    probe: &dyn WindowProbe,
    title: &str,
    poll: Duration,
) {
    let mut last_active: Option<bool> = None;
    while sleep_responsive(control, poll) {
        // A failed probe is "no observation this tick", not an inactive
        // window; the flag keeps its last-known value.
        let Some(info) = probe.foreground() else {
            continue;
        };
        let active = info.title == title && info.fullscreen;
        if last_active != Some(active) {
            store.set(Flag::Active, active);
            if active {
                tracing::info!("game window active (fullscreen)");
            } else {
                tracing::info!("game window inactive");
            }
            last_active = Some(active);
        }
    }
    // Leaving the session flag up after the watcher dies would keep gameplay
    // perception and input running blind.
    store.set(Flag::Active, false);
}
