//! Raw input event plumbing between the OS hook thread and the main-thread
//! scheduler. The hook itself (an `rdev` listen loop on Windows) lives in
//! the platform layer; everything here is portable and test-drivable.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Down,
    Up,
}

/// One key or button edge from the OS, already mapped to a source name
/// ("q", "f4", "x1", ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub source: String,
    pub edge: Edge,
}

impl InputEvent {
    pub fn down(source: &str) -> Self {
        Self {
            source: source.into(),
            edge: Edge::Down,
        }
    }

    pub fn up(source: &str) -> Self {
        Self {
            source: source.into(),
            edge: Edge::Up,
        }
    }
}

/// Physical pressed-state of keys and buttons, fed by the hook thread and
/// queried by macro abort predicates. Tracks the real device state, so it
/// keeps updating even while event forwarding is paused.
#[derive(Clone, Default)]
pub struct PressedKeys {
    inner: Arc<Mutex<HashSet<String>>>,
}

impl PressedKeys {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pressed(&self, source: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(source)
    }

    pub fn set_pressed(&self, source: &str, pressed: bool) {
        let mut set = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if pressed {
            set.insert(source.into());
        } else {
            set.remove(source);
        }
    }
}

/// Pause/resume gate for event forwarding. The OS hook cannot be torn down
/// once installed, so "stop listening" means closing this gate.
#[derive(Clone)]
pub struct ListenerGate {
    running: Arc<AtomicBool>,
}

impl Default for ListenerGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ListenerGate {
    /// Starts paused; the bridge opens the gate on the first session rise.
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn resume(&self) {
        if !self.running.swap(true, Ordering::AcqRel) {
            tracing::info!("input listeners resumed");
        }
    }

    pub fn pause(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            tracing::info!("input listeners paused");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Everything the hook thread needs: pressed-state tracking, the gate, and
/// the channel into the scheduler's dispatch task.
#[derive(Clone)]
pub struct EventRoute {
    pub gate: ListenerGate,
    pub pressed: PressedKeys,
    pub events: UnboundedSender<InputEvent>,
}

impl EventRoute {
    pub fn feed(&self, event: InputEvent) {
        self.pressed
            .set_pressed(&event.source, event.edge == Edge::Down);
        if self.gate.is_running() {
            // The dispatch task owning the receiver only goes away at
            // process shutdown; a send failure then is uninteresting.
            let _ = self.events.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_gate_still_tracks_pressed_state() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let route = EventRoute {
            gate: ListenerGate::new(),
            pressed: PressedKeys::new(),
            events: tx,
        };

        route.feed(InputEvent::down("x2"));
        assert!(route.pressed.is_pressed("x2"));
        assert!(rx.try_recv().is_err());

        route.gate.resume();
        route.feed(InputEvent::up("x2"));
        assert!(!route.pressed.is_pressed("x2"));
        assert_eq!(rx.try_recv().unwrap(), InputEvent::up("x2"));
    }
}
