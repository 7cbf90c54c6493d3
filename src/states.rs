use crate::flags::Flag;
use std::fmt::Debug;
use std::hash::Hash;

pub type ListenerId = usize;

/// Main-thread mirror of a flag domain: a plain key -> bool map whose
/// mutations fire listeners synchronously in registration order.
///
/// These objects are thread-confined. The shared [`crate::store::FlagStore`]
/// is the only thing that crosses threads; the bridge copies changes from it
/// into these mirrors so handlers can read state without atomics.
pub struct ReactiveState<K> {
    defaults: Vec<(K, bool)>,
    values: Vec<(K, bool)>,
    listeners: Vec<(ListenerId, Box<dyn FnMut(K, bool, bool)>)>,
    next_listener: ListenerId,
}

impl<K: Copy + Eq + Hash + Debug> ReactiveState<K> {
    pub fn new(defaults: Vec<(K, bool)>) -> Self {
        Self {
            values: defaults.clone(),
            defaults,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    /// Unknown keys read as `false`; the key sets here are fixed enums, so
    /// that only happens when a domain is asked about a flag it never owned.
    pub fn get(&self, key: K) -> bool {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or(false)
    }

    pub fn contains(&self, key: K) -> bool {
        self.values.iter().any(|(k, _)| *k == key)
    }

    /// Edge-triggered: setting a key to its current value fires nothing.
    pub fn set(&mut self, key: K, value: bool) {
        let Some(slot) = self.values.iter_mut().find(|(k, _)| *k == key) else {
            tracing::warn!("ignoring write to unknown state key {key:?}");
            return;
        };
        let prev = slot.1;
        if prev == value {
            return;
        }
        slot.1 = value;
        for (_, listener) in &mut self.listeners {
            listener(key, value, prev);
        }
    }

    /// Listeners fire synchronously, in registration order, with
    /// `(key, new, prev)`.
    pub fn on_change<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(K, bool, bool) + 'static,
    {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        before != self.listeners.len()
    }

    /// Bulk return to defaults, firing listeners for every key that actually
    /// changes.
    pub fn reset(&mut self) {
        let defaults = self.defaults.clone();
        for (key, default) in defaults {
            self.set(key, default);
        }
    }

    pub fn snapshot(&self) -> Vec<(K, bool)> {
        self.values.clone()
    }
}

/// Local UI toggles; not part of the shared bitset at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProgramKey {
    /// Master automation switch (the F5 toggle). Every macro's abort
    /// predicate consults this.
    Enabled,
}

pub fn session_state() -> ReactiveState<Flag> {
    ReactiveState::new(vec![(Flag::Active, Flag::Active.default_value())])
}

pub fn gameplay_state() -> ReactiveState<Flag> {
    ReactiveState::new(
        Flag::GAMEPLAY
            .iter()
            .map(|f| (*f, f.default_value()))
            .collect(),
    )
}

pub fn program_state() -> ReactiveState<ProgramKey> {
    ReactiveState::new(vec![(ProgramKey::Enabled, true)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn listeners_fire_in_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut state = gameplay_state();
        for tag in ["first", "second"] {
            let log = Rc::clone(&log);
            state.on_change(move |key, value, _| {
                log.borrow_mut().push(format!("{tag}:{key}={value}"));
            });
        }
        state.set(Flag::OnGround, true);
        assert_eq!(
            log.borrow().as_slice(),
            ["first:on_ground=true", "second:on_ground=true"]
        );
    }

    #[test]
    fn same_value_fires_nothing() {
        let fired = Rc::new(RefCell::new(0));
        let mut state = session_state();
        let count = Rc::clone(&fired);
        state.on_change(move |_, _, _| *count.borrow_mut() += 1);
        state.set(Flag::Active, false);
        assert_eq!(*fired.borrow(), 0);
        state.set(Flag::Active, true);
        state.set(Flag::Active, true);
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn reset_only_fires_changed_keys() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut state = gameplay_state();
        state.set(Flag::OnGround, true);
        state.set(Flag::SkillToggle, false);
        let log = Rc::clone(&fired);
        state.on_change(move |key, value, _| log.borrow_mut().push((key, value)));
        state.reset();
        assert_eq!(
            fired.borrow().as_slice(),
            [(Flag::OnGround, false), (Flag::SkillToggle, true)]
        );
    }

    #[test]
    fn removed_listener_stops_firing() {
        let fired = Rc::new(RefCell::new(0));
        let mut state = program_state();
        let count = Rc::clone(&fired);
        let id = state.on_change(move |_, _, _| *count.borrow_mut() += 1);
        state.set(ProgramKey::Enabled, false);
        assert!(state.remove_listener(id));
        state.set(ProgramKey::Enabled, true);
        assert_eq!(*fired.borrow(), 1);
        assert!(!state.remove_listener(id));
    }

    #[test]
    fn unknown_key_write_is_ignored() {
        let mut state = session_state();
        state.set(Flag::OnGround, true);
        assert!(!state.get(Flag::OnGround));
        assert!(!state.contains(Flag::OnGround));
    }
}
