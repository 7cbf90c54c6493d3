use crate::capability::InputBackend;
use crate::flags::Flag;
use crate::input::lock::LockRegistry;
use crate::listener::{ListenerGate, PressedKeys};
use crate::settings::{Settings, SkillMode};
use crate::states::{self, ProgramKey, ReactiveState};
use crate::store::FlagStore;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

/// Process-wide wiring, owned by the main thread and passed by reference
/// into the bridge and the input engine. Construction order is fixed:
/// store first, then the reactive mirrors, then the engine pieces.
///
/// Everything except `store`, `pressed` and `gate` is confined to the
/// scheduler thread; only those three are shared with worker/hook threads.
pub struct Context {
    pub store: Arc<FlagStore>,
    pub session: RefCell<ReactiveState<Flag>>,
    pub gameplay: RefCell<ReactiveState<Flag>>,
    pub program: RefCell<ReactiveState<ProgramKey>>,
    pub settings: RefCell<Settings>,
    pub settings_path: String,
    pub backend: Rc<dyn InputBackend>,
    pub pressed: PressedKeys,
    pub gate: ListenerGate,
    pub locks: LockRegistry,
}

impl Context {
    pub fn new(
        store: Arc<FlagStore>,
        settings: Settings,
        settings_path: String,
        backend: Rc<dyn InputBackend>,
        pressed: PressedKeys,
        gate: ListenerGate,
    ) -> Rc<Self> {
        Rc::new(Self {
            store,
            session: RefCell::new(states::session_state()),
            gameplay: RefCell::new(states::gameplay_state()),
            program: RefCell::new(states::program_state()),
            settings: RefCell::new(settings),
            settings_path,
            backend,
            pressed,
            gate,
            locks: LockRegistry::new(),
        })
    }

    pub fn session_active(&self) -> bool {
        self.session.borrow().get(Flag::Active)
    }

    pub fn program_enabled(&self) -> bool {
        self.program.borrow().get(ProgramKey::Enabled)
    }

    pub fn gameplay(&self, flag: Flag) -> bool {
        self.gameplay.borrow().get(flag)
    }

    pub fn skill_mode(&self) -> SkillMode {
        self.settings.borrow().skill_mode
    }
}
