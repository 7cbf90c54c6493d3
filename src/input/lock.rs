use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::rc::Rc;
use tokio::sync::Mutex;

/// Lazily-created named locks, one per input source. A source's `down` and
/// `up` actions run under its lock, so a new edge on the same source can
/// never interleave with an action already in flight; different sources run
/// fully concurrently. Waiters queue FIFO (tokio mutex fairness).
///
/// Thread-confined to the scheduler; locks are created on first use and
/// cached forever.
#[derive(Default)]
pub struct LockRegistry {
    locks: RefCell<HashMap<String, Rc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Rc<Mutex<()>> {
        let mut locks = self.locks.borrow_mut();
        if let Some(lock) = locks.get(name) {
            return Rc::clone(lock);
        }
        let lock = Rc::new(Mutex::new(()));
        locks.insert(name.into(), Rc::clone(&lock));
        lock
    }

    /// Acquire the named lock, run the future, release. A panic inside the
    /// future unwinds past the guard without poisoning the lock.
    pub async fn with_lock<T>(&self, name: &str, fut: impl Future<Output = T>) -> T {
        let lock = self.get(name);
        let _guard = lock.lock().await;
        fut.await
    }

    pub fn is_locked(&self, name: &str) -> bool {
        self.get(name).try_lock().is_err()
    }
}
