//! Perception worker lifecycle.
//!
//! Each worker runs on its own OS thread and talks to the rest of the
//! process exclusively through the [`FlagStore`]. The only control traffic
//! is the boundary protocol: an `Init` message hands the store to the thread
//! before its loop may run, a `Ready` reply comes back once the loop is
//! live, and `Shutdown` ends it.

pub mod pixels;
pub mod window;

use crate::store::FlagStore;
use anyhow::{bail, Context as _};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Control messages accepted by a worker thread.
pub enum WorkerMsg {
    Init { store: Arc<FlagStore> },
    Shutdown,
}

/// Replies a worker sends back to its supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerReply {
    Ready,
}

/// Supervisor-side handle to one perception worker.
pub struct WorkerHandle {
    name: &'static str,
    control: Sender<WorkerMsg>,
    replies: Receiver<WorkerReply>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Hand the shared store to the worker. Must happen before the worker's
    /// loop runs; the thread stays parked until it does.
    pub fn init(&self, store: &Arc<FlagStore>) -> anyhow::Result<()> {
        self.control
            .send(WorkerMsg::Init {
                store: Arc::clone(store),
            })
            .with_context(|| format!("worker '{}' is gone before init", self.name))
    }

    /// Block until the worker reports its loop is live.
    pub fn wait_ready(&self, timeout: Duration) -> anyhow::Result<()> {
        match self.replies.recv_timeout(timeout) {
            Ok(WorkerReply::Ready) => {
                tracing::debug!("worker '{}' ready", self.name);
                Ok(())
            }
            Err(err) => bail!("worker '{}' never became ready: {err}", self.name),
        }
    }

    /// Ask the worker to stop and join its thread. Latency is bounded by
    /// the worker's own poll or wait interval.
    pub fn shutdown(mut self) {
        let _ = self.control.send(WorkerMsg::Shutdown);
        if let Some(join) = self.join.take() {
            if join.join().is_err() {
                tracing::error!("worker '{}' panicked during shutdown", self.name);
            }
        }
        tracing::debug!("worker '{}' terminated", self.name);
    }
}

/// Spawn a worker thread running `body` once the init handshake completes.
/// A panic inside `body` is caught and logged; the worker simply stops and
/// is not restarted (the session flag flipping again drives any restart at
/// the loop level, not the thread level).
fn spawn_worker<F>(name: &'static str, body: F) -> WorkerHandle
where
    F: FnOnce(Arc<FlagStore>, &Receiver<WorkerMsg>) + Send + 'static,
{
    let (control_tx, control_rx) = mpsc::channel::<WorkerMsg>();
    let (reply_tx, reply_rx) = mpsc::channel::<WorkerReply>();

    let join = thread::Builder::new()
        .name(name.into())
        .spawn(move || {
            let store = loop {
                match control_rx.recv() {
                    Ok(WorkerMsg::Init { store }) => break store,
                    Ok(WorkerMsg::Shutdown) | Err(_) => return,
                }
            };
            if reply_tx.send(WorkerReply::Ready).is_err() {
                return;
            }
            tracing::info!("worker '{name}' running");
            if catch_unwind(AssertUnwindSafe(|| body(store, &control_rx))).is_err() {
                tracing::error!("worker '{name}' loop panicked; worker stopped");
            }
        })
        .unwrap_or_else(|err| panic!("failed to spawn worker '{name}': {err}"));

    WorkerHandle {
        name,
        control: control_tx,
        replies: reply_rx,
        join: Some(join),
    }
}

/// Drain the control channel without blocking. Returns `true` when the
/// worker should keep running.
fn still_running(control: &Receiver<WorkerMsg>) -> bool {
    loop {
        match control.try_recv() {
            Ok(WorkerMsg::Shutdown) => return false,
            Ok(WorkerMsg::Init { .. }) => {
                tracing::warn!("dropping duplicate init message");
            }
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

/// Sleep for `interval` while staying responsive to control messages.
/// Returns `true` when the worker should keep running.
fn sleep_responsive(control: &Receiver<WorkerMsg>, interval: Duration) -> bool {
    match control.recv_timeout(interval) {
        Ok(WorkerMsg::Shutdown) => false,
        Ok(WorkerMsg::Init { .. }) => {
            tracing::warn!("dropping duplicate init message");
            true
        }
        Err(RecvTimeoutError::Timeout) => true,
        Err(RecvTimeoutError::Disconnected) => false,
    }
}
