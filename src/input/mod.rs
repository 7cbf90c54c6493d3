//! Input automation engine: per-source serialization locks, the cancellable
//! wait primitive, handler dispatch, and the concrete macro bindings.

pub mod handler;
pub mod handlers;
pub mod lock;
pub mod wait;
