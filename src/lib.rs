pub mod bridge;
pub mod capability;
pub mod context;
pub mod flags;
pub mod input;
pub mod listener;
pub mod logging;
pub mod settings;
pub mod states;
pub mod store;
pub mod workers;

#[cfg(target_os = "windows")]
pub mod os;
