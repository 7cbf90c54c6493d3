use pixel_macro::bridge;
use pixel_macro::context::Context;
use pixel_macro::input::{handler, handlers};
use pixel_macro::listener::{EventRoute, ListenerGate, PressedKeys};
use pixel_macro::logging;
use pixel_macro::os::{spawn_event_listener, GdiPixelSampler, RdevInputBackend, Win32WindowProbe};
use pixel_macro::settings::Settings;
use pixel_macro::store::FlagStore;
use pixel_macro::workers::pixels::spawn_pixel_watcher;
use pixel_macro::workers::window::spawn_window_watcher;

use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const SETTINGS_PATH: &str = "settings.json";
const READY_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_PATH)?;
    logging::init(settings.debug_logging);

    // Store first, workers second, engine last. The store outlives
    // everything that touches it.
    let store = Arc::new(FlagStore::new());

    let window = spawn_window_watcher(
        Arc::new(Win32WindowProbe),
        settings.window_title.clone(),
        Duration::from_millis(settings.session_poll_ms),
    );
    let pixels = spawn_pixel_watcher(
        Arc::new(GdiPixelSampler),
        settings.resolve_watchers(),
        Duration::from_millis(settings.gameplay_poll_ms),
    );
    for worker in [&window, &pixels] {
        worker.init(&store)?;
        worker.wait_ready(READY_TIMEOUT)?;
    }

    let (events_tx, events_rx) = tokio::sync::mpsc::unbounded_channel();
    let pressed = PressedKeys::new();
    let gate = ListenerGate::new();
    spawn_event_listener(EventRoute {
        gate: gate.clone(),
        pressed: pressed.clone(),
        events: events_tx,
    });

    let ctx = Context::new(
        Arc::clone(&store),
        settings,
        SETTINGS_PATH.into(),
        Rc::new(RdevInputBackend::new()),
        pressed,
        gate,
    );
    let handler_set = handlers::default_handlers(&ctx);

    tracing::info!("waiting for the game window (fullscreen)...");

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = tokio::task::LocalSet::new();
    let result: anyhow::Result<()> = runtime.block_on(local.run_until(async {
        let dispatch = tokio::task::spawn_local(handler::run_dispatch(
            Rc::clone(&ctx),
            handler_set,
            events_rx,
        ));
        let bridge = tokio::task::spawn_local(bridge::run(Rc::clone(&ctx)));

        tokio::signal::ctrl_c().await?;
        tracing::info!("shutting down");
        bridge.abort();
        dispatch.abort();
        Ok(())
    }));
    result?;

    ctx.backend.release_all();
    window.shutdown();
    pixels.shutdown();
    Ok(())
}
