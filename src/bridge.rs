//! Main-thread state bridge: the single translation point between the
//! shared, lock-free store and the thread-local reactive mirrors.

use crate::context::Context;
use crate::flags::Flag;
use crate::settings::Settings;
use crate::store::WaitOutcome;
use std::rc::Rc;
use std::time::Duration;

/// Generous liveness fallback; every actual change wakes the wait early.
const WAIT_TIMEOUT: Duration = Duration::from_secs(1);
/// Fallback poll interval when the wait itself fails.
const DEGRADED_POLL: Duration = Duration::from_millis(50);

/// Run the bridge loop for the life of the process. This task is the only
/// writer of the reactive mirrors (handler user-toggles run on the same
/// scheduler thread, so there is no second writer in the data-race sense).
pub async fn run(ctx: Rc<Context>) {
    // The mirrors start at flag defaults, so the baseline must too: the
    // first diff pass then picks up everything the workers observed before
    // this task got to poll at all.
    let mut last = Flag::default_byte();
    loop {
        let current = ctx.store.snapshot();
        if current == last {
            match ctx.store.wait_async(Some(WAIT_TIMEOUT)).await {
                WaitOutcome::Notified | WaitOutcome::TimedOut => {}
                WaitOutcome::Failed => {
                    // Degrade to short-interval polling rather than crash.
                    tokio::time::sleep(DEGRADED_POLL).await;
                }
            }
            continue;
        }
        // Several flags may have changed between wake-ups; one diff pass
        // handles them all.
        let previous = std::mem::replace(&mut last, current);
        for flag in Flag::ALL {
            let now = current & flag.mask() != 0;
            let was = previous & flag.mask() != 0;
            if now == was {
                continue;
            }
            if flag == Flag::Active {
                ctx.session.borrow_mut().set(flag, now);
                on_session_change(&ctx, now);
            } else {
                ctx.gameplay.borrow_mut().set(flag, now);
            }
        }
    }
}

fn on_session_change(ctx: &Context, active: bool) {
    if active {
        // Fresh session, fresh config. A broken file keeps the old values.
        match Settings::load(&ctx.settings_path) {
            Ok(settings) => *ctx.settings.borrow_mut() = settings,
            Err(err) => tracing::warn!("config reload failed, keeping current: {err}"),
        }
        ctx.gate.resume();
    } else {
        ctx.gate.pause();
        // Nothing may stay physically held once the game loses focus.
        ctx.backend.release_all();
        ctx.gameplay.borrow_mut().reset();
    }
}
