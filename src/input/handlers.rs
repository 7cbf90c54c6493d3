//! The concrete macro bindings. Each handler reads the reactive mirrors,
//! drives the input backend, and self-cancels through its abort predicate
//! the instant the session drops, the master toggle flips, or a conflicting
//! button changes state.

use super::handler::{Handler, HandlerSet};
use super::wait::wait_for;
use crate::context::Context;
use crate::flags::Flag;
use crate::settings::SkillMode;
use crate::states::ProgramKey;
use std::rc::Rc;
use std::time::Duration;
use tokio::time::sleep;

/// Build the full default handler set: three keyboard toggles, the steal
/// key, and the two mouse-button macros.
pub fn default_handlers(ctx: &Rc<Context>) -> HandlerSet {
    let mut set = HandlerSet::new();
    set.register(reset_sequence(ctx));
    set.register(skill_toggle(ctx));
    set.register(enable_toggle(ctx));
    set.register(steal_key(ctx));
    set.register(x1_jump_hold(ctx));
    set.register(x2_hop_loop(ctx));
    set
}

fn automation_ok(ctx: &Context) -> bool {
    ctx.program_enabled() && ctx.session_active()
}

/// F1: back out to the respawn dialog and confirm it.
fn reset_sequence(ctx: &Rc<Context>) -> Handler {
    let ctx = Rc::clone(ctx);
    Handler::new("f1").on_down(move || {
        let ctx = Rc::clone(&ctx);
        async move {
            ctx.backend.tap("esc");
            sleep(Duration::from_millis(50)).await;
            ctx.backend.tap("r");
            sleep(Duration::from_millis(50)).await;
            ctx.backend.tap("enter");
        }
    })
}

/// F4: flip the skill user-toggle. The store is the source of truth; the
/// bridge mirrors the change back into the gameplay state like any other
/// flag mutation.
fn skill_toggle(ctx: &Rc<Context>) -> Handler {
    let ctx = Rc::clone(ctx);
    Handler::new("f4").on_down(move || {
        let ctx = Rc::clone(&ctx);
        async move {
            let enabled = !ctx.store.get(Flag::SkillToggle);
            ctx.store.set(Flag::SkillToggle, enabled);
            tracing::info!(
                "skill toggle is now {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    })
}

/// F5: master automation switch, purely local state.
fn enable_toggle(ctx: &Rc<Context>) -> Handler {
    let ctx = Rc::clone(ctx);
    Handler::new("f5").on_down(move || {
        let ctx = Rc::clone(&ctx);
        async move {
            let enabled = !ctx.program_enabled();
            ctx.program.borrow_mut().set(ProgramKey::Enabled, enabled);
            tracing::info!(
                "automation is now {}",
                if enabled { "enabled" } else { "disabled" }
            );
        }
    })
}

/// Q: in stealblock mode, convert the skill into a block steal. The ctrl
/// tap is followed by a wait for the *physical* ctrl release so a held
/// modifier cannot retrigger.
fn steal_key(ctx: &Rc<Context>) -> Handler {
    let ctx = Rc::clone(ctx);
    Handler::new("q").on_down(move || {
        let ctx = Rc::clone(&ctx);
        async move {
            if ctx.skill_mode() == SkillMode::Stealblock
                && ctx.gameplay(Flag::SkillToggle)
                && ctx.gameplay(Flag::SkillReady)
            {
                ctx.backend.tap("ctrl");
                wait_for(
                    {
                        let ctx = Rc::clone(&ctx);
                        move || !ctx.pressed.is_pressed("ctrl")
                    },
                    {
                        let ctx = Rc::clone(&ctx);
                        move || !automation_ok(&ctx)
                    },
                )
                .await;
            }
        }
    })
}

/// X1 down: jump (unless x2 is mid-macro), wait until airborne, then hold
/// the action key. X1 up: keep holding until airborne or the button is
/// gone, then release.
fn x1_jump_hold(ctx: &Rc<Context>) -> Handler {
    let down_ctx = Rc::clone(ctx);
    let up_ctx = Rc::clone(ctx);
    Handler::new("x1")
        .on_down(move || {
            let ctx = Rc::clone(&down_ctx);
            async move {
                if !ctx.pressed.is_pressed("x2") {
                    ctx.backend.tap("space");
                }
                let airborne = wait_for(
                    {
                        let ctx = Rc::clone(&ctx);
                        move || !ctx.gameplay(Flag::OnGround)
                    },
                    {
                        let ctx = Rc::clone(&ctx);
                        move || {
                            !automation_ok(&ctx)
                                || (ctx.gameplay(Flag::OnGround) && !ctx.pressed.is_pressed("x1"))
                        }
                    },
                )
                .await;
                if airborne {
                    ctx.backend.press("e");
                }
            }
        })
        .on_up(move || {
            let ctx = Rc::clone(&up_ctx);
            async move {
                let done = wait_for(
                    {
                        let ctx = Rc::clone(&ctx);
                        move || !ctx.gameplay(Flag::OnGround) || !ctx.pressed.is_pressed("x1")
                    },
                    {
                        let ctx = Rc::clone(&ctx);
                        move || !automation_ok(&ctx)
                    },
                )
                .await;
                if done {
                    ctx.backend.release("e");
                }
            }
        })
}

fn x2_abort(ctx: &Rc<Context>) -> impl FnMut() -> bool {
    let ctx = Rc::clone(ctx);
    move || {
        !automation_ok(&ctx) || (ctx.gameplay(Flag::OnGround) && !ctx.pressed.is_pressed("x2"))
    }
}

/// X2 down: hop loop while the button stays held. Every landing triggers a
/// jump (or the skill, in boomjump mode with the toggle on and the skill
/// ready), with shift-lock compensation around each hop. X2 up: wait for
/// the airborne moment, optionally fire the normal-mode skill, then click.
fn x2_hop_loop(ctx: &Rc<Context>) -> Handler {
    let down_ctx = Rc::clone(ctx);
    let up_ctx = Rc::clone(ctx);
    Handler::new("x2")
        .on_down(move || {
            let ctx = Rc::clone(&down_ctx);
            async move {
                while ctx.pressed.is_pressed("x2") {
                    sleep(Duration::from_millis(1)).await;

                    if !automation_ok(&ctx) || ctx.pressed.is_pressed("x1") {
                        break;
                    }
                    if !ctx.gameplay(Flag::OnGround) {
                        continue;
                    }

                    // Without shift-lock the camera drifts mid-hop; hold
                    // shift across the jump and re-tap to restore state.
                    let shift_locked = ctx.gameplay(Flag::ShiftLock);
                    if !shift_locked {
                        ctx.backend.press("shift");
                        sleep(Duration::from_millis(20)).await;
                    }

                    if ctx.skill_mode() == SkillMode::Boomjump
                        && ctx.gameplay(Flag::SkillToggle)
                        && ctx.gameplay(Flag::SkillReady)
                    {
                        ctx.backend.tap("ctrl");
                    } else {
                        ctx.backend.tap("space");
                    }

                    wait_for(
                        {
                            let ctx = Rc::clone(&ctx);
                            move || !ctx.gameplay(Flag::OnGround)
                        },
                        x2_abort(&ctx),
                    )
                    .await;

                    if !shift_locked {
                        ctx.backend.release("shift");
                        ctx.backend.tap("shift");
                    }
                }
            }
        })
        .on_up(move || {
            let ctx = Rc::clone(&up_ctx);
            async move {
                if ctx.pressed.is_pressed("x1") {
                    return;
                }
                let airborne = wait_for(
                    {
                        let ctx = Rc::clone(&ctx);
                        move || !ctx.gameplay(Flag::OnGround)
                    },
                    x2_abort(&ctx),
                )
                .await;
                // The click fires even when the airborne wait aborts (a
                // quick ground tap); only the skill needs the air time.
                if airborne
                    && ctx.skill_mode() == SkillMode::Normal
                    && ctx.gameplay(Flag::SkillToggle)
                    && ctx.gameplay(Flag::SkillReady)
                {
                    ctx.backend.tap("ctrl");
                    wait_for(
                        {
                            let ctx = Rc::clone(&ctx);
                            move || !ctx.pressed.is_pressed("ctrl")
                        },
                        {
                            let ctx = Rc::clone(&ctx);
                            move || !automation_ok(&ctx)
                        },
                    )
                    .await;
                }
                ctx.backend.click();
            }
        })
}
