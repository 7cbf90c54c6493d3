use std::time::Duration;

const POLL_TICK: Duration = Duration::from_millis(1);

/// Cooperative poll until `condition` holds, or `abort` fires first.
///
/// Both predicates are re-evaluated fresh on every tick, so a macro
/// self-cancels the moment the game state or a user toggle changes. Returns
/// `true` when the condition was met, `false` on abort. Never blocks other
/// tasks on the scheduler.
pub async fn wait_for(
    mut condition: impl FnMut() -> bool,
    mut abort: impl FnMut() -> bool,
) -> bool {
    while !condition() {
        if abort() {
            return false;
        }
        tokio::time::sleep(POLL_TICK).await;
    }
    true
}
