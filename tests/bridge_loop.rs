use pixel_macro::bridge;
use pixel_macro::capability::InputBackend;
use pixel_macro::context::Context;
use pixel_macro::flags::Flag;
use pixel_macro::listener::{ListenerGate, PressedKeys};
use pixel_macro::settings::{Settings, SkillMode};
use pixel_macro::store::FlagStore;
use serial_test::serial;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::LocalSet;
use tokio::time::sleep;

#[derive(Default)]
struct FakeBackend {
    log: RefCell<Vec<String>>,
}

impl FakeBackend {
    fn log(&self) -> Vec<String> {
        self.log.borrow().clone()
    }
}

impl InputBackend for FakeBackend {
    fn press(&self, key: &str) {
        self.log.borrow_mut().push(format!("press:{key}"));
    }

    fn release(&self, key: &str) {
        self.log.borrow_mut().push(format!("release:{key}"));
    }

    fn click(&self) {
        self.log.borrow_mut().push("click".into());
    }

    fn release_all(&self) {
        self.log.borrow_mut().push("release_all".into());
    }
}

fn bridge_ctx(settings_path: &str) -> (Rc<Context>, Rc<FakeBackend>) {
    let backend = Rc::new(FakeBackend::default());
    let ctx = Context::new(
        Arc::new(FlagStore::new()),
        Settings::default(),
        settings_path.into(),
        Rc::clone(&backend) as Rc<dyn InputBackend>,
        PressedKeys::new(),
        ListenerGate::new(),
    );
    (ctx, backend)
}

const SETTLE: Duration = Duration::from_millis(100);

#[tokio::test]
#[serial]
async fn bridge_mirrors_store_changes_into_reactive_state() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (ctx, _backend) = bridge_ctx("does-not-exist.json");
            let task = tokio::task::spawn_local(bridge::run(Rc::clone(&ctx)));

            ctx.store.set(Flag::OnGround, true);
            ctx.store.set(Flag::SkillReady, true);
            sleep(SETTLE).await;
            assert!(ctx.gameplay(Flag::OnGround));
            assert!(ctx.gameplay(Flag::SkillReady));
            assert!(!ctx.session_active());

            task.abort();
        })
        .await;
}

#[tokio::test]
#[serial]
async fn session_rise_resumes_listeners_and_reloads_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let on_disk = Settings {
        skill_mode: SkillMode::Boomjump,
        ..Settings::default()
    };
    on_disk.save(path.to_str().unwrap()).unwrap();

    let local = LocalSet::new();
    local
        .run_until(async {
            let (ctx, _backend) = bridge_ctx(path.to_str().unwrap());
            assert_eq!(ctx.skill_mode(), SkillMode::Normal);
            assert!(!ctx.gate.is_running());
            let task = tokio::task::spawn_local(bridge::run(Rc::clone(&ctx)));

            ctx.store.set(Flag::Active, true);
            sleep(SETTLE).await;
            assert!(ctx.session_active());
            assert!(ctx.gate.is_running());
            assert_eq!(ctx.skill_mode(), SkillMode::Boomjump);

            task.abort();
        })
        .await;
}

#[tokio::test]
#[serial]
async fn session_drop_pauses_listeners_releases_keys_and_resets_gameplay() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (ctx, backend) = bridge_ctx("does-not-exist.json");
            let task = tokio::task::spawn_local(bridge::run(Rc::clone(&ctx)));

            ctx.store.set(Flag::Active, true);
            ctx.store.set(Flag::OnGround, true);
            ctx.store.set(Flag::SkillReady, true);
            sleep(SETTLE).await;
            assert!(ctx.gameplay(Flag::OnGround));
            assert!(ctx.gameplay(Flag::SkillReady));

            ctx.store.set(Flag::Active, false);
            sleep(SETTLE).await;
            assert!(!ctx.session_active());
            assert!(!ctx.gate.is_running());
            assert!(backend.log().contains(&"release_all".to_string()));
            assert!(!ctx.gameplay(Flag::OnGround));
            assert!(!ctx.gameplay(Flag::SkillReady));
            assert!(ctx.gameplay(Flag::SkillToggle), "toggle resets to enabled");

            task.abort();
        })
        .await;
}

#[tokio::test]
#[serial]
async fn changes_before_the_bridge_first_polls_are_not_lost() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (ctx, _backend) = bridge_ctx("does-not-exist.json");
            // Workers are live well before the scheduler: these land while
            // no bridge task exists yet.
            ctx.store.set(Flag::Active, true);
            ctx.store.set(Flag::OnGround, true);

            let task = tokio::task::spawn_local(bridge::run(Rc::clone(&ctx)));
            sleep(SETTLE).await;
            assert!(ctx.session_active());
            assert!(ctx.gate.is_running(), "session rise side effects ran");
            assert!(ctx.gameplay(Flag::OnGround));

            task.abort();
        })
        .await;
}

#[tokio::test]
#[serial]
async fn coalesced_changes_arrive_as_one_diff_pass() {
    let local = LocalSet::new();
    local
        .run_until(async {
            let (ctx, _backend) = bridge_ctx("does-not-exist.json");
            let task = tokio::task::spawn_local(bridge::run(Rc::clone(&ctx)));

            // A burst of mutations may reach the bridge as a single wake-up;
            // the diff pass must still land every one of them.
            ctx.store.set(Flag::OnGround, true);
            ctx.store.set(Flag::OnAir, true);
            ctx.store.set(Flag::BarArrow, true);
            ctx.store.set(Flag::SkillToggle, false);
            sleep(SETTLE).await;

            assert!(ctx.gameplay(Flag::OnGround));
            assert!(ctx.gameplay(Flag::OnAir));
            assert!(ctx.gameplay(Flag::BarArrow));
            assert!(!ctx.gameplay(Flag::SkillToggle));

            task.abort();
        })
        .await;
}
