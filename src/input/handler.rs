use crate::context::Context;
use crate::listener::{Edge, InputEvent};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use tokio::sync::mpsc::UnboundedReceiver;

type Action = Rc<dyn Fn() -> Pin<Box<dyn Future<Output = ()>>>>;

/// Bound down/up actions for one physical input source. At most one action
/// per source runs at a time; dispatch takes the source's named lock before
/// invoking anything.
pub struct Handler {
    source: String,
    down: Option<Action>,
    up: Option<Action>,
}

impl Handler {
    pub fn new(source: &str) -> Self {
        Self {
            source: source.into(),
            down: None,
            up: None,
        }
    }

    pub fn on_down<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.down = Some(Rc::new(move || Box::pin(action())));
        self
    }

    pub fn on_up<F, Fut>(mut self, action: F) -> Self
    where
        F: Fn() -> Fut + 'static,
        Fut: Future<Output = ()> + 'static,
    {
        self.up = Some(Rc::new(move || Box::pin(action())));
        self
    }
}

/// Registry of handlers keyed by source name. Registered once at startup,
/// never removed.
#[derive(Default)]
pub struct HandlerSet {
    handlers: HashMap<String, Handler>,
}

impl HandlerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Handler) {
        if self
            .handlers
            .insert(handler.source.clone(), handler)
            .is_some()
        {
            tracing::warn!("handler registered twice; keeping the newest");
        }
    }

    fn action_for(&self, event: &InputEvent) -> Option<(String, Action)> {
        let handler = self.handlers.get(&event.source)?;
        let action = match event.edge {
            Edge::Down => handler.down.as_ref()?,
            Edge::Up => handler.up.as_ref()?,
        };
        Some((handler.source.clone(), Rc::clone(action)))
    }
}

/// Dispatch one raw edge event. Events are ignored outright while the
/// session is inactive; otherwise the bound action runs as its own local
/// task under the source's lock, so dispatch itself never blocks.
pub fn dispatch(ctx: &Rc<Context>, handlers: &HandlerSet, event: InputEvent) {
    if !ctx.session_active() {
        return;
    }
    let Some((source, action)) = handlers.action_for(&event) else {
        return;
    };
    tracing::debug!("dispatch {source} {:?}", event.edge);
    let ctx = Rc::clone(ctx);
    tokio::task::spawn_local(async move {
        ctx.locks.with_lock(&source, action()).await;
    });
}

/// Scheduler-side pump: receives raw events from the hook thread and
/// dispatches them until the channel closes at shutdown.
pub async fn run_dispatch(
    ctx: Rc<Context>,
    handlers: HandlerSet,
    mut events: UnboundedReceiver<InputEvent>,
) {
    while let Some(event) = events.recv().await {
        dispatch(&ctx, &handlers, event);
    }
}
