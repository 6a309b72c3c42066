//! Test doubles: a manual clock, a scripted suggestion source and a
//! recording overlay renderer.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;

use crate::error::SourceError;
use crate::overlay::{OverlayRenderer, OverlayView};
use crate::suggestion::{Item, Scheduler, SuggestionFuture, SuggestionSource, TimerId};
use crate::types::TriggerKind;

struct Timer {
    id: TimerId,
    due: Duration,
    callback: Box<dyn FnOnce()>,
}

/// Scheduler with a clock that only moves when told to.
pub struct ManualScheduler {
    now: Cell<Duration>,
    next_id: Cell<u64>,
    timers: RefCell<Vec<Timer>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl ManualScheduler {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            now: Cell::new(Duration::ZERO),
            next_id: Cell::new(0),
            timers: RefCell::new(Vec::new()),
            pool: RefCell::new(pool),
            spawner,
        }
    }

    pub fn now(&self) -> Duration {
        self.now.get()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.borrow().len()
    }

    /// Move the clock forward, firing due timers in order and running spawned
    /// tasks after each one.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by;
        loop {
            let next = {
                let mut timers = self.timers.borrow_mut();
                let due = timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                due.map(|i| timers.remove(i))
            };
            let Some(timer) = next else {
                break;
            };
            self.now.set(timer.due);
            (timer.callback)();
            self.run_until_stalled();
        }
        self.now.set(target);
        self.run_until_stalled();
    }

    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }
}

impl Scheduler for ManualScheduler {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.timers.borrow_mut().push(Timer {
            id,
            due: self.now.get() + delay,
            callback,
        });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        self.timers.borrow_mut().retain(|t| t.id != id);
    }

    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        self.spawner
            .spawn_local(future)
            .expect("local pool is alive");
    }
}

type Reply = oneshot::Sender<Result<Vec<Item>, SourceError>>;

/// Source whose fetches stay pending until the test answers them.
#[derive(Default)]
pub struct ScriptedSource {
    queries: RefCell<Vec<String>>,
    pending: RefCell<Vec<(String, Reply)>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every query fetched so far, in order.
    pub fn queries(&self) -> Vec<String> {
        self.queries.borrow().clone()
    }

    pub fn pending(&self) -> usize {
        self.pending.borrow().len()
    }

    fn answer(&self, query: &str, result: Result<Vec<Item>, SourceError>) {
        let reply = {
            let mut pending = self.pending.borrow_mut();
            let index = pending
                .iter()
                .position(|(q, _)| q == query)
                .unwrap_or_else(|| panic!("no pending fetch for {query:?}"));
            pending.remove(index).1
        };
        // The receiver may be gone if the future was dropped.
        let _ = reply.send(result);
    }

    pub fn resolve(&self, query: &str, items: Vec<Item>) {
        self.answer(query, Ok(items));
    }

    pub fn fail(&self, query: &str, message: &str) {
        self.answer(query, Err(SourceError::Fetch(message.into())));
    }
}

impl SuggestionSource for ScriptedSource {
    fn fetch(&self, query: &str) -> SuggestionFuture {
        self.queries.borrow_mut().push(query.to_string());
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push((query.to_string(), tx));
        async move { rx.await.unwrap_or(Err(SourceError::Cancelled)) }.boxed_local()
    }
}

/// Renderer that keeps every frame it is handed.
#[derive(Default)]
pub struct RecordingRenderer {
    frames: RefCell<Vec<(TriggerKind, Option<OverlayView>)>>,
}

impl RecordingRenderer {
    pub fn render_count(&self) -> usize {
        self.frames.borrow().len()
    }

    pub fn last(&self) -> Option<(TriggerKind, Option<OverlayView>)> {
        self.frames.borrow().last().cloned()
    }

    /// Latest frame for one kind.
    pub fn last_for(&self, kind: TriggerKind) -> Option<Option<OverlayView>> {
        self.frames
            .borrow()
            .iter()
            .rev()
            .find(|(k, _)| *k == kind)
            .map(|(_, view)| view.clone())
    }
}

impl OverlayRenderer for RecordingRenderer {
    fn render(&self, kind: TriggerKind, view: Option<&OverlayView>) {
        self.frames.borrow_mut().push((kind, view.cloned()));
    }
}
