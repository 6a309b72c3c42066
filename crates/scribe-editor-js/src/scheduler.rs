//! Browser-backed `Scheduler`: `setTimeout` via gloo-timers and
//! `spawn_local` via wasm-bindgen-futures.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use futures_util::future::LocalBoxFuture;
use gloo_timers::future::TimeoutFuture;

use scribe_editor_core::{Scheduler, TimerId};

#[derive(Default)]
pub struct BrowserScheduler {
    next_id: Cell<u64>,
    /// Cancellation flags for timers that have not fired yet.
    pending: Rc<RefCell<HashMap<TimerId, Rc<Cell<bool>>>>>,
}

impl BrowserScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scheduler for BrowserScheduler {
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId {
        let id = TimerId(self.next_id.get());
        self.next_id.set(id.0 + 1);

        let cancelled = Rc::new(Cell::new(false));
        self.pending.borrow_mut().insert(id, cancelled.clone());

        let pending = self.pending.clone();
        let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
        wasm_bindgen_futures::spawn_local(async move {
            TimeoutFuture::new(millis).await;
            pending.borrow_mut().remove(&id);
            if !cancelled.get() {
                callback();
            }
        });
        id
    }

    fn clear_timeout(&self, id: TimerId) {
        if let Some(flag) = self.pending.borrow_mut().remove(&id) {
            flag.set(true);
        }
    }

    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(future);
    }
}
