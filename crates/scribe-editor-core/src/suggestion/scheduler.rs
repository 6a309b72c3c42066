//! Timers and local task spawning.
//!
//! The controller never touches a clock or an executor directly. The browser
//! crate backs this with `setTimeout` and `spawn_local`; tests drive a manual
//! clock.

use std::time::Duration;

use futures_util::future::LocalBoxFuture;

/// Handle for a scheduled timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Single-threaded timer and task host.
pub trait Scheduler {
    /// Run `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: Box<dyn FnOnce()>) -> TimerId;

    /// Cancel a timeout. Unknown or already fired ids are ignored.
    fn clear_timeout(&self, id: TimerId);

    /// Drive a future to completion on the local executor.
    fn spawn_local(&self, future: LocalBoxFuture<'static, ()>);
}
