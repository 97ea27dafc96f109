//! The scheduling capability used to arm request deadlines.
//!
//! [`RequestTimeout`] never talks to a global timer directly. It asks a
//! [`Timer`] to run a callback once after a delay and keeps the returned
//! [`TimerHandle`] so the callback can be cancelled again. [`TokioTimer`] is
//! the default and works with tokio's paused clock in tests.
//!
//! [`RequestTimeout`]: crate::RequestTimeout

use std::{fmt, time::Duration};
use tokio::time::Instant;

/// Callback run when a scheduled timer fires.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Schedules one-shot callbacks.
///
/// Implementations must not run `callback` from within [`Timer::schedule`]
/// itself, even for a zero delay.
pub trait Timer: fmt::Debug + Send + Sync + 'static {
    /// The current instant, as seen by this timer.
    fn now(&self) -> Instant;

    /// Run `callback` once after `delay` unless the returned handle is
    /// cancelled first.
    fn schedule(&self, delay: Duration, callback: Callback) -> TimerHandle;
}

/// Handle to a callback scheduled with a [`Timer`].
///
/// Dropping the handle does not cancel the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

opaque_debug!(TimerHandle);

impl TimerHandle {
    /// Create a handle that runs `cancel` the first time it is cancelled.
    pub fn new<F>(cancel: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel the timer.
    ///
    /// Cancelling more than once, or after the timer fired, does nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// [`Timer`] backed by [`tokio::time`].
///
/// Each scheduled callback runs on its own spawned task, so this must be
/// used from within a tokio runtime with the time driver enabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer(());

impl TokioTimer {
    /// Create a new `TokioTimer`.
    pub fn new() -> Self {
        Self(())
    }
}

impl Timer for TokioTimer {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn schedule(&self, delay: Duration, callback: Callback) -> TimerHandle {
        // The deadline is fixed here, not when the task is first polled.
        let sleep = tokio::time::sleep(delay);
        let task = tokio::spawn(async move {
            sleep.await;
            callback();
        });
        TimerHandle::new(move || task.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    fn counter() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let callback: Callback = {
            let count = count.clone();
            Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        (count, callback)
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let (count, callback) = counter();
        let _handle = TokioTimer::new().schedule(Duration::from_millis(100), callback);

        tokio::time::sleep(Duration::from_millis(99)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_fire() {
        let (count, callback) = counter();
        let mut handle = TokioTimer::new().schedule(Duration::from_millis(100), callback);

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_fire_is_a_noop() {
        let (count, callback) = counter();
        let mut handle = TokioTimer::new().schedule(Duration::from_millis(10), callback);

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_handle_does_not_cancel() {
        let (count, callback) = counter();
        drop(TokioTimer::new().schedule(Duration::from_millis(10), callback));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn handle_cancels_once() {
        let (count, callback) = counter();
        let mut handle = TimerHandle::new(callback);
        handle.cancel();
        handle.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
