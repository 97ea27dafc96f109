use crate::{
    duration::{resolve_or_default, IntoDelay},
    timer::{Timer, TimerHandle},
};
use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
    time::Duration,
};
use tokio::{sync::oneshot, time::Instant};

/// Per-request handle to the response deadline.
///
/// [`RequestTimeout`] inserts one into the extensions of every request it
/// sees. Handlers use it to check whether the request already timed out and
/// to clear, reset or extend the deadline.
///
/// ```
/// use http::Request;
/// use std::time::Duration;
/// use tower_request_timeout::TimeoutHandle;
///
/// fn extend_for_uploads<B>(request: &Request<B>) {
///     if let Some(timeout) = request.extensions().get::<TimeoutHandle>() {
///         if !timeout.timed_out() {
///             timeout.add_timeout(Duration::from_secs(30));
///         }
///     }
/// }
/// ```
///
/// Cloning the handle is cheap and every clone refers to the same deadline.
///
/// [`RequestTimeout`]: crate::RequestTimeout
#[derive(Clone)]
pub struct TimeoutHandle {
    shared: Arc<Shared>,
}

struct Shared {
    timer: Arc<dyn Timer>,
    state: Mutex<State>,
}

struct State {
    // Zero means the deadline is disabled.
    remaining_delay: Duration,
    started_at: Instant,
    timed_out: bool,
    live: Option<TimerHandle>,
    // Bumped every time the live timer is replaced or cancelled. A callback
    // from an older generation must not fire.
    generation: u64,
    on_timeout: Option<oneshot::Sender<Duration>>,
}

impl State {
    fn time_left(&self, now: Instant) -> Duration {
        let elapsed = now.saturating_duration_since(self.started_at);
        self.remaining_delay.saturating_sub(elapsed)
    }

    fn disarm(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(mut timer) = self.live.take() {
            timer.cancel();
        }
    }
}

impl TimeoutHandle {
    /// Start a deadline of `delay`.
    ///
    /// With `respond` set, the returned receiver completes with the delay in
    /// force the first time the deadline is hit.
    pub(crate) fn start(
        delay: Duration,
        timer: Arc<dyn Timer>,
        respond: bool,
    ) -> (Self, Option<oneshot::Receiver<Duration>>) {
        let (tx, rx) = if respond {
            let (tx, rx) = oneshot::channel();
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let handle = Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    remaining_delay: delay,
                    started_at: timer.now(),
                    timed_out: false,
                    live: None,
                    generation: 0,
                    on_timeout: tx,
                }),
                timer,
            }),
        };

        handle.arm(&mut handle.state(), delay);
        (handle, rx)
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> Instant {
        self.shared.timer.now()
    }

    // Replace the live timer with one firing after `delay`.
    fn arm(&self, state: &mut State, delay: Duration) {
        state.disarm();

        let generation = state.generation;
        let shared = Arc::downgrade(&self.shared);
        let timer = self.shared.timer.schedule(
            delay,
            Box::new(move || fire(&shared, generation)),
        );
        state.live = Some(timer);

        tracing::trace!(?delay, "armed request timeout");
    }

    /// Returns `true` once the deadline has been hit.
    ///
    /// The flag is never reset, not even by [`reset_timeout`] or
    /// [`add_timeout`].
    ///
    /// [`reset_timeout`]: TimeoutHandle::reset_timeout
    /// [`add_timeout`]: TimeoutHandle::add_timeout
    pub fn timed_out(&self) -> bool {
        self.state().timed_out
    }

    /// Disable the deadline.
    ///
    /// [`get_timeout`](TimeoutHandle::get_timeout) reports zero afterwards.
    pub fn clear_timeout(&self) {
        let mut state = self.state();
        state.remaining_delay = Duration::ZERO;
        state.disarm();

        tracing::trace!("cleared request timeout");
    }

    /// Start a new deadline of `delay` from now, discarding whatever was left
    /// of the current one.
    ///
    /// `delay` is resolved like the layer's delay, except that strings which
    /// don't parse fall back to [`DEFAULT_TIMEOUT`] instead of failing.
    ///
    /// [`DEFAULT_TIMEOUT`]: crate::duration::DEFAULT_TIMEOUT
    pub fn reset_timeout<D>(&self, delay: D)
    where
        D: IntoDelay,
    {
        let delay = resolve_or_default(delay);
        let now = self.now();

        let mut state = self.state();
        state.started_at = now;
        state.remaining_delay = delay;
        self.arm(&mut state, delay);
    }

    /// The time left until the deadline, or zero if it passed or is disabled.
    pub fn get_timeout(&self) -> Duration {
        let now = self.now();
        self.state().time_left(now)
    }

    /// Extend the deadline by `delay`.
    ///
    /// The new timer fires after whatever time was left plus `delay`. If no
    /// time was left, the budget window is re-anchored so that
    /// [`get_timeout`] reports exactly `delay` right after this call.
    ///
    /// `delay` is resolved like in [`reset_timeout`].
    ///
    /// [`get_timeout`]: TimeoutHandle::get_timeout
    /// [`reset_timeout`]: TimeoutHandle::reset_timeout
    pub fn add_timeout<D>(&self, delay: D)
    where
        D: IntoDelay,
    {
        let more = resolve_or_default(delay);
        let now = self.now();

        let mut state = self.state();
        let time_left = state.time_left(now);
        let actual_delay = time_left.saturating_add(more);
        state.remaining_delay = state.remaining_delay.saturating_add(more);

        if time_left.is_zero() {
            let anchor = now
                .checked_add(actual_delay)
                .and_then(|at| at.checked_sub(state.remaining_delay));
            if let Some(anchor) = anchor {
                state.started_at = anchor;
            }
        }

        self.arm(&mut state, actual_delay);
    }

    /// Cancel the live timer without touching the budget. Used when the
    /// response starts or finishes.
    pub(crate) fn cancel_timer(&self) {
        let mut state = self.state();
        if state.live.is_some() {
            tracing::trace!("cancelled request timer");
        }
        state.disarm();
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self) -> bool {
        self.state().live.is_some()
    }
}

fn fire(shared: &Weak<Shared>, generation: u64) {
    let shared = match shared.upgrade() {
        Some(shared) => shared,
        None => return,
    };
    let mut state = shared.state.lock().unwrap_or_else(PoisonError::into_inner);

    if state.generation != generation {
        tracing::trace!("ignoring cancelled request timeout");
        return;
    }

    state.live = None;
    state.timed_out = true;

    let delay = state.remaining_delay;
    tracing::debug!(timeout = ?delay, "request timed out");

    if let Some(tx) = state.on_timeout.take() {
        // The response future might be gone already.
        let _ = tx.send(delay);
    }
}

impl fmt::Debug for TimeoutHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let now = self.now();
        let state = self.state();
        f.debug_struct("TimeoutHandle")
            .field("remaining", &state.time_left(now))
            .field("timed_out", &state.timed_out)
            .field("armed", &state.live.is_some())
            .finish()
    }
}
