use crate::timer::{Callback, Timer, TimerHandle};
use std::{
    io,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use tokio::time::Instant;
use tracing_subscriber::{fmt::MakeWriter, util::SubscriberInitExt};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

/// Run `f` with a thread-local subscriber that records every event, and
/// return the formatted output.
pub(crate) fn capture_logs<F>(f: F) -> String
where
    F: FnOnce(),
{
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(logs.clone())
        .finish();

    {
        let _guard = subscriber.set_default();
        f();
    }

    let bytes = logs.0.lock().unwrap().clone();
    String::from_utf8(bytes).unwrap()
}

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// [`Timer`] that only fires when told to.
///
/// Cancellation is recorded but [`ManualTimer::fire_all`] still runs
/// cancelled callbacks, which is how a fire that races a cancel looks to the
/// guard.
#[derive(Clone, Default)]
pub(crate) struct ManualTimer {
    scheduled: Arc<Mutex<Vec<Scheduled>>>,
}

opaque_debug!(ManualTimer);

struct Scheduled {
    delay: Duration,
    callback: Option<Callback>,
    cancelled: Arc<AtomicBool>,
}

impl ManualTimer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Delays of every timer scheduled so far, in order.
    pub(crate) fn delays(&self) -> Vec<Duration> {
        let scheduled = self.scheduled.lock().unwrap();
        scheduled.iter().map(|s| s.delay).collect()
    }

    /// Number of timers that are neither cancelled nor fired.
    pub(crate) fn live(&self) -> usize {
        let scheduled = self.scheduled.lock().unwrap();
        scheduled
            .iter()
            .filter(|s| s.callback.is_some() && !s.cancelled.load(Ordering::SeqCst))
            .count()
    }

    /// Fire every timer that hasn't been cancelled.
    pub(crate) fn fire_live(&self) {
        self.fire(false);
    }

    /// Fire every timer that hasn't fired yet, cancelled or not.
    pub(crate) fn fire_all(&self) {
        self.fire(true);
    }

    fn fire(&self, include_cancelled: bool) {
        let callbacks = {
            let mut scheduled = self.scheduled.lock().unwrap();
            scheduled
                .iter_mut()
                .filter(|s| include_cancelled || !s.cancelled.load(Ordering::SeqCst))
                .filter_map(|s| s.callback.take())
                .collect::<Vec<_>>()
        };

        for callback in callbacks {
            callback();
        }
    }
}

impl Timer for ManualTimer {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn schedule(&self, delay: Duration, callback: Callback) -> TimerHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.scheduled.lock().unwrap().push(Scheduled {
            delay,
            callback: Some(callback),
            cancelled: cancelled.clone(),
        });
        TimerHandle::new(move || cancelled.store(true, Ordering::SeqCst))
    }
}
