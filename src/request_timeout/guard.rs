use super::TimeoutHandle;

/// Cancels the request's timer when dropped.
///
/// Owned by the response future and then by the response body, so the timer
/// is cancelled once the body is done or the client goes away, whichever
/// comes first.
#[derive(Debug)]
pub(crate) struct FinishGuard {
    handle: TimeoutHandle,
}

impl FinishGuard {
    pub(crate) fn new(handle: TimeoutHandle) -> Self {
        Self { handle }
    }

    /// The response head is ready. Cancels the timer but keeps the guard
    /// armed for the body.
    pub(crate) fn headers_sent(&self) {
        self.handle.cancel_timer();
    }
}

impl Drop for FinishGuard {
    fn drop(&mut self) {
        self.handle.cancel_timer();
    }
}
