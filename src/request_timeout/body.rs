use super::guard::FinishGuard;
use futures_core::ready;
use http_body::{Body, Frame, SizeHint};
use pin_project_lite::pin_project;
use std::{
    pin::Pin,
    task::{Context, Poll},
};

pin_project! {
    /// Response body for [`RequestTimeout`].
    ///
    /// Cancels the request's timer once the body has been fully sent, has
    /// failed or is dropped.
    ///
    /// [`RequestTimeout`]: crate::RequestTimeout
    #[derive(Debug)]
    pub struct TimeoutGuardBody<B> {
        #[pin]
        inner: B,
        guard: Option<FinishGuard>,
    }
}

impl<B> TimeoutGuardBody<B> {
    pub(crate) fn new(inner: B, guard: Option<FinishGuard>) -> Self {
        Self { inner, guard }
    }

    /// Gets a reference to the underlying body.
    pub fn get_ref(&self) -> &B {
        &self.inner
    }

    /// Consumes `self`, returning the underlying body.
    ///
    /// The request's timer is cancelled.
    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B> Body for TimeoutGuardBody<B>
where
    B: Body,
{
    type Data = B::Data;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.project();
        let frame = ready!(this.inner.poll_frame(cx));

        if !matches!(frame, Some(Ok(_))) {
            // finished
            drop(this.guard.take());
        }

        Poll::Ready(frame)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
