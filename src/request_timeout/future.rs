use super::{guard::FinishGuard, ResponseTimeoutError, TimeoutGuardBody};
use crate::BoxError;
use http::Response;
use pin_project_lite::pin_project;
use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Duration,
};
use tokio::sync::oneshot;

pin_project! {
    /// Response future for [`RequestTimeout`].
    ///
    /// [`RequestTimeout`]: crate::RequestTimeout
    #[derive(Debug)]
    pub struct ResponseFuture<F> {
        #[pin]
        inner: F,
        timeout: Option<oneshot::Receiver<Duration>>,
        guard: Option<FinishGuard>,
    }
}

impl<F> ResponseFuture<F> {
    pub(crate) fn new(
        inner: F,
        timeout: Option<oneshot::Receiver<Duration>>,
        guard: FinishGuard,
    ) -> Self {
        Self {
            inner,
            timeout,
            guard: Some(guard),
        }
    }
}

impl<F, B, E> Future for ResponseFuture<F>
where
    F: Future<Output = Result<Response<B>, E>>,
    E: Into<BoxError>,
{
    type Output = Result<Response<TimeoutGuardBody<B>>, BoxError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();

        if let Poll::Ready(result) = this.inner.poll(cx) {
            // Dropping the guard on error counts as the response finishing.
            let guard = this.guard.take();
            let res = match result {
                Ok(res) => res,
                Err(err) => return Poll::Ready(Err(err.into())),
            };

            if let Some(guard) = &guard {
                guard.headers_sent();
            }
            return Poll::Ready(Ok(res.map(|body| TimeoutGuardBody::new(body, guard))));
        }

        if let Some(rx) = this.timeout.as_mut() {
            match Pin::new(rx).poll(cx) {
                Poll::Ready(Ok(delay)) => {
                    *this.timeout = None;
                    drop(this.guard.take());
                    return Poll::Ready(Err(Box::new(ResponseTimeoutError::new(delay))));
                }
                // The deadline can no longer fire.
                Poll::Ready(Err(_)) => *this.timeout = None,
                Poll::Pending => {}
            }
        }

        Poll::Pending
    }
}
