use super::{guard::FinishGuard, RequestTimeoutLayer, ResponseFuture, TimeoutGuardBody, TimeoutHandle};
use crate::{timer::Timer, BoxError};
use http::{Request, Response};
use std::{
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};
use tower_service::Service;

/// Middleware that guards every request with a response deadline.
///
/// See the [module docs](crate::request_timeout) for more details.
#[derive(Debug, Clone)]
pub struct RequestTimeout<S> {
    pub(super) inner: S,
    pub(super) timeout: Duration,
    pub(super) respond: bool,
    pub(super) timer: Arc<dyn Timer>,
}

impl<S> RequestTimeout<S> {
    /// Create a new `RequestTimeout` with the default options.
    pub fn new(inner: S, timeout: Duration) -> Self {
        use tower_layer::Layer;
        RequestTimeoutLayer::new(timeout).layer(inner)
    }

    /// Returns a new [`Layer`] that wraps services with a [`RequestTimeout`] middleware.
    ///
    /// [`Layer`]: tower_layer::Layer
    pub fn layer(timeout: Duration) -> RequestTimeoutLayer {
        RequestTimeoutLayer::new(timeout)
    }

    define_inner_service_accessors!();
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for RequestTimeout<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>>,
    S::Error: Into<BoxError>,
{
    type Response = Response<TimeoutGuardBody<ResBody>>;
    type Error = BoxError;
    type Future = ResponseFuture<S::Future>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx).map_err(Into::into)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let (handle, timeout) = TimeoutHandle::start(self.timeout, self.timer.clone(), self.respond);
        req.extensions_mut().insert(handle.clone());

        ResponseFuture::new(self.inner.call(req), timeout, FinishGuard::new(handle))
    }
}
