use crate::request_timeout::RequestTimeoutLayer;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_layer::Stack;

/// Extension trait that adds methods to [`tower::ServiceBuilder`] for adding
/// the request timeout middleware.
///
/// # Example
///
/// ```rust
/// use bytes::Bytes;
/// use http::{Request, Response};
/// use http_body_util::Full;
/// use std::{convert::Infallible, time::Duration};
/// use tower::{ServiceBuilder, ServiceExt};
/// use tower_request_timeout::ServiceBuilderExt;
///
/// async fn handle(_request: Request<Full<Bytes>>) -> Result<Response<Full<Bytes>>, Infallible> {
///     Ok(Response::new(Full::default()))
/// }
///
/// # #[tokio::main]
/// # async fn main() {
/// let service = ServiceBuilder::new()
///     .request_timeout(Duration::from_secs(30))
///     .service_fn(handle);
/// # service.oneshot(Request::new(Full::default())).await.unwrap();
/// # }
/// ```
pub trait ServiceBuilderExt<L>: crate::sealed::Sealed<L> + Sized {
    /// Fail requests that don't produce a response within `timeout`.
    ///
    /// See [`RequestTimeoutLayer`] for more details.
    fn request_timeout(self, timeout: Duration) -> ServiceBuilder<Stack<RequestTimeoutLayer, L>>;

    /// Mark requests that don't produce a response within `timeout` as timed
    /// out, without failing them.
    ///
    /// See [`RequestTimeoutLayer::respond`] for more details.
    fn flag_request_timeout(
        self,
        timeout: Duration,
    ) -> ServiceBuilder<Stack<RequestTimeoutLayer, L>>;
}

impl<L> crate::sealed::Sealed<L> for ServiceBuilder<L> {}

impl<L> ServiceBuilderExt<L> for ServiceBuilder<L> {
    fn request_timeout(self, timeout: Duration) -> ServiceBuilder<Stack<RequestTimeoutLayer, L>> {
        self.layer(RequestTimeoutLayer::new(timeout))
    }

    fn flag_request_timeout(
        self,
        timeout: Duration,
    ) -> ServiceBuilder<Stack<RequestTimeoutLayer, L>> {
        self.layer(RequestTimeoutLayer::new(timeout).respond(false))
    }
}
